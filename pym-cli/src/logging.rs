// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use log::{LevelFilter, Metadata, Record};
use pretty_env_logger::env_logger::Logger;

use crate::progress::ActiveBars;

// Routes every record through ActiveBars::suspended so log lines and
// progress bars share the terminal without garbling each other.
struct BarAwareLogger {
    internal: Logger,
    bars: ActiveBars,
}

impl log::Log for BarAwareLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.internal.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.bars.suspended(|| self.internal.log(record))
    }

    fn flush(&self) {}
}

pub(crate) fn setup(level: LevelFilter, bars: ActiveBars) {
    let internal = pretty_env_logger::formatted_builder()
        .filter_level(level)
        .build();
    let max_level = internal.filter();

    log::set_boxed_logger(Box::new(BarAwareLogger { internal, bars })).unwrap();
    log::set_max_level(max_level);
}
