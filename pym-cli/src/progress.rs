// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// The bars the library currently has in flight, keyed by the task ids it
/// hands our callbacks. Log output prints through `suspended` so a line
/// never tears an active bar.
#[derive(Clone)]
pub(crate) struct ActiveBars {
    bars: Arc<Mutex<HashMap<String, ProgressBar>>>,
}

impl ActiveBars {
    pub(crate) fn new() -> ActiveBars {
        ActiveBars {
            bars: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn start(&self, id: &str, len: Option<u64>) {
        let bar = match len {
            Some(len) => ProgressBar::new(len).with_style(
                ProgressStyle::with_template("{msg} {wide_bar} {bytes}/{total_bytes}")
                    .expect("template is well-formed"),
            ),
            None => {
                let spinner = ProgressBar::new_spinner();
                spinner.enable_steady_tick(Duration::from_millis(120));
                spinner
            }
        };
        bar.set_message(id.to_string());
        self.bars.lock().unwrap().insert(id.to_string(), bar);
    }

    pub(crate) fn update(&self, id: &str, delta: u64) {
        if let Some(bar) = self.bars.lock().unwrap().get(id) {
            bar.inc(delta);
        }
    }

    pub(crate) fn finish(&self, id: &str) {
        if let Some(bar) = self.bars.lock().unwrap().remove(id) {
            bar.finish_and_clear();
        }
    }

    pub(crate) fn suspended(&self, callback: impl FnOnce()) {
        let bars = self.bars.lock().unwrap();
        match bars.values().next() {
            Some(bar) => bar.suspend(callback),
            None => callback(),
        }
    }
}
