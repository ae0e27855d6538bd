// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::cell::RefCell;
use std::fmt;

type StartCb<'p> = Box<dyn FnMut(&str, Option<u64>) + 'p>;
type UpdateCb<'p> = Box<dyn FnMut(&str, u64) + 'p>;
type FinishCb<'p> = Box<dyn FnMut(&str) + 'p>;

struct Callbacks<'p> {
    start: Option<StartCb<'p>>,
    update: Option<UpdateCb<'p>>,
    finish: Option<FinishCb<'p>>,
}

/// Registry for host-provided progress reporting. The host registers three
/// callbacks keyed by a task id of our choosing; the drivers report through
/// [`Task`] handles without knowing what, if anything, is on the other side.
pub struct Progress<'p> {
    callbacks: RefCell<Callbacks<'p>>,
}

impl<'p> fmt::Debug for Progress<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress").finish()
    }
}

impl<'p> Progress<'p> {
    pub(crate) fn new() -> Progress<'p> {
        Progress {
            callbacks: RefCell::new(Callbacks {
                start: None,
                update: None,
                finish: None,
            }),
        }
    }

    pub(crate) fn with_start(&mut self, cb: impl FnMut(&str, Option<u64>) + 'p) {
        self.callbacks.get_mut().start = Some(Box::new(cb));
    }

    pub(crate) fn with_update(&mut self, cb: impl FnMut(&str, u64) + 'p) {
        self.callbacks.get_mut().update = Some(Box::new(cb));
    }

    pub(crate) fn with_finish(&mut self, cb: impl FnMut(&str) + 'p) {
        self.callbacks.get_mut().finish = Some(Box::new(cb));
    }

    /// Open a task. `len` is the expected total when one is known, which
    /// lets the host draw a bar instead of a spinner.
    pub(crate) fn task(&self, id: impl Into<String>, len: Option<u64>) -> Task<'_, 'p> {
        let id = id.into();
        if let Some(cb) = self.callbacks.borrow_mut().start.as_mut() {
            (cb)(&id, len);
        }
        Task { progress: self, id }
    }
}

/// A single in-flight unit of work. Reports completion when dropped, so a
/// task cannot leak an open bar on an error path.
pub(crate) struct Task<'a, 'p> {
    progress: &'a Progress<'p>,
    id: String,
}

impl<'a, 'p> Task<'a, 'p> {
    pub(crate) fn update(&self, delta: u64) {
        if let Some(cb) = self.progress.callbacks.borrow_mut().update.as_mut() {
            (cb)(&self.id, delta);
        }
    }
}

impl<'a, 'p> Drop for Task<'a, 'p> {
    fn drop(&mut self) {
        if let Some(cb) = self.progress.callbacks.borrow_mut().finish.as_mut() {
            (cb)(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn tasks_report_through_the_registered_callbacks() {
        let events = RefCell::new(Vec::new());
        let mut progress = Progress::new();
        progress.with_start(|id, len| events.borrow_mut().push(format!("start {id} {len:?}")));
        progress.with_update(|id, delta| events.borrow_mut().push(format!("update {id} {delta}")));
        progress.with_finish(|id| events.borrow_mut().push(format!("finish {id}")));

        {
            let task = progress.task("fetch", Some(10));
            task.update(4);
            task.update(6);
        }

        assert_eq!(
            *events.borrow(),
            vec![
                "start fetch Some(10)",
                "update fetch 4",
                "update fetch 6",
                "finish fetch",
            ]
        );
    }

    #[test]
    fn unregistered_callbacks_are_no_ops() {
        let progress = Progress::new();
        let task = progress.task("quiet", None);
        task.update(1);
    }
}
