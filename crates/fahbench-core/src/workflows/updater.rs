use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub type ProgressFn<'a> = Box<dyn Fn(u64, u64, f64) + 'a>;
pub type MessageFn<'a> = Box<dyn Fn(&str) + 'a>;
pub type CancelledFn<'a> = Box<dyn Fn() -> bool + 'a>;

/// The callbacks a benchmark reports through.
///
/// Every callback is optional; a missing one is a no-op and a missing
/// cancellation poll never cancels. Callbacks run on the thread driving the
/// benchmark, so a slow `progress` directly lowers the measured throughput.
///
/// The cancellation poll must not block. Implementations backed by a lock
/// should use a try-lock and report `false` when it cannot be acquired.
#[derive(Default)]
pub struct Updater<'a> {
    progress: Option<ProgressFn<'a>>,
    message: Option<MessageFn<'a>>,
    cancelled: Option<CancelledFn<'a>>,
}

impl<'a> Updater<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receives `(elapsed_ms, total_ms, ns_per_day)`.
    pub fn on_progress(mut self, callback: impl Fn(u64, u64, f64) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn on_message(mut self, callback: impl Fn(&str) + 'a) -> Self {
        self.message = Some(Box::new(callback));
        self
    }

    pub fn on_cancelled(mut self, callback: impl Fn() -> bool + 'a) -> Self {
        self.cancelled = Some(Box::new(callback));
        self
    }

    /// Polls `flag` for cancellation.
    pub fn cancel_flag(self, flag: Arc<AtomicBool>) -> Self {
        self.on_cancelled(move || flag.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn progress(&self, elapsed_ms: u64, total_ms: u64, score: f64) {
        if let Some(cb) = &self.progress {
            cb(elapsed_ms, total_ms, score);
        }
    }

    #[inline]
    pub fn message(&self, text: &str) {
        if let Some(cb) = &self.message {
            cb(text);
        }
    }

    #[inline]
    pub fn cancelled(&self) -> bool {
        self.cancelled.as_ref().is_some_and(|cb| cb())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn empty_updater_is_silent_and_never_cancels() {
        let updater = Updater::new();
        updater.progress(1, 2, 3.0);
        updater.message("ignored");
        assert!(!updater.cancelled());
    }

    #[test]
    fn callbacks_receive_their_arguments() {
        let progress = RefCell::new(Vec::new());
        let messages = RefCell::new(Vec::new());
        let updater = Updater::new()
            .on_progress(|elapsed, total, score| progress.borrow_mut().push((elapsed, total, score)))
            .on_message(|text| messages.borrow_mut().push(text.to_string()));

        updater.progress(500, 1000, 42.5);
        updater.message("Starting Benchmark");
        drop(updater);

        assert_eq!(progress.into_inner(), vec![(500, 1000, 42.5)]);
        assert_eq!(messages.into_inner(), vec!["Starting Benchmark".to_string()]);
    }

    #[test]
    fn cancel_flag_reflects_the_shared_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let updater = Updater::new().cancel_flag(flag.clone());
        assert!(!updater.cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(updater.cancelled());
    }
}
