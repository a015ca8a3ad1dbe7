use fahbench::workflows::Updater;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Drives a terminal progress bar from the benchmark callbacks: a spinner
/// while preparing, then a bar over the run length with the live score.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(ProgressDrawTarget::stderr());

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    /// Builds an updater that reports into this bar and cancels once `cancel`
    /// is set.
    pub fn updater(&self, cancel: Arc<AtomicBool>) -> Updater<'static> {
        let pb_progress = self.pb.clone();
        let pb_message = self.pb.clone();

        Updater::new()
            .on_progress(move |elapsed_ms, total_ms, score| {
                let Ok(pb) = pb_progress.lock() else {
                    warn!("Progress bar mutex was poisoned. Cannot update progress.");
                    return;
                };
                if pb.length() != Some(total_ms) {
                    pb.set_style(Self::bar_style());
                    pb.set_length(total_ms);
                }
                pb.set_position(elapsed_ms.min(total_ms));
                pb.set_message(format!("{:.3} ns/day", score));
            })
            .on_message(move |text| {
                let Ok(pb) = pb_message.lock() else {
                    warn!("Progress bar mutex was poisoned. Cannot show message.");
                    return;
                };
                pb.set_message(text.to_string());
                pb.tick();
            })
            .cancel_flag(cancel)
    }

    pub fn finish(&self, text: &str) {
        match self.pb.lock() {
            Ok(pb) => pb.finish_with_message(text.to_string()),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot finish progress."),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {elapsed_s}/{total_s} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "elapsed_s",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.0}s", state.pos() as f64 / 1000.0);
                },
            )
            .with_key(
                "total_s",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let total = state.len().unwrap_or(0);
                    let _ = write!(w, "{:.0}s", total as f64 / 1000.0);
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn handler_initializes_as_a_spinner() {
        let handler = CliProgressHandler::new();
        let pb = handler.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert_eq!(pb.message(), "Initializing...");
        assert!(!pb.is_finished());
    }

    #[test]
    fn progress_switches_to_a_bar_over_the_run_length() {
        let handler = CliProgressHandler::new();
        let updater = handler.updater(Arc::new(AtomicBool::new(false)));

        updater.message("Starting Benchmark");
        assert_eq!(handler.pb.lock().unwrap().message(), "Starting Benchmark");

        updater.progress(1500, 60_000, 42.123_456);
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.length(), Some(60_000));
            assert_eq!(pb.position(), 1500);
            assert_eq!(pb.message(), "42.123 ns/day");
        }

        updater.progress(70_000, 60_000, 40.0);
        assert_eq!(handler.pb.lock().unwrap().position(), 60_000);

        handler.finish("Done");
        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "Done");
    }

    #[test]
    fn updater_follows_the_cancel_flag() {
        let handler = CliProgressHandler::new();
        let flag = Arc::new(AtomicBool::new(false));
        let updater = handler.updater(flag.clone());

        assert!(!updater.cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(updater.cancelled());
    }
}
