//! Progress reporting for apply phases.
//!
//! The engine core reports progress through an injected
//! [`ProgressReporter`] capability; it never touches the terminal itself.
//! The console implementation wraps an indicatif progress bar.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::apply::ApplyAction;

/// Sink for phase progress events. Purely observational: implementations
/// have no effect on engine behavior.
pub trait ProgressReporter: Send + Sync {
    /// A phase with `total` item-level calls is starting.
    fn phase_started(&self, label: &str, action: ApplyAction, total: usize);

    /// The phase has settled `percent` percent of its calls.
    ///
    /// Percentages are monotonically increasing within one phase.
    fn phase_progress(&self, label: &str, action: ApplyAction, percent: u8);

    /// The phase has fully settled.
    fn phase_finished(&self, label: &str, action: ApplyAction);
}

/// Console progress bars over indicatif.
pub struct ConsoleProgress {
    /// Bar of the active phase, if any.
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    /// Creates a console progress reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}%")
            .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█▓▒░"))
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn phase_started(&self, label: &str, action: ApplyAction, total: usize) {
        let bar = ProgressBar::new(100);
        bar.set_style(Self::style());
        bar.set_message(format!("{label}: {action} ({total})"));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut active) = self.bar.lock() {
            *active = Some(bar);
        }
    }

    fn phase_progress(&self, _label: &str, _action: ApplyAction, percent: u8) {
        if let Ok(active) = self.bar.lock() {
            if let Some(bar) = active.as_ref() {
                bar.set_position(u64::from(percent));
            }
        }
    }

    fn phase_finished(&self, _label: &str, _action: ApplyAction) {
        if let Ok(mut active) = self.bar.lock() {
            if let Some(bar) = active.take() {
                bar.finish_and_clear();
            }
        }
    }
}

/// Reporter that discards every event. Used in dry runs, JSON output mode
/// and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn phase_started(&self, _label: &str, _action: ApplyAction, _total: usize) {}

    fn phase_progress(&self, _label: &str, _action: ApplyAction, _percent: u8) {}

    fn phase_finished(&self, _label: &str, _action: ApplyAction) {}
}
