//! Apply executor for diffed resources.
//!
//! This module turns one phase of a diff (insertions, updations or
//! deletions) into concrete remote calls with per-item failure isolation
//! and progress reporting. All calls of a phase are launched concurrently
//! and fully settle before the next phase starts.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::api::Resource;
use crate::progress::ProgressReporter;

/// The operation a phase, progress event or failure record is attributed
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyAction {
    /// Fetch and diff both deployments. Never issued per item; attributes
    /// synchronizer-level analysis failures.
    Analyze,
    /// Create the resource on the target.
    Create,
    /// Replace the resource on the target.
    Update,
    /// Remove the resource from the target.
    Delete,
}

/// A non-fatal, attributable failure for a single resource.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyFailure {
    /// Operation that failed.
    pub action: ApplyAction,
    /// Label of the resource the operation targeted, or `<set>` when the
    /// whole resource set was affected.
    pub resource: String,
    /// Underlying error message.
    pub message: String,
}

/// Aggregate outcome of one synchronizer's apply run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// Number of successfully applied items.
    pub applied: usize,
    /// Isolated per-item failures, in settlement order.
    pub failures: Vec<ApplyFailure>,
}

/// Executor for diff phases.
#[derive(Clone, Copy)]
pub struct ApplyExecutor<'a> {
    /// Progress sink. Observational only.
    progress: &'a dyn ProgressReporter,
}

impl<'a> ApplyExecutor<'a> {
    /// Creates an executor reporting to the given progress sink.
    #[must_use]
    pub const fn new(progress: &'a dyn ProgressReporter) -> Self {
        Self { progress }
    }

    /// Runs one phase: launches every item-level call concurrently, settles
    /// them all, and folds individual errors into failure records.
    ///
    /// Within a phase there is no cross-item ordering guarantee. Progress
    /// is reported as a monotonically increasing percentage of settled
    /// items.
    pub async fn run_phase<'i, F, Fut>(
        &self,
        label: &str,
        action: ApplyAction,
        display_field: &str,
        items: &'i [Resource],
        op: F,
    ) -> Vec<ApplyFailure>
    where
        F: Fn(&'i Resource) -> Fut,
        Fut: Future<Output = crate::error::Result<()>> + 'i,
    {
        if items.is_empty() {
            return Vec::new();
        }

        let total = items.len();
        self.progress.phase_started(label, action, total);

        let completed = AtomicUsize::new(0);
        let completed = &completed;

        let tasks = items.iter().map(|item| {
            let call = op(item);
            async move {
                let outcome = call.await;
                let settled = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let percent = u8::try_from(100 * settled / total).unwrap_or(100);
                self.progress.phase_progress(label, action, percent);

                outcome.err().map(|e| {
                    let failure = ApplyFailure {
                        action,
                        resource: item.label(display_field),
                        message: e.to_string(),
                    };
                    warn!(
                        "Failed to {} '{}' in {label}: {}",
                        failure.action, failure.resource, failure.message
                    );
                    failure
                })
            }
        });

        let failures: Vec<ApplyFailure> = join_all(tasks).await.into_iter().flatten().collect();
        self.progress.phase_finished(label, action);
        failures
    }
}

impl ApplyReport {
    /// Returns true if every item applied cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Analyze => "analyze",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.action, self.resource, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ResyncError, TransportError};
    use crate::progress::NullProgress;
    use serde_json::json;
    use std::sync::Mutex;

    /// Reporter collecting every percentage it sees.
    #[derive(Default)]
    struct RecordingProgress {
        percents: Mutex<Vec<u8>>,
        phases: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase_started(&self, label: &str, action: ApplyAction, _total: usize) {
            self.phases.lock().unwrap().push(format!("{label}:{action}"));
        }

        fn phase_progress(&self, _label: &str, _action: ApplyAction, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }

        fn phase_finished(&self, _label: &str, _action: ApplyAction) {}
    }

    fn resources(ids: &[i64]) -> Vec<Resource> {
        ids.iter()
            .map(|id| Resource::try_from(json!({ "id": id })).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_failure_does_not_cancel_siblings() {
        let items = resources(&[1, 2, 3]);
        let created = Mutex::new(Vec::new());
        let progress = NullProgress;
        let executor = ApplyExecutor::new(&progress);

        let failures = executor
            .run_phase("functions", ApplyAction::Create, "id", &items, |r| {
                let created = &created;
                async move {
                    if r.key("id").as_deref() == Some("2") {
                        return Err(ResyncError::Transport(TransportError::network(
                            "connection reset",
                        )));
                    }
                    created.lock().unwrap().push(r.label("id"));
                    Ok(())
                }
            })
            .await;

        let created = created.into_inner().unwrap();
        assert!(created.contains(&"1".to_string()));
        assert!(created.contains(&"3".to_string()));
        assert_eq!(created.len(), 2);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].resource, "2");
        assert_eq!(failures[0].action, ApplyAction::Create);
        assert!(failures[0].message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_reaches_one_hundred() {
        let items = resources(&[1, 2, 3, 4]);
        let progress = RecordingProgress::default();
        let executor = ApplyExecutor::new(&progress);

        let failures = executor
            .run_phase("buckets", ApplyAction::Update, "id", &items, |_| async {
                Ok(())
            })
            .await;
        assert!(failures.is_empty());

        let percents = progress.percents.into_inner().unwrap();
        assert_eq!(percents.len(), 4);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_empty_phase_reports_nothing() {
        let progress = RecordingProgress::default();
        let executor = ApplyExecutor::new(&progress);

        let failures = executor
            .run_phase("functions", ApplyAction::Delete, "id", &[], |_| async {
                Ok(())
            })
            .await;

        assert!(failures.is_empty());
        assert!(progress.phases.into_inner().unwrap().is_empty());
    }
}
