//! Orchestrator and synchronizer tree builder.
//!
//! A run is a two-phase build followed by a per-synchronizer loop: the
//! module selection is validated against the static registry, root
//! synchronizers are instantiated and expanded into their children (all
//! discovered from the *source* deployment), and the resulting flat list is
//! walked in order, analyzing and then either previewing (dry-run) or
//! synchronizing each node. Item-level failures are aggregated; they never
//! abort the remaining synchronizers.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::apply::{ApplyAction, ApplyExecutor, ApplyFailure};
use crate::diff::DiffResult;
use crate::error::{ConfigError, Result, SyncError};
use crate::progress::{NullProgress, ProgressReporter};
use crate::sync::{BucketKind, FunctionKind, SyncContext, SyncNode};

/// Registered module names, in declaration order.
pub const MODULES: &[&str] = &["functions", "buckets"];

/// Progress sink used when none is injected.
static NULL_PROGRESS: NullProgress = NullProgress;

/// Instantiates the root synchronizers of one module.
///
/// The registry is enumerated explicitly; an unknown name yields `None`.
fn root_nodes(module: &str, ctx: &SyncContext) -> Option<Vec<SyncNode>> {
    match module {
        "functions" => Some(vec![SyncNode::new(Box::new(FunctionKind::new(
            ctx.clone(),
        )))]),
        "buckets" => Some(vec![SyncNode::new(Box::new(BucketKind::new(ctx.clone())))]),
        _ => None,
    }
}

/// Orchestrator for one sync run.
pub struct Orchestrator<'a> {
    /// Shared clients and policy flags.
    ctx: SyncContext,
    /// Requested module names, in selection order.
    modules: Vec<String>,
    /// Whether to preview diffs instead of applying them.
    dry_run: bool,
    /// Progress sink for apply phases.
    progress: &'a dyn ProgressReporter,
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Every item applied cleanly.
    Completed,
    /// The run finished, but some items failed and were reported.
    CompletedWithFailures,
}

/// Diff preview of one synchronizer, produced in dry-run mode.
#[derive(Debug, Serialize)]
pub struct SyncPreview {
    /// Display name of the synchronizer.
    pub synchronizer: String,
    /// Field used to label the previewed resources.
    pub display_field: String,
    /// The computed diff.
    pub diff: DiffResult,
}

/// An isolated failure attributed to its synchronizer.
#[derive(Debug, Serialize)]
pub struct SyncFailure {
    /// Display name of the synchronizer the failure occurred in.
    pub synchronizer: String,
    /// The underlying failure record.
    #[serde(flatten)]
    pub failure: ApplyFailure,
}

/// Aggregate result of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Terminal state.
    pub outcome: RunOutcome,
    /// Number of synchronizers that ran.
    pub synchronizers: usize,
    /// Number of successfully applied items across all synchronizers.
    pub applied: usize,
    /// Dry-run previews, in tree order. Empty unless dry-run.
    pub previews: Vec<SyncPreview>,
    /// All isolated failure records, in settlement order.
    pub failures: Vec<SyncFailure>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator for the given module selection.
    #[must_use]
    pub fn new(ctx: SyncContext, modules: Vec<String>) -> Self {
        Self {
            ctx,
            modules,
            dry_run: false,
            progress: &NULL_PROGRESS,
        }
    }

    /// Enables dry-run mode: diffs are computed and previewed, nothing is
    /// applied.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Injects a progress sink for apply phases.
    #[must_use]
    pub const fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Executes the run.
    ///
    /// # Errors
    ///
    /// Returns an error on an empty or unknown module selection (before any
    /// remote call) or on transport failure during discovery (before any
    /// mutation). Once the per-synchronizer loop has started, failures —
    /// whether of a whole analysis or of single apply items — are folded
    /// into the returned [`RunReport`] and never abort the run.
    pub async fn run(&self) -> Result<RunReport> {
        if self.modules.is_empty() {
            return Err(ConfigError::EmptyModuleSelection.into());
        }

        // Select before build: a typo in the module list must abort before
        // any remote call is made.
        for module in &self.modules {
            if !MODULES.contains(&module.as_str()) {
                return Err(SyncError::UnknownModule {
                    name: module.clone(),
                }
                .into());
            }
        }

        // Build: materialize the full node list before any analysis begins.
        let mut nodes: Vec<SyncNode> = Vec::new();
        for module in &self.modules {
            for mut root in root_nodes(module, &self.ctx).unwrap_or_default() {
                let children =
                    root.initialize()
                        .await
                        .map_err(|e| SyncError::DiscoveryFailed {
                            module: module.clone(),
                            reason: e.to_string(),
                        })?;
                debug!(
                    "{}: discovered {} child synchronizer(s)",
                    root.display_name(),
                    children.len()
                );
                nodes.push(root);
                nodes.extend(children);
            }
        }

        info!(
            "Built {} synchronizer(s) for modules: {}",
            nodes.len(),
            self.modules.join(", ")
        );

        let executor = ApplyExecutor::new(self.progress);
        let mut report = RunReport {
            outcome: RunOutcome::Completed,
            synchronizers: nodes.len(),
            applied: 0,
            previews: Vec::new(),
            failures: Vec::new(),
        };

        for node in &mut nodes {
            // Earlier synchronizers may already have mutated the target, so
            // a failed analysis must not discard the partial report. It
            // becomes an attributable failure record and the remaining
            // synchronizers proceed.
            let diff = match node.analyze().await {
                Ok(diff) => diff,
                Err(e) => {
                    warn!("{}: analysis failed: {e}", node.display_name());
                    report.failures.push(SyncFailure {
                        synchronizer: node.display_name(),
                        failure: ApplyFailure {
                            action: ApplyAction::Analyze,
                            resource: String::from("<set>"),
                            message: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            if self.dry_run {
                report.previews.push(SyncPreview {
                    synchronizer: node.display_name(),
                    display_field: node.display_field().to_string(),
                    diff,
                });
                continue;
            }

            let apply = node.synchronize(&executor).await?;
            report.applied += apply.applied;

            if !apply.is_clean() {
                let name = node.display_name();
                report.failures.extend(
                    apply
                        .failures
                        .into_iter()
                        .map(|failure| SyncFailure {
                            synchronizer: name.clone(),
                            failure,
                        }),
                );
            }
        }

        if !report.failures.is_empty() {
            report.outcome = RunOutcome::CompletedWithFailures;
        }

        Ok(report)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::CompletedWithFailures => "completed with failures",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::error::ResyncError;
    use std::sync::Arc;

    fn context() -> SyncContext {
        let source = Arc::new(ApiClient::new("http://127.0.0.1:1", "src-token").unwrap());
        let target = Arc::new(ApiClient::new("http://127.0.0.1:1", "tgt-token").unwrap());
        SyncContext::new(source, target, false)
    }

    #[tokio::test]
    async fn test_unknown_module_is_fatal_before_any_remote_call() {
        let orchestrator = Orchestrator::new(context(), vec!["widgets".to_string()]);

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(
            err,
            ResyncError::Sync(SyncError::UnknownModule { ref name }) if name == "widgets"
        ));
    }

    #[tokio::test]
    async fn test_one_unknown_module_aborts_the_whole_selection() {
        let orchestrator = Orchestrator::new(
            context(),
            vec!["functions".to_string(), "widgets".to_string()],
        );

        // No partial run: the valid module must not be built either, which
        // the dead endpoint guarantees (discovery would error differently).
        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(
            err,
            ResyncError::Sync(SyncError::UnknownModule { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_selection_is_a_configuration_error() {
        let orchestrator = Orchestrator::new(context(), Vec::new());

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(
            err,
            ResyncError::Config(ConfigError::EmptyModuleSelection)
        ));
    }
}
