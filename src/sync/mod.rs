//! Resource synchronizers.
//!
//! A synchronizer binds one resource kind to the capability set
//! `initialize` / `analyze` / `synchronize` / `display_name`. The kinds
//! themselves only describe how to fetch, discover and apply their
//! resources; the generic [`SyncNode`] driver owns the lifecycle and the
//! analyze-before-synchronize invariant.

mod buckets;
mod dependencies;
mod functions;
mod indexes;
mod records;

pub use buckets::BucketKind;
pub use dependencies::DependencyKind;
pub use functions::FunctionKind;
pub use indexes::IndexKind;
pub use records::RecordKind;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::{ApiClient, Resource, ResourceSet};
use crate::apply::{ApplyAction, ApplyExecutor, ApplyReport};
use crate::diff::{DiffEngine, DiffResult};
use crate::error::{Result, SyncError};

/// Shared context handed to every synchronizer.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Client for the source deployment. Discovery and source reads only.
    pub source: Arc<ApiClient>,
    /// Client for the target deployment. All mutations go here.
    pub target: Arc<ApiClient>,
    /// Whether function environments are part of the diff.
    pub include_environment: bool,
}

impl SyncContext {
    /// Creates a new sync context.
    #[must_use]
    pub const fn new(
        source: Arc<ApiClient>,
        target: Arc<ApiClient>,
        include_environment: bool,
    ) -> Self {
        Self {
            source,
            target,
            include_environment,
        }
    }
}

/// One resource kind's identity policy, fetch paths and apply operations.
///
/// Implementations are stateless; all per-run state lives in [`SyncNode`].
#[async_trait]
pub trait ResourceKind: Send + Sync {
    /// Logical module this kind belongs to (e.g. `functions`).
    fn module(&self) -> &'static str;

    /// Sub-module name for parent-scoped kinds.
    fn sub_module(&self) -> Option<&'static str> {
        None
    }

    /// Display label of the parent resource, for parent-scoped kinds.
    fn parent_label(&self) -> Option<&str> {
        None
    }

    /// Field carrying each resource's unique identity.
    fn identity_field(&self) -> &str {
        "id"
    }

    /// Field used to label resources in previews and failure records.
    fn display_field(&self) -> &str {
        self.identity_field()
    }

    /// Fields excluded from update detection.
    fn ignored_fields(&self) -> &[&str] {
        &[]
    }

    /// Whether this kind issues deletions of its own.
    ///
    /// Derived artifacts are deleted implicitly with their parent and never
    /// independently.
    fn emits_deletions(&self) -> bool {
        true
    }

    /// Discovers dependent child synchronizers from the *source* deployment.
    ///
    /// Leaf kinds return an empty list. A transport error here is fatal to
    /// the whole run; nothing has been diffed or mutated yet.
    async fn discover(&self) -> Result<Vec<SyncNode>> {
        Ok(Vec::new())
    }

    /// Fetches the current resource set from the source deployment.
    async fn fetch_source(&self) -> Result<ResourceSet>;

    /// Fetches the current resource set from the target deployment.
    ///
    /// Kinds whose container may not exist on an unsynchronized target map
    /// "not found" to an empty set here.
    async fn fetch_target(&self) -> Result<ResourceSet>;

    /// Kind-specific adjustment of the source set before diffing.
    ///
    /// The default is a pass-through; the function kind uses this to apply
    /// its environment policy against the freshly fetched target set.
    fn prepare(&self, source: ResourceSet, target: &[Resource]) -> ResourceSet {
        let _ = target;
        source
    }

    /// Creates a resource on the target deployment.
    async fn create(&self, resource: &Resource) -> Result<()>;

    /// Replaces a resource on the target deployment.
    async fn update(&self, resource: &Resource) -> Result<()>;

    /// Removes a resource from the target deployment.
    async fn remove(&self, resource: &Resource) -> Result<()>;
}

/// A synchronizer for one resource kind instance.
///
/// Created by the tree builder (root nodes) or by a parent kind's
/// `discover` (child nodes). `analyze` captures a [`DiffResult`] which is
/// consumed by exactly one `synchronize`; re-synchronizing requires a fresh
/// analysis.
pub struct SyncNode {
    /// The bound resource kind.
    kind: Box<dyn ResourceKind>,
    /// Diff captured by the most recent `analyze`.
    state: Option<DiffResult>,
}

impl SyncNode {
    /// Creates a synchronizer over the given kind.
    #[must_use]
    pub fn new(kind: Box<dyn ResourceKind>) -> Self {
        Self { kind, state: None }
    }

    /// Logical module this synchronizer belongs to.
    #[must_use]
    pub fn module(&self) -> &'static str {
        self.kind.module()
    }

    /// Field used to label resources in previews and failure records.
    #[must_use]
    pub fn display_field(&self) -> &str {
        self.kind.display_field()
    }

    /// Human-readable label combining module, sub-module and parent.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut name = self.kind.module().to_string();
        if let Some(sub) = self.kind.sub_module() {
            name.push('/');
            name.push_str(sub);
        }
        if let Some(parent) = self.kind.parent_label() {
            name.push_str(&format!(" [{parent}]"));
        }
        name
    }

    /// Discovers dependent child synchronizers from the source deployment.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; this is fatal to the run.
    pub async fn initialize(&mut self) -> Result<Vec<Self>> {
        self.kind.discover().await
    }

    /// Fetches both deployments, applies the kind's identity and ignore
    /// policy, and captures the resulting diff.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure against either deployment.
    pub async fn analyze(&mut self) -> Result<DiffResult> {
        let name = self.display_name();
        debug!("Analyzing {name}");

        let source = self.kind.fetch_source().await?;
        let target = self.kind.fetch_target().await?;
        let source = self.kind.prepare(source, &target);

        let engine = DiffEngine::new(self.kind.identity_field())
            .with_ignored_fields(self.kind.ignored_fields());
        let mut diff = engine.compute(&source, &target);

        if !self.kind.emits_deletions() {
            diff.deletions.clear();
        }

        info!("{name}: {diff}");
        self.state = Some(diff.clone());
        Ok(diff)
    }

    /// Applies the diff captured by the most recent `analyze` against the
    /// target deployment, in insert - update - delete order.
    ///
    /// Idempotent by construction: an already-converged target yields an
    /// empty diff and no remote calls.
    ///
    /// # Errors
    ///
    /// Returns an error if `analyze` has not been called since the last
    /// synchronization. Item-level transport failures do not error; they
    /// are collected in the returned report.
    pub async fn synchronize(&mut self, executor: &ApplyExecutor<'_>) -> Result<ApplyReport> {
        let diff = self.state.take().ok_or_else(|| SyncError::NotAnalyzed {
            synchronizer: self.display_name(),
        })?;

        let label = self.display_name();
        let field = self.kind.display_field();
        let kind = self.kind.as_ref();

        let mut report = ApplyReport::default();

        let created = executor
            .run_phase(&label, ApplyAction::Create, field, &diff.insertions, |r| {
                kind.create(r)
            })
            .await;
        report.applied += diff.insertions.len() - created.len();
        report.failures.extend(created);

        let updated = executor
            .run_phase(&label, ApplyAction::Update, field, &diff.updations, |r| {
                kind.update(r)
            })
            .await;
        report.applied += diff.updations.len() - updated.len();
        report.failures.extend(updated);

        let deleted = executor
            .run_phase(&label, ApplyAction::Delete, field, &diff.deletions, |r| {
                kind.remove(r)
            })
            .await;
        report.applied += diff.deletions.len() - deleted.len();
        report.failures.extend(deleted);

        Ok(report)
    }
}

impl std::fmt::Debug for SyncNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncNode")
            .field("display_name", &self.display_name())
            .field("analyzed", &self.state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResyncError;
    use crate::progress::NullProgress;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory kind recording applied operations into a shared log.
    struct StubKind {
        source: ResourceSet,
        target: ResourceSet,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl StubKind {
        fn new(source: Vec<serde_json::Value>, target: Vec<serde_json::Value>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let convert = |values: Vec<serde_json::Value>| {
                values
                    .into_iter()
                    .map(|v| Resource::try_from(v).unwrap())
                    .collect()
            };
            let log = Arc::new(Mutex::new(Vec::new()));
            let kind = Self {
                source: convert(source),
                target: convert(target),
                log: Arc::clone(&log),
            };
            (kind, log)
        }
    }

    #[async_trait]
    impl ResourceKind for StubKind {
        fn module(&self) -> &'static str {
            "stub"
        }

        async fn fetch_source(&self) -> Result<ResourceSet> {
            Ok(self.source.clone())
        }

        async fn fetch_target(&self) -> Result<ResourceSet> {
            Ok(self.target.clone())
        }

        async fn create(&self, resource: &Resource) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("create {}", resource.label("id")));
            Ok(())
        }

        async fn update(&self, resource: &Resource) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("update {}", resource.label("id")));
            Ok(())
        }

        async fn remove(&self, resource: &Resource) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("delete {}", resource.label("id")));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_synchronize_without_analyze_is_an_error() {
        let (kind, _log) = StubKind::new(vec![], vec![]);
        let mut node = SyncNode::new(Box::new(kind));
        let progress = NullProgress;
        let executor = ApplyExecutor::new(&progress);

        let err = node.synchronize(&executor).await.unwrap_err();
        assert!(matches!(
            err,
            ResyncError::Sync(SyncError::NotAnalyzed { .. })
        ));
    }

    #[tokio::test]
    async fn test_synchronize_consumes_the_analyzed_state() {
        let (kind, _log) = StubKind::new(vec![json!({ "id": 1 })], vec![]);
        let mut node = SyncNode::new(Box::new(kind));
        let progress = NullProgress;
        let executor = ApplyExecutor::new(&progress);

        node.analyze().await.unwrap();
        let report = node.synchronize(&executor).await.unwrap();
        assert_eq!(report.applied, 1);

        // A second synchronize without a fresh analyze must fail.
        assert!(node.synchronize(&executor).await.is_err());
    }

    #[tokio::test]
    async fn test_phases_apply_in_insert_update_delete_order() {
        let (kind, log) = StubKind::new(
            vec![json!({ "id": 1 }), json!({ "id": 2, "name": "changed" })],
            vec![json!({ "id": 2, "name": "old" }), json!({ "id": 3 })],
        );
        let mut node = SyncNode::new(Box::new(kind));
        let progress = NullProgress;
        let executor = ApplyExecutor::new(&progress);

        node.analyze().await.unwrap();
        let report = node.synchronize(&executor).await.unwrap();

        assert_eq!(report.applied, 3);
        assert!(report.failures.is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            ["create 1", "update 2", "delete 3"]
        );
    }

    #[tokio::test]
    async fn test_converged_target_is_a_no_op() {
        let resources = vec![json!({ "id": 1, "name": "a" })];
        let (kind, log) = StubKind::new(resources.clone(), resources);
        let mut node = SyncNode::new(Box::new(kind));
        let progress = NullProgress;
        let executor = ApplyExecutor::new(&progress);

        let diff = node.analyze().await.unwrap();
        assert!(diff.is_empty());

        let report = node.synchronize(&executor).await.unwrap();
        assert_eq!(report.applied, 0);
        assert!(report.failures.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }
}
