//! Synchronizer for a function's compiled index.
//!
//! The index is a derived artifact, keyed by `functionId` and enumerated
//! from source functions only. It has no deletions path: removing the
//! parent function removes its index with it, so the diff's deletions list
//! is always suppressed.

use async_trait::async_trait;

use crate::api::{encode_segment, Resource, ResourceSet};
use crate::error::{Result, ResyncError};

use super::{ResourceKind, SyncContext};

/// Compiled-index synchronizer kind, scoped to one function.
pub struct IndexKind {
    /// Shared clients and policy flags.
    ctx: SyncContext,
    /// Identity of the parent function on both deployments.
    function_id: String,
    /// Display label of the parent function.
    function_label: String,
}

impl IndexKind {
    /// Creates an index kind for the given parent function.
    #[must_use]
    pub const fn new(ctx: SyncContext, function_id: String, function_label: String) -> Self {
        Self {
            ctx,
            function_id,
            function_label,
        }
    }

    fn collection_path(&self) -> String {
        format!("/api/functions/{}/index", encode_segment(&self.function_id))
    }
}

#[async_trait]
impl ResourceKind for IndexKind {
    fn module(&self) -> &'static str {
        "functions"
    }

    fn sub_module(&self) -> Option<&'static str> {
        Some("index")
    }

    fn parent_label(&self) -> Option<&str> {
        Some(&self.function_label)
    }

    fn identity_field(&self) -> &str {
        "functionId"
    }

    fn emits_deletions(&self) -> bool {
        false
    }

    async fn fetch_source(&self) -> Result<ResourceSet> {
        self.ctx.source.get_set(&self.collection_path()).await
    }

    async fn fetch_target(&self) -> Result<ResourceSet> {
        // An index only exists once the function has been compiled on the
        // target at least once.
        self.ctx
            .target
            .get_set_or_empty(&self.collection_path())
            .await
    }

    async fn create(&self, resource: &Resource) -> Result<()> {
        self.ctx
            .target
            .post(&self.collection_path(), resource)
            .await?;
        Ok(())
    }

    async fn update(&self, resource: &Resource) -> Result<()> {
        self.ctx
            .target
            .put(&self.collection_path(), resource)
            .await?;
        Ok(())
    }

    async fn remove(&self, _resource: &Resource) -> Result<()> {
        // Deletions are suppressed for this kind; reaching this is a bug.
        Err(ResyncError::internal(format!(
            "index of function '{}' cannot be deleted independently",
            self.function_label
        )))
    }
}
