//! Synchronizer for a function's dependency list.
//!
//! One synchronizer exists per source function. Dependencies are keyed by
//! `name`; the `resolved` field is derived by the deployment at install
//! time and is not authoritative, so it never triggers an updation.

use async_trait::async_trait;

use crate::api::{encode_segment, Resource, ResourceSet};
use crate::error::Result;

use super::{ResourceKind, SyncContext};

/// Dependency-list synchronizer kind, scoped to one function.
pub struct DependencyKind {
    /// Shared clients and policy flags.
    ctx: SyncContext,
    /// Identity of the parent function on both deployments.
    function_id: String,
    /// Display label of the parent function.
    function_label: String,
}

impl DependencyKind {
    /// Creates a dependency kind for the given parent function.
    #[must_use]
    pub const fn new(ctx: SyncContext, function_id: String, function_label: String) -> Self {
        Self {
            ctx,
            function_id,
            function_label,
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/api/functions/{}/dependencies",
            encode_segment(&self.function_id)
        )
    }
}

#[async_trait]
impl ResourceKind for DependencyKind {
    fn module(&self) -> &'static str {
        "functions"
    }

    fn sub_module(&self) -> Option<&'static str> {
        Some("dependencies")
    }

    fn parent_label(&self) -> Option<&str> {
        Some(&self.function_label)
    }

    fn identity_field(&self) -> &str {
        "name"
    }

    fn ignored_fields(&self) -> &[&str] {
        &["resolved"]
    }

    async fn fetch_source(&self) -> Result<ResourceSet> {
        self.ctx.source.get_set(&self.collection_path()).await
    }

    async fn fetch_target(&self) -> Result<ResourceSet> {
        // The function may not exist on the target before its first sync.
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
        let name = encode_segment(&resource.label("name"));
        self.ctx
            .target
            .put(&format!("{}/{name}", self.collection_path()), resource)
            .await?;
        Ok(())
    }

    async fn remove(&self, resource: &Resource) -> Result<()> {
        let name = encode_segment(&resource.label("name"));
        self.ctx
            .target
            .delete(&format!("{}/{name}", self.collection_path()))
            .await
    }
}
