//! Synchronizer for the records of one bucket.
//!
//! One synchronizer exists per source bucket. Records are keyed by `id`,
//! but previews and failure records label them by the bucket's configured
//! primary key field, which is what users recognise.

use async_trait::async_trait;

use crate::api::{encode_segment, Resource, ResourceSet};
use crate::error::Result;

use super::{ResourceKind, SyncContext};

/// Record synchronizer kind, scoped to one bucket.
pub struct RecordKind {
    /// Shared clients and policy flags.
    ctx: SyncContext,
    /// Title of the parent bucket on both deployments.
    bucket_title: String,
    /// Record field configured as the bucket's primary key.
    primary_key: String,
}

impl RecordKind {
    /// Creates a record kind for the given parent bucket.
    #[must_use]
    pub const fn new(ctx: SyncContext, bucket_title: String, primary_key: String) -> Self {
        Self {
            ctx,
            bucket_title,
            primary_key,
        }
    }

    fn collection_path(&self) -> String {
        format!(
            "/api/buckets/{}/records",
            encode_segment(&self.bucket_title)
        )
    }
}

#[async_trait]
impl ResourceKind for RecordKind {
    fn module(&self) -> &'static str {
        "buckets"
    }

    fn sub_module(&self) -> Option<&'static str> {
        Some("records")
    }

    fn parent_label(&self) -> Option<&str> {
        Some(&self.bucket_title)
    }

    fn display_field(&self) -> &str {
        &self.primary_key
    }

    async fn fetch_source(&self) -> Result<ResourceSet> {
        self.ctx.source.get_set(&self.collection_path()).await
    }

    async fn fetch_target(&self) -> Result<ResourceSet> {
        // The bucket may not exist on the target before its first sync.
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
        let id = encode_segment(&resource.label("id"));
        self.ctx
            .target
            .put(&format!("{}/{id}", self.collection_path()), resource)
            .await?;
        Ok(())
    }

    async fn remove(&self, resource: &Resource) -> Result<()> {
        let id = encode_segment(&resource.label("id"));
        self.ctx
            .target
            .delete(&format!("{}/{id}", self.collection_path()))
            .await
    }
}
