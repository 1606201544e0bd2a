//! Synchronizer for data buckets.
//!
//! Buckets are the top-level resources of the `buckets` module, keyed by
//! their human-readable `title`. Each source bucket spawns one record
//! synchronizer; the bucket's configured `primaryKey` field becomes the
//! display field of its records.

use async_trait::async_trait;

use crate::api::{encode_segment, Resource, ResourceSet};
use crate::error::Result;

use super::{RecordKind, ResourceKind, SyncContext, SyncNode};

/// Collection path on both deployments.
const BUCKETS_PATH: &str = "/api/buckets";

/// Record field used for display when a bucket does not configure one.
const DEFAULT_PRIMARY_KEY: &str = "id";

/// Top-level bucket synchronizer kind.
pub struct BucketKind {
    /// Shared clients and policy flags.
    ctx: SyncContext,
}

impl BucketKind {
    /// Creates the bucket kind.
    #[must_use]
    pub const fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ResourceKind for BucketKind {
    fn module(&self) -> &'static str {
        "buckets"
    }

    fn identity_field(&self) -> &str {
        "title"
    }

    async fn discover(&self) -> Result<Vec<SyncNode>> {
        let buckets = self.ctx.source.get_set(BUCKETS_PATH).await?;

        let mut children = Vec::with_capacity(buckets.len());
        for bucket in &buckets {
            let Some(title) = bucket.key("title") else {
                continue;
            };
            let primary_key = bucket
                .get("primaryKey")
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_PRIMARY_KEY)
                .to_string();

            children.push(SyncNode::new(Box::new(RecordKind::new(
                self.ctx.clone(),
                title,
                primary_key,
            ))));
        }

        Ok(children)
    }

    async fn fetch_source(&self) -> Result<ResourceSet> {
        self.ctx.source.get_set(BUCKETS_PATH).await
    }

    async fn fetch_target(&self) -> Result<ResourceSet> {
        self.ctx.target.get_set(BUCKETS_PATH).await
    }

    async fn create(&self, resource: &Resource) -> Result<()> {
        self.ctx.target.post(BUCKETS_PATH, resource).await?;
        Ok(())
    }

    async fn update(&self, resource: &Resource) -> Result<()> {
        let title = encode_segment(&resource.label("title"));
        self.ctx
            .target
            .put(&format!("{BUCKETS_PATH}/{title}"), resource)
            .await?;
        Ok(())
    }

    async fn remove(&self, resource: &Resource) -> Result<()> {
        let title = encode_segment(&resource.label("title"));
        self.ctx
            .target
            .delete(&format!("{BUCKETS_PATH}/{title}"))
            .await
    }
}
