//! Synchronizer for serverless functions.
//!
//! Functions are the top-level resources of the `functions` module, keyed
//! by `id`. Their `environment` map carries secrets and is volatile, so it
//! only participates in the diff when the caller asks for it explicitly:
//! otherwise matched source copies get the target's current environment
//! back-filled (updates preserve it) and unmatched copies get it zeroed
//! (creates never copy source secrets).

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::api::{encode_segment, Resource, ResourceSet};
use crate::error::Result;

use super::{DependencyKind, IndexKind, ResourceKind, SyncContext, SyncNode};

/// Collection path on both deployments.
const FUNCTIONS_PATH: &str = "/api/functions";

/// The volatile environment field.
const ENVIRONMENT_FIELD: &str = "environment";

/// Top-level function synchronizer kind.
pub struct FunctionKind {
    /// Shared clients and policy flags.
    ctx: SyncContext,
}

impl FunctionKind {
    /// Creates the function kind.
    #[must_use]
    pub const fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    /// Applies the environment policy to the source set.
    fn apply_environment_policy(source: &mut ResourceSet, target: &[Resource]) {
        let target_env: HashMap<String, Option<Value>> = target
            .iter()
            .filter_map(|r| r.key("id").map(|key| (key, r.get(ENVIRONMENT_FIELD).cloned())))
            .collect();

        for resource in source.iter_mut() {
            let matched = resource
                .key("id")
                .and_then(|key| target_env.get(&key).cloned());

            match matched {
                // Matched pair: the target's current environment wins, so an
                // environment difference alone never produces an updation
                // and updates never clobber the target's values.
                Some(Some(env)) => resource.set(ENVIRONMENT_FIELD, env),
                Some(None) => {
                    resource.remove(ENVIRONMENT_FIELD);
                }
                // Unmatched: zero the environment so creates carry no
                // source secrets.
                None => {
                    if resource.get(ENVIRONMENT_FIELD).is_some() {
                        resource.set(ENVIRONMENT_FIELD, Value::Object(Map::new()));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ResourceKind for FunctionKind {
    fn module(&self) -> &'static str {
        "functions"
    }

    async fn discover(&self) -> Result<Vec<SyncNode>> {
        let functions = self.ctx.source.get_set(FUNCTIONS_PATH).await?;

        let mut children = Vec::with_capacity(functions.len() * 2);
        for function in &functions {
            let Some(id) = function.key("id") else {
                continue;
            };
            let label = function.label("name");

            children.push(SyncNode::new(Box::new(DependencyKind::new(
                self.ctx.clone(),
                id.clone(),
                label.clone(),
            ))));
            children.push(SyncNode::new(Box::new(IndexKind::new(
                self.ctx.clone(),
                id,
                label,
            ))));
        }

        Ok(children)
    }

    async fn fetch_source(&self) -> Result<ResourceSet> {
        self.ctx.source.get_set(FUNCTIONS_PATH).await
    }

    async fn fetch_target(&self) -> Result<ResourceSet> {
        self.ctx.target.get_set(FUNCTIONS_PATH).await
    }

    fn prepare(&self, mut source: ResourceSet, target: &[Resource]) -> ResourceSet {
        if !self.ctx.include_environment {
            Self::apply_environment_policy(&mut source, target);
        }
        source
    }

    async fn create(&self, resource: &Resource) -> Result<()> {
        self.ctx.target.post(FUNCTIONS_PATH, resource).await?;
        Ok(())
    }

    async fn update(&self, resource: &Resource) -> Result<()> {
        let id = encode_segment(&resource.label("id"));
        self.ctx
            .target
            .put(&format!("{FUNCTIONS_PATH}/{id}"), resource)
            .await?;
        Ok(())
    }

    async fn remove(&self, resource: &Resource) -> Result<()> {
        let id = encode_segment(&resource.label("id"));
        self.ctx.target.delete(&format!("{FUNCTIONS_PATH}/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: Value) -> Resource {
        Resource::try_from(value).unwrap()
    }

    #[test]
    fn test_matched_source_gets_target_environment_back_filled() {
        let mut source = vec![resource(json!({
            "id": 1, "name": "fn-a", "environment": { "KEY": "source-secret" }
        }))];
        let target = vec![resource(json!({
            "id": 1, "name": "fn-a", "environment": { "KEY": "target-secret" }
        }))];

        FunctionKind::apply_environment_policy(&mut source, &target);

        assert_eq!(
            source[0].get("environment"),
            Some(&json!({ "KEY": "target-secret" }))
        );
    }

    #[test]
    fn test_unmatched_source_environment_is_zeroed() {
        let mut source = vec![resource(json!({
            "id": 2, "name": "fn-b", "environment": { "KEY": "secret" }
        }))];

        FunctionKind::apply_environment_policy(&mut source, &[]);

        assert_eq!(source[0].get("environment"), Some(&json!({})));
    }

    #[test]
    fn test_environment_removed_when_target_has_none() {
        let mut source = vec![resource(json!({
            "id": 3, "environment": { "KEY": "secret" }
        }))];
        let target = vec![resource(json!({ "id": 3 }))];

        FunctionKind::apply_environment_policy(&mut source, &target);

        assert_eq!(source[0].get("environment"), None);
    }

    #[test]
    fn test_absent_environment_stays_absent() {
        let mut source = vec![resource(json!({ "id": 4, "name": "fn-d" }))];

        FunctionKind::apply_environment_policy(&mut source, &[]);

        assert_eq!(source[0].get("environment"), None);
    }
}
