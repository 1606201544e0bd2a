//! Diff engine for comparing source and target resource sets.
//!
//! This module computes the minimal set of insertions, updations and
//! deletions required to make a target resource set converge to a source
//! set. It is a pure function of its inputs: no I/O, fully deterministic.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use serde::Serialize;

use crate::api::{Resource, ResourceSet};

/// Engine for computing diffs between a source and a target resource set.
///
/// Identities are assumed unique within each set; behavior with duplicate
/// identity values is undefined. Resources missing the identity field are
/// skipped entirely, since they can neither be matched nor addressed.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    /// Field carrying the unique identity of each resource.
    identity_field: String,
    /// Fields excluded from equality comparison.
    ignored_fields: Vec<String>,
}

/// Complete diff between a source and a target resource set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffResult {
    /// Resources present in source, absent in target (by identity).
    pub insertions: ResourceSet,
    /// Source copies of resources present in both whose non-identity,
    /// non-ignored fields differ.
    pub updations: ResourceSet,
    /// Resources present in target, absent in source (by identity).
    pub deletions: ResourceSet,
}

impl DiffEngine {
    /// Creates a diff engine keyed on the given identity field.
    #[must_use]
    pub fn new(identity_field: &str) -> Self {
        Self {
            identity_field: identity_field.to_string(),
            ignored_fields: Vec::new(),
        }
    }

    /// Excludes the given fields from equality comparison.
    #[must_use]
    pub fn with_ignored_fields(mut self, fields: &[&str]) -> Self {
        self.ignored_fields = fields.iter().map(ToString::to_string).collect();
        self
    }

    /// Computes the diff between a source and a target resource set.
    ///
    /// Set order is irrelevant for matching; output order follows source
    /// order for insertions and updations, target order for deletions.
    #[must_use]
    pub fn compute(&self, source: &[Resource], target: &[Resource]) -> DiffResult {
        let identity = self.identity_field.as_str();

        let target_by_id: HashMap<String, &Resource> = target
            .iter()
            .filter_map(|r| r.key(identity).map(|key| (key, r)))
            .collect();

        let source_ids: HashSet<String> = source
            .iter()
            .filter_map(|r| r.key(identity))
            .collect();

        // Identity and ignored fields are stripped from both copies before
        // equality comparison; the originals are never mutated.
        let mut stripped: Vec<&str> = vec![identity];
        stripped.extend(self.ignored_fields.iter().map(String::as_str));

        let mut result = DiffResult::default();

        for resource in source {
            let Some(key) = resource.key(identity) else {
                debug!("Skipping source resource without identity field '{identity}'");
                continue;
            };

            match target_by_id.get(&key) {
                None => result.insertions.push(resource.clone()),
                Some(existing) => {
                    if resource.without(&stripped) != existing.without(&stripped) {
                        result.updations.push(resource.clone());
                    }
                }
            }
        }

        for resource in target {
            let Some(key) = resource.key(identity) else {
                debug!("Skipping target resource without identity field '{identity}'");
                continue;
            };

            if !source_ids.contains(&key) {
                result.deletions.push(resource.clone());
            }
        }

        debug!(
            "Diff on '{identity}': {} insertions, {} updations, {} deletions",
            result.insertions.len(),
            result.updations.len(),
            result.deletions.len()
        );

        result
    }
}

impl DiffResult {
    /// Returns true if there are no changes to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.updations.is_empty() && self.deletions.is_empty()
    }

    /// Returns the total number of changes.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.insertions.len() + self.updations.len() + self.deletions.len()
    }
}

impl std::fmt::Display for DiffResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to insert, {} to update, {} to delete",
            self.insertions.len(),
            self.updations.len(),
            self.deletions.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn resource(value: Value) -> Resource {
        Resource::try_from(value).unwrap()
    }

    fn set(values: Vec<Value>) -> ResourceSet {
        values.into_iter().map(resource).collect()
    }

    #[test]
    fn test_insertion_when_target_empty() {
        let source = set(vec![json!({ "id": 1, "name": "a" })]);
        let diff = DiffEngine::new("id").compute(&source, &[]);

        assert_eq!(diff.insertions, source);
        assert!(diff.updations.is_empty());
        assert!(diff.deletions.is_empty());
    }

    #[test]
    fn test_updation_when_fields_differ() {
        let source = set(vec![json!({ "id": 1, "name": "a" })]);
        let target = set(vec![json!({ "id": 1, "name": "b" })]);
        let diff = DiffEngine::new("id").compute(&source, &target);

        assert!(diff.insertions.is_empty());
        assert_eq!(diff.updations, source);
        assert!(diff.deletions.is_empty());
    }

    #[test]
    fn test_deletion_when_source_empty() {
        let target = set(vec![json!({ "id": 9, "name": "x" })]);
        let diff = DiffEngine::new("id").compute(&[], &target);

        assert!(diff.insertions.is_empty());
        assert!(diff.updations.is_empty());
        assert_eq!(diff.deletions, target);
    }

    #[test]
    fn test_equal_sets_produce_empty_diff() {
        let source = set(vec![
            json!({ "id": 1, "name": "a", "tags": ["x", "y"] }),
            json!({ "id": 2, "name": "b" }),
        ]);
        let diff = DiffEngine::new("id").compute(&source, &source.clone());

        assert!(diff.is_empty());
    }

    #[test]
    fn test_partition_by_identity() {
        let source = set(vec![
            json!({ "id": 1, "name": "only-source" }),
            json!({ "id": 2, "name": "common" }),
        ]);
        let target = set(vec![
            json!({ "id": 2, "name": "common" }),
            json!({ "id": 3, "name": "only-target" }),
        ]);
        let diff = DiffEngine::new("id").compute(&source, &target);

        let inserted: Vec<_> = diff.insertions.iter().filter_map(|r| r.key("id")).collect();
        let deleted: Vec<_> = diff.deletions.iter().filter_map(|r| r.key("id")).collect();

        assert_eq!(inserted, vec!["1"]);
        assert_eq!(deleted, vec!["3"]);
        assert!(diff.updations.is_empty());
    }

    #[test]
    fn test_ignored_field_change_is_not_an_updation() {
        let source = set(vec![json!({ "name": "dep", "version": "1.0", "resolved": "1.0.4" })]);
        let target = set(vec![json!({ "name": "dep", "version": "1.0", "resolved": "1.0.9" })]);

        let diff = DiffEngine::new("name")
            .with_ignored_fields(&["resolved"])
            .compute(&source, &target);

        assert!(diff.is_empty());
    }

    #[test]
    fn test_updation_carries_the_source_copy() {
        let source = set(vec![json!({ "id": 1, "name": "a", "resolved": "source" })]);
        let target = set(vec![json!({ "id": 1, "name": "b", "resolved": "target" })]);

        let diff = DiffEngine::new("id")
            .with_ignored_fields(&["resolved"])
            .compute(&source, &target);

        assert_eq!(diff.updations.len(), 1);
        assert_eq!(diff.updations[0].get("resolved"), Some(&json!("source")));
    }

    #[test]
    fn test_deep_equality_is_structural() {
        let source = set(vec![json!({ "id": 1, "spec": { "a": 1, "b": [1, 2] } })]);
        let target = set(vec![json!({ "id": 1, "spec": { "b": [1, 2], "a": 1 } })]);
        let diff = DiffEngine::new("id").compute(&source, &target);

        assert!(diff.is_empty(), "key order must not produce an updation");
    }

    #[test]
    fn test_numeric_identity_matches_by_value() {
        let source = set(vec![json!({ "id": 42, "name": "a" })]);
        let target = set(vec![json!({ "id": 42, "name": "a" })]);
        let diff = DiffEngine::new("id").compute(&source, &target);

        assert!(diff.is_empty());
    }

    #[test]
    fn test_resources_without_identity_are_skipped() {
        let source = set(vec![json!({ "name": "no-id" })]);
        let target = set(vec![json!({ "name": "no-id-either" })]);
        let diff = DiffEngine::new("id").compute(&source, &target);

        assert!(diff.is_empty());
    }
}
