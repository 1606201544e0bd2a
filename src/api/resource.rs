//! Opaque resource records exchanged with the deployment APIs.
//!
//! The engine never interprets resource semantics: a [`Resource`] is an
//! arbitrary JSON object carrying an identity field and whatever other
//! fields the deployment returns. The only mutation the engine performs is
//! stripping identity or ignored fields before equality comparison.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An identity-bearing record synchronized between two deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    fields: Map<String, Value>,
}

/// An ordered sequence of resources fetched at one point in time from one
/// deployment. Re-fetched fresh each run; never cached.
pub type ResourceSet = Vec<Resource>;

impl Resource {
    /// Returns the value of a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, replacing any existing value.
    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Returns the canonical string key of a field value.
    ///
    /// Strings are used verbatim; any other JSON value is rendered through
    /// its JSON representation, so numeric identities compare by exact value.
    #[must_use]
    pub fn key(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Returns a human-readable label for this resource.
    ///
    /// Falls back to a placeholder when the display field is absent, so
    /// failure records always name something.
    #[must_use]
    pub fn label(&self, display_field: &str) -> String {
        self.key(display_field)
            .unwrap_or_else(|| format!("<missing {display_field}>"))
    }

    /// Returns a copy of this resource with the given fields stripped.
    ///
    /// Used to exclude identity and ignored fields from equality comparison;
    /// the original resource is never mutated.
    #[must_use]
    pub fn without(&self, fields: &[&str]) -> Self {
        let stripped = self
            .fields
            .iter()
            .filter(|(name, _)| !fields.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { fields: stripped }
    }
}

impl TryFrom<Value> for Resource {
    type Error = crate::error::ResyncError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(crate::error::ResyncError::internal(format!(
                "expected a JSON object resource, got {other}"
            ))),
        }
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
    fn test_key_for_string_and_number_identities() {
        let r = resource(json!({ "id": 7, "title": "reports" }));
        assert_eq!(r.key("id").as_deref(), Some("7"));
        assert_eq!(r.key("title").as_deref(), Some("reports"));
        assert_eq!(r.key("missing"), None);
    }

    #[test]
    fn test_label_falls_back_when_field_absent() {
        let r = resource(json!({ "id": 1 }));
        assert_eq!(r.label("id"), "1");
        assert_eq!(r.label("name"), "<missing name>");
    }

    #[test]
    fn test_without_strips_only_named_fields() {
        let r = resource(json!({ "id": 1, "name": "a", "resolved": "1.2.3" }));
        let stripped = r.without(&["resolved"]);

        assert_eq!(stripped.get("resolved"), None);
        assert_eq!(stripped.get("name"), Some(&json!("a")));
        // Original is untouched.
        assert_eq!(r.get("resolved"), Some(&json!("1.2.3")));
    }

    #[test]
    fn test_equality_is_key_order_independent() {
        let a = resource(json!({ "id": 1, "name": "a" }));
        let b = resource(json!({ "name": "a", "id": 1 }));
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(Resource::try_from(json!([1, 2, 3])).is_err());
    }
}
