//! Removal of instance fields this tool does not support
//!
//! Configuration files are often exported from the console and carry settings
//! that the insert path here cannot honor. They are stripped before the file
//! is mapped onto an [`InstanceSpec`](crate::InstanceSpec).

use serde::Serialize;
use serde_json::{Map, Value};

/// Top-level keys dropped from raw configuration
pub const UNSUPPORTED_FIELDS: &[&str] = &[
    "shieldedInstanceConfig",
    "shieldedVmConfig",
    "shieldedInstanceIntegrityPolicy",
    "confidentialInstanceConfig",
];

/// A field removed by [`sanitize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizeWarning {
    pub field: String,
}

impl std::fmt::Display for SanitizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "removed unsupported field '{}'", self.field)
    }
}

/// Return `raw` without the unsupported fields, plus one warning per removed
/// field in [`UNSUPPORTED_FIELDS`] order. The input is left untouched.
pub fn sanitize(raw: &Map<String, Value>) -> (Map<String, Value>, Vec<SanitizeWarning>) {
    let mut filtered = raw.clone();
    let warnings = UNSUPPORTED_FIELDS
        .iter()
        .filter(|field| filtered.remove(**field).is_some())
        .map(|field| SanitizeWarning {
            field: field.to_string(),
        })
        .collect();
    (filtered, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_removes_only_unsupported_field() {
        let raw = map(json!({
            "name": "vm-a",
            "machineType": "e2-small",
            "shieldedInstanceConfig": {"enableSecureBoot": true},
            "labels": {"team": "infra"}
        }));

        let (filtered, warnings) = sanitize(&raw);

        assert_eq!(warnings, vec![SanitizeWarning { field: "shieldedInstanceConfig".into() }]);
        assert!(!filtered.contains_key("shieldedInstanceConfig"));
        assert_eq!(filtered["name"], raw["name"]);
        assert_eq!(filtered["labels"], raw["labels"]);
        assert_eq!(filtered.len(), raw.len() - 1);
    }

    #[test]
    fn test_one_warning_per_removed_field() {
        let raw = map(json!({
            "name": "vm-a",
            "shieldedVmConfig": {},
            "confidentialInstanceConfig": {"enableConfidentialCompute": false}
        }));

        let (filtered, warnings) = sanitize(&raw);
        assert_eq!(warnings.len(), 2);
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let raw = map(json!({
            "name": "vm-a",
            "shieldedInstanceConfig": {"enableVtpm": true},
            "unknownThing": [1, 2, 3]
        }));

        let (once, _) = sanitize(&raw);
        let (twice, warnings) = sanitize(&once);
        assert_eq!(once, twice);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_same_input_same_output() {
        let raw = map(json!({"shieldedInstanceConfig": {}, "name": "x"}));
        assert_eq!(sanitize(&raw), sanitize(&raw));
    }
}
