// ── Field-level change detection ──

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::snapshot::Snapshot;

/// Fields whose change means the device was reclassified and its tags
/// should be recomputed downstream.
pub const IDENTITY_FIELDS: &[&str] = &[
    "tenant",
    "status",
    "site",
    "role",
    "platform",
    "device_type",
];

/// One field that differs between the pre- and post-change snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    #[serde(skip)]
    pub field: String,
    #[serde(rename = "prechange")]
    pub prechange_value: Value,
    #[serde(rename = "postchange")]
    pub postchange_value: Value,
}

/// Changed fields keyed by name. Only keys of the prechange snapshot are
/// ever reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.0.values()
    }

    /// Whether any identity-affecting field changed.
    pub fn requires_retag(&self) -> bool {
        IDENTITY_FIELDS.iter().any(|f| self.0.contains_key(*f))
    }
}

/// Diff two snapshots. A key missing from `post` compares as `null`; keys
/// only present in `post` are ignored.
pub fn compare(pre: &Snapshot, post: &Snapshot) -> ChangeSet {
    let changes = pre
        .iter()
        .filter_map(|(field, before)| {
            let after = post.get(field).unwrap_or(&Value::Null);
            (before != after).then(|| {
                (
                    field.clone(),
                    FieldChange {
                        field: field.clone(),
                        prechange_value: before.clone(),
                        postchange_value: after.clone(),
                    },
                )
            })
        })
        .collect();
    ChangeSet(changes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(v: Value) -> Snapshot {
        match v {
            Value::Object(m) => m,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn reports_exactly_the_differing_prechange_keys() {
        let pre = snap(json!({"name": "sw1", "status": "active", "serial": "A1", "gone": 1}));
        let post = snap(json!({"name": "sw1", "status": "offline", "serial": "A1", "new": 2}));

        let cs = compare(&pre, &post);

        let keys: Vec<_> = cs.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(keys, vec!["gone", "status"]);
        assert_eq!(cs.get("gone").unwrap().postchange_value, Value::Null);
        assert!(!cs.contains("new"));
    }

    #[test]
    fn equality_is_structural() {
        let pre = snap(json!({"site": {"id": 3, "name": "dc1"}}));
        let post = snap(json!({"site": {"name": "dc1", "id": 3}}));
        assert!(compare(&pre, &post).is_empty());

        let post = snap(json!({"site": {"name": "dc1", "id": 4}}));
        assert_eq!(compare(&pre, &post).len(), 1);
    }

    #[test]
    fn explicit_null_matches_missing_key() {
        let pre = snap(json!({"tenant": null}));
        assert!(compare(&pre, &Snapshot::new()).is_empty());
    }

    #[test]
    fn identity_fields_raise_retag() {
        let pre = snap(json!({"comments": "a", "role": "leaf"}));
        let post = snap(json!({"comments": "b", "role": "leaf"}));
        assert!(!compare(&pre, &post).requires_retag());

        let post = snap(json!({"comments": "a", "role": "spine"}));
        assert!(compare(&pre, &post).requires_retag());
    }

    #[test]
    fn serializes_as_field_map() {
        let pre = snap(json!({"status": "active"}));
        let post = snap(json!({"status": "offline"}));
        let out = serde_json::to_value(compare(&pre, &post)).unwrap();
        assert_eq!(
            out,
            json!({"status": {"prechange": "active", "postchange": "offline"}})
        );
    }
}
