// ── Inbound change events ──
//
// The inventory posts one JSON document per object change. Only a handful
// of keys matter here; everything else is ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::snapshot::{Snapshot, normalize_value};

/// Raw event body as received from the inventory webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "Snapshots", default)]
    pub snapshots: Option<Snapshots>,
    #[serde(rename = "Data", default)]
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshots {
    #[serde(rename = "Prechange", default)]
    pub prechange: Option<Value>,
    #[serde(rename = "Postchange", default)]
    pub postchange: Option<Value>,
    #[serde(rename = "Prechange Tags", default)]
    pub prechange_tags: Option<Value>,
    #[serde(rename = "Postchange Tags", default)]
    pub postchange_tags: Option<Value>,
}

/// A validated tag-change event, ready for the reconciliation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEvent {
    pub device_id: u64,
    pub prechange_tags: String,
    pub postchange_tags: String,
}

impl WebhookEvent {
    pub fn from_slice(body: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(body).map_err(|e| CoreError::validation(format!("body is not a valid event: {e}")))
    }

    /// `Data[0].ID` as a device id. Accepts a JSON number or a numeric string.
    pub fn device_id(&self) -> Result<u64, CoreError> {
        let first = self
            .data
            .first()
            .ok_or_else(|| CoreError::validation("'Data' is missing or empty"))?;
        match first.get("ID") {
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| CoreError::validation(format!("'Data[0].ID' is not a device id: {n}"))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| CoreError::validation(format!("'Data[0].ID' is not a device id: {s:?}"))),
            Some(_) => Err(CoreError::validation("'Data[0].ID' is not a device id")),
            None => Err(CoreError::validation("'Data[0].ID' is missing")),
        }
    }

    /// Pre-change snapshot, normalized. Absent or malformed yields `{}`.
    pub fn prechange(&self) -> Snapshot {
        normalize_value(self.snapshots.as_ref().and_then(|s| s.prechange.as_ref()))
    }

    /// Post-change snapshot, normalized. Absent or malformed yields `{}`.
    pub fn postchange(&self) -> Snapshot {
        normalize_value(self.snapshots.as_ref().and_then(|s| s.postchange.as_ref()))
    }

    /// Check that both tag lists and the device id are present.
    pub fn validate(&self) -> Result<MacroEvent, CoreError> {
        let snapshots = self
            .snapshots
            .as_ref()
            .ok_or_else(|| CoreError::validation("'Snapshots' key not found"))?;
        let prechange_tags = tag_list(snapshots.prechange_tags.as_ref(), "Prechange Tags")?;
        let postchange_tags = tag_list(snapshots.postchange_tags.as_ref(), "Postchange Tags")?;
        let device_id = self.device_id()?;

        Ok(MacroEvent {
            device_id,
            prechange_tags,
            postchange_tags,
        })
    }
}

fn tag_list(value: Option<&Value>, key: &str) -> Result<String, CoreError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(CoreError::validation(format!("'Snapshots.{key}' not found"))),
        Some(_) => Err(CoreError::validation(format!(
            "'Snapshots.{key}' must be a string"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(v: &Value) -> WebhookEvent {
        serde_json::from_value(v.clone()).unwrap()
    }

    #[test]
    fn validates_complete_event() {
        let ev = event(&json!({
            "Snapshots": {"Prechange Tags": "a", "Postchange Tags": "a, HCP-Gold"},
            "Data": [{"ID": 17, "name": "sw1"}]
        }));
        assert_eq!(
            ev.validate().unwrap(),
            MacroEvent {
                device_id: 17,
                prechange_tags: "a".into(),
                postchange_tags: "a, HCP-Gold".into(),
            }
        );
    }

    #[test]
    fn numeric_string_id_is_accepted() {
        let ev = event(&json!({"Data": [{"ID": " 42 "}]}));
        assert_eq!(ev.device_id().unwrap(), 42);
    }

    #[test]
    fn missing_pieces_are_validation_errors() {
        let cases = [
            json!({"Data": [{"ID": 1}]}),
            json!({"Snapshots": {"Postchange Tags": ""}, "Data": [{"ID": 1}]}),
            json!({"Snapshots": {"Prechange Tags": "", "Postchange Tags": null}, "Data": [{"ID": 1}]}),
            json!({"Snapshots": {"Prechange Tags": "", "Postchange Tags": ""}}),
            json!({"Snapshots": {"Prechange Tags": "", "Postchange Tags": ""}, "Data": [{}]}),
            json!({"Snapshots": {"Prechange Tags": "", "Postchange Tags": ""}, "Data": [{"ID": "abc"}]}),
            json!({"Snapshots": {"Prechange Tags": 1, "Postchange Tags": ""}, "Data": [{"ID": 1}]}),
        ];
        for case in &cases {
            let err = event(case).validate().unwrap_err();
            assert!(err.is_validation(), "{case}: {err:?}");
        }
    }

    #[test]
    fn garbage_body_is_validation_error() {
        let err = WebhookEvent::from_slice(b"not json").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn snapshots_fail_open() {
        let ev = event(&json!({
            "Snapshots": {"Prechange": "{'status': 'active', 'tenant': None}", "Postchange": "{broken"}
        }));
        assert_eq!(ev.prechange()["status"], "active");
        assert!(ev.postchange().is_empty());
    }
}
