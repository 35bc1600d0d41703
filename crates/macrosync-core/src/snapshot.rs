// ── Snapshot normalization ──
//
// Inventory webhooks render before/after snapshots with a Python-ish
// repr: bare `None` and single quotes. We rewrite that into JSON and
// parse it, failing open to an empty mapping.

use serde_json::{Map, Value};
use tracing::warn;

/// Field name → value mapping for one side of a change event.
pub type Snapshot = Map<String, Value>;

/// Canonicalize a loosely encoded snapshot string.
///
/// Missing or blank input is treated as `{}`. The rewrite is purely textual
/// (`None` → `null`, `'` → `"`), so values that themselves contain those
/// sequences are mangled; a parse failure or a non-object top level yields
/// an empty snapshot instead of an error.
pub fn normalize(raw: Option<&str>) -> Snapshot {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => "{}",
    };

    let rewritten = raw.replace("None", "null").replace('\'', "\"");

    match serde_json::from_str::<Value>(&rewritten) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(kind = json_kind(&other), "snapshot is not an object, using empty snapshot");
            Snapshot::new()
        }
        Err(e) => {
            warn!(error = %e, "snapshot failed to parse, using empty snapshot");
            Snapshot::new()
        }
    }
}

/// Normalize a snapshot that may arrive either as a pre-rendered string or
/// as a JSON object (NetBox's native webhook body).
pub fn normalize_value(raw: Option<&Value>) -> Snapshot {
    match raw {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => normalize(Some(s)),
        None | Some(Value::Null) => Snapshot::new(),
        Some(other) => {
            warn!(kind = json_kind(other), "unexpected snapshot type, using empty snapshot");
            Snapshot::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
