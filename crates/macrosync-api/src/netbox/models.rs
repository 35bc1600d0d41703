// NetBox REST response types.
//
// Only the fields macrosync reads are typed; everything else lands in
// `extra` so a NetBox upgrade that adds fields never breaks decoding.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// A nested object reference (`{"id": 1, "name": "...", "url": "..."}`).
#[derive(Debug, Clone, Deserialize)]
pub struct NestedRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
}

/// Device object from `GET /api/dcim/devices/{id}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct NetBoxDevice {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tenant: Option<NestedRef>,
    #[serde(default)]
    pub site: Option<NestedRef>,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    /// Rendered config context. NetBox returns `null` for devices without one.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub config_context: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetBoxDevice {
    pub fn tenant_id(&self) -> Option<u64> {
        self.tenant.as_ref().map(|t| t.id)
    }

    pub fn site_id(&self) -> Option<u64> {
        self.site.as_ref().map(|s| s.id)
    }

    /// Read a custom field as a string.
    ///
    /// Integer custom fields are rendered in decimal. `null`, empty strings
    /// and any other JSON shape count as missing.
    pub fn custom_field_str(&self, key: &str) -> Result<String, Error> {
        let field = || format!("custom_fields.{key}");
        match self.custom_fields.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(Error::missing(field())),
        }
    }

    /// Extract the macro template at `config_context[context_key][macros_key]`.
    ///
    /// Order follows the config context. String values are taken verbatim;
    /// numbers and booleans are rendered as text, anything else is rejected.
    pub fn macro_template(
        &self,
        context_key: &str,
        macros_key: &str,
    ) -> Result<IndexMap<String, String>, Error> {
        let context = self
            .config_context
            .get(context_key)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::missing(format!("config_context.{context_key}")))?;

        let macros = context
            .get(macros_key)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::missing(format!("config_context.{context_key}.{macros_key}")))?;

        macros
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => {
                        return Err(Error::missing(format!(
                            "config_context.{context_key}.{macros_key}.{name}"
                        )));
                    }
                };
                Ok((name.clone(), text))
            })
            .collect()
    }
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
