// ── Zabbix JSON-RPC wire types ──
//
// Zabbix returns numeric enums as strings ("0", "1", "2") on read and
// accepts either form on write. `MacroType` hides that asymmetry.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a P,
    pub id: u64,
}

/// JSON-RPC 2.0 response envelope. Exactly one of `result` / `error` is set.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// User macro value type (`usermacro.type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MacroType {
    /// Plain text value, readable through the API.
    #[default]
    Text,
    /// Secret text; the API never returns the value.
    Secret,
    /// Reference to a path in a Vault-style secret store.
    Vault,
}

impl MacroType {
    pub fn code(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Secret => 1,
            Self::Vault => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Text),
            1 => Some(Self::Secret),
            2 => Some(Self::Vault),
            _ => None,
        }
    }
}

impl Serialize for MacroType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code().to_string())
    }
}

impl<'de> Deserialize<'de> for MacroType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        let code = match Raw::deserialize(deserializer)? {
            Raw::Num(n) => n,
            Raw::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid macro type {s:?}")))?,
        };
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown macro type {code}")))
    }
}

/// A host-level user macro (`usermacro` object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMacro {
    /// Present on read. Sent back, it makes `host.update` edit the macro
    /// in place, and Zabbix keeps any field left out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostmacroid: Option<String>,
    #[serde(rename = "macro")]
    pub name: String,
    /// `None` for secret macros: the API never returns their value. Left
    /// out of writes so the stored secret survives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", default)]
    pub macro_type: MacroType,
    #[serde(default)]
    pub description: String,
}

/// Row from `host.get` with `selectMacros: "extend"`.
#[derive(Debug, Deserialize)]
pub(crate) struct HostWithMacros {
    #[serde(default)]
    pub macros: Vec<HostMacro>,
}

/// Row from `item.get` with `output: ["itemid", "name"]`.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemRef {
    pub itemid: String,
    pub name: String,
}

/// Result of `history.push`.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryPushResult {
    #[serde(default)]
    pub data: Vec<HistoryPushItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryPushItem {
    #[serde(default)]
    pub itemid: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
