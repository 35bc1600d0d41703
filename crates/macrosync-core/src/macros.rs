// ── Macro reconciliation ──
//
// Additive merge of the inventory's desired macro template into the
// monitoring host's live macro set. Nothing is ever removed.

use std::collections::HashMap;
use std::fmt;

use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Desired macros: name → value, in template order.
pub type MacroTemplate = IndexMap<String, String>;

/// How the monitoring system stores a macro value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroKind {
    #[default]
    Text,
    Secret,
    Vault,
}

/// A single host macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroDefinition {
    /// Monitoring-side id of a live macro; `None` for new ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// `None` when the monitoring system hides the value (secret macros).
    pub value: Option<String>,
    pub kind: MacroKind,
    pub description: String,
}

impl MacroDefinition {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            value: Some(value.into()),
            kind: MacroKind::Text,
            description: String::new(),
        }
    }
}

/// Who changed a macro and when; rendered into descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    source: String,
    timestamp: String,
}

impl Provenance {
    /// Stamp with the current local time.
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Stamp with a caller-supplied timestamp string.
    pub fn fixed(source: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: timestamp.into(),
        }
    }

    fn updated(&self) -> String {
        format!("Updated by {} on {}", self.source, self.timestamp)
    }

    fn added(&self) -> String {
        format!("Added by {} on {}", self.source, self.timestamp)
    }
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// The complete macro set to write back.
    pub combined: Vec<MacroDefinition>,
    pub changed: bool,
    /// Names appended because the host lacked them.
    pub added: Vec<String>,
    /// Names whose value was overwritten.
    pub updated: Vec<String>,
    /// Template names whose live value is hidden. These are carried over
    /// as-is and never count as changes.
    pub unreadable: Vec<String>,
}

impl fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} macros ({} added, {} updated)",
            self.combined.len(),
            self.added.len(),
            self.updated.len()
        )
    }
}

/// Merge `template` into `current`.
///
/// Template entries come first, in template order; live macros the template
/// doesn't mention follow in their original order, untouched. Values are
/// compared after trimming whitespace, and a macro whose value already
/// matches keeps its type and description verbatim, so a second run over
/// the combined set reports `changed == false`. A live macro with a hidden
/// value cannot be compared, so it is kept untouched and listed in
/// `unreadable`.
pub fn reconcile(
    template: &MacroTemplate,
    current: &[MacroDefinition],
    provenance: &Provenance,
) -> ReconciliationResult {
    let by_name: HashMap<&str, &MacroDefinition> =
        current.iter().map(|m| (m.name.as_str(), m)).collect();

    let mut result = ReconciliationResult::default();

    for (name, desired) in template {
        let desired = desired.trim();
        let Some(existing) = by_name.get(name.as_str()) else {
            result.combined.push(MacroDefinition {
                id: None,
                name: name.clone(),
                value: Some(desired.to_owned()),
                kind: MacroKind::Text,
                description: provenance.added(),
            });
            result.added.push(name.clone());
            continue;
        };
        match existing.value.as_deref() {
            None => {
                result.combined.push((*existing).clone());
                result.unreadable.push(name.clone());
            }
            Some(live) if live.trim() == desired => {
                result.combined.push((*existing).clone());
            }
            Some(_) => {
                result.combined.push(MacroDefinition {
                    id: existing.id.clone(),
                    name: name.clone(),
                    value: Some(desired.to_owned()),
                    kind: existing.kind,
                    description: provenance.updated(),
                });
                result.updated.push(name.clone());
            }
        }
    }

    result.combined.extend(
        current
            .iter()
            .filter(|m| !template.contains_key(&m.name))
            .cloned(),
    );

    result.changed = !(result.added.is_empty() && result.updated.is_empty());
    result
}
