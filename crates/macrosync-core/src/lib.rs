// macrosync-core: change detection and macro reconciliation between
// macrosync-api clients and the consumers (webhook server / CLI).

pub mod adapters;
pub mod changes;
pub mod collaborator;
pub mod driver;
pub mod error;
pub mod event;
pub mod heartbeat;
pub mod macros;
pub mod placeholder;
pub mod snapshot;
pub mod tags;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapters::{NetBoxInventory, NullNotifier, TemplateLocation, WebhookNotifier, ZabbixMonitoring};
pub use changes::{ChangeSet, FieldChange, IDENTITY_FIELDS, compare};
pub use collaborator::{DeviceInfo, Inventory, Monitoring, Notification, Notifier, StatusSignal};
pub use driver::{DriverSettings, EventReport, Outcome, Plan, ReconciliationDriver, Stage};
pub use error::CoreError;
pub use event::{MacroEvent, WebhookEvent};
pub use heartbeat::Heartbeat;
pub use macros::{
    MacroDefinition, MacroKind, MacroTemplate, Provenance, ReconciliationResult, reconcile,
};
pub use placeholder::{PlaceholderIds, substitute, substitute_template};
pub use snapshot::{Snapshot, normalize, normalize_value};
pub use tags::{TagDiff, TagSet, diff_tags};
