// ── Collaborator seams ──
//
// The driver only talks to the outside world through these traits. Real
// implementations live in `adapters`; tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

use crate::error::CoreError;
use crate::macros::{MacroDefinition, MacroTemplate};

/// What the driver needs to know about one inventory device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_id: u64,
    pub tenant_id: Option<u64>,
    pub site_id: Option<u64>,
    /// Monitoring-side host id, from the device's custom field.
    pub host_id: String,
    /// Desired macros, placeholders not yet substituted.
    pub template: MacroTemplate,
}

/// Named monitoring items that receive status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StatusSignal {
    UpdateTrue,
    UpdateFalse,
    Error,
    Uptime,
}

/// A message for the operator notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub device_id: Option<u64>,
    pub host_id: Option<String>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            device_id: None,
            host_id: None,
        }
    }

    pub fn for_device(message: impl Into<String>, device_id: u64, host_id: Option<&str>) -> Self {
        Self {
            message: message.into(),
            device_id: Some(device_id),
            host_id: host_id.map(str::to_owned),
        }
    }
}

/// Inventory of record.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn get_device(&self, device_id: u64) -> Result<DeviceInfo, CoreError>;
}

/// Monitoring system holding the live macros.
#[async_trait]
pub trait Monitoring: Send + Sync {
    async fn get_macros(&self, host_id: &str) -> Result<Vec<MacroDefinition>, CoreError>;

    /// Full replace: `macros` must be the complete desired set.
    async fn set_macros(&self, host_id: &str, macros: &[MacroDefinition]) -> Result<(), CoreError>;

    async fn push_signal(&self, signal: StatusSignal, value: Value) -> Result<(), CoreError>;
}

/// Operator notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), CoreError>;
}
