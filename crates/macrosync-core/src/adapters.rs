// ── Collaborator adapters over macrosync-api clients ──

use std::collections::HashMap;

use async_trait::async_trait;
use macrosync_api::{
    DebugWebhook, HostMacro, MacroType, NetBoxClient, NetBoxDevice, NotifyPayload, ZabbixClient,
};
use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::collaborator::{DeviceInfo, Inventory, Monitoring, Notification, Notifier, StatusSignal};
use crate::error::CoreError;
use crate::macros::{MacroDefinition, MacroKind};

// ── Type conversions ────────────────────────────────────────────────

impl From<MacroType> for MacroKind {
    fn from(t: MacroType) -> Self {
        match t {
            MacroType::Text => Self::Text,
            MacroType::Secret => Self::Secret,
            MacroType::Vault => Self::Vault,
        }
    }
}

impl From<MacroKind> for MacroType {
    fn from(k: MacroKind) -> Self {
        match k {
            MacroKind::Text => Self::Text,
            MacroKind::Secret => Self::Secret,
            MacroKind::Vault => Self::Vault,
        }
    }
}

impl From<HostMacro> for MacroDefinition {
    fn from(m: HostMacro) -> Self {
        Self {
            id: m.hostmacroid,
            name: m.name,
            value: m.value,
            kind: m.macro_type.into(),
            description: m.description,
        }
    }
}

impl From<&MacroDefinition> for HostMacro {
    fn from(m: &MacroDefinition) -> Self {
        Self {
            hostmacroid: m.id.clone(),
            name: m.name.clone(),
            value: m.value.clone(),
            macro_type: m.kind.into(),
            description: m.description.clone(),
        }
    }
}

// ── Inventory ───────────────────────────────────────────────────────

/// Where on an inventory device the monitoring host id and macro template live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLocation {
    pub host_id_field: String,
    pub context_key: String,
    pub macros_key: String,
}

impl Default for TemplateLocation {
    fn default() -> Self {
        Self {
            host_id_field: "zabbix_hostid".into(),
            context_key: "HCP-Vault".into(),
            macros_key: "zbx_macros".into(),
        }
    }
}

impl TemplateLocation {
    pub fn device_info(&self, device: &NetBoxDevice) -> Result<DeviceInfo, CoreError> {
        Ok(DeviceInfo {
            device_id: device.id,
            tenant_id: device.tenant_id(),
            site_id: device.site_id(),
            host_id: device.custom_field_str(&self.host_id_field)?,
            template: device.macro_template(&self.context_key, &self.macros_key)?,
        })
    }
}

pub struct NetBoxInventory {
    client: NetBoxClient,
    location: TemplateLocation,
}

impl NetBoxInventory {
    pub fn new(client: NetBoxClient, location: TemplateLocation) -> Self {
        Self { client, location }
    }
}

#[async_trait]
impl Inventory for NetBoxInventory {
    async fn get_device(&self, device_id: u64) -> Result<DeviceInfo, CoreError> {
        let device = self.client.get_device(device_id).await?;
        self.location.device_info(&device)
    }
}

// ── Monitoring ──────────────────────────────────────────────────────

pub struct ZabbixMonitoring {
    client: ZabbixClient,
    items: HashMap<StatusSignal, String>,
}

impl ZabbixMonitoring {
    /// Monitoring adapter with no signal items; pushes become no-ops.
    pub fn new(client: ZabbixClient) -> Self {
        Self {
            client,
            items: HashMap::new(),
        }
    }

    pub fn with_items(client: ZabbixClient, items: HashMap<StatusSignal, String>) -> Self {
        Self { client, items }
    }

    /// Look up the status items on `host_name` by their signal names.
    /// Items that don't exist are logged and skipped.
    pub async fn resolve(client: ZabbixClient, host_name: &str) -> Result<Self, CoreError> {
        let names: Vec<&'static str> = StatusSignal::iter().map(<&'static str>::from).collect();
        let mut found = client.get_item_ids(host_name, &names).await?;

        let mut items = HashMap::new();
        for signal in StatusSignal::iter() {
            match found.remove(signal.as_ref()) {
                Some(id) => {
                    debug!(signal = %signal, item_id = %id, "resolved status item");
                    items.insert(signal, id);
                }
                None => warn!(signal = %signal, host = host_name, "status item not found on monitoring host"),
            }
        }
        Ok(Self { client, items })
    }

    pub fn item_id(&self, signal: StatusSignal) -> Option<&str> {
        self.items.get(&signal).map(String::as_str)
    }
}

#[async_trait]
impl Monitoring for ZabbixMonitoring {
    async fn get_macros(&self, host_id: &str) -> Result<Vec<MacroDefinition>, CoreError> {
        let macros = self.client.get_host_macros(host_id).await?;
        Ok(macros.into_iter().map(MacroDefinition::from).collect())
    }

    async fn set_macros(&self, host_id: &str, macros: &[MacroDefinition]) -> Result<(), CoreError> {
        let wire: Vec<HostMacro> = macros.iter().map(HostMacro::from).collect();
        self.client
            .set_host_macros(host_id, &wire)
            .await
            .map_err(|e| CoreError::Apply {
                host_id: host_id.to_owned(),
                source: Box::new(e.into()),
            })
    }

    async fn push_signal(&self, signal: StatusSignal, value: Value) -> Result<(), CoreError> {
        let Some(item_id) = self.item_id(signal) else {
            debug!(signal = %signal, "no item for status signal, skipping push");
            return Ok(());
        };
        self.client.push_history(item_id, value).await?;
        Ok(())
    }
}

// ── Notifiers ───────────────────────────────────────────────────────

/// Posts notifications to the debug webhook.
pub struct WebhookNotifier {
    hook: DebugWebhook,
}

impl WebhookNotifier {
    pub fn new(hook: DebugWebhook) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), CoreError> {
        let payload = NotifyPayload {
            message: notification.message.clone(),
            device_id: notification.device_id,
            zabbix_id: notification.host_id.clone(),
        };
        self.hook.post(&payload).await?;
        Ok(())
    }
}

/// Used when no webhook is configured: notifications only go to the log.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), CoreError> {
        info!(
            device_id = ?notification.device_id,
            host_id = ?notification.host_id,
            "{}",
            notification.message
        );
        Ok(())
    }
}
