// ── Reconciliation driver ──
//
// Per-event pipeline: validate → diff tags → gate on the trigger prefix →
// fetch device → reconcile macros → write back (only when changed) →
// report. Stateless between events; callers serialize runs per device.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display};
use tracing::{debug, error, info, warn};

use crate::collaborator::{DeviceInfo, Inventory, Monitoring, Notification, Notifier, StatusSignal};
use crate::error::CoreError;
use crate::event::WebhookEvent;
use crate::macros::{Provenance, ReconciliationResult, reconcile};
use crate::placeholder::{PlaceholderIds, substitute_template};
use crate::tags::{TagDiff, diff_tags};

const MSG_APPLIED: &str = "Device needs to be updated.";
const MSG_NOOP: &str = "No changes to macros. Update not required.";
const MSG_FAILED: &str = "An error occurred while updating Zabbix host macros.";

// ── Stage ────────────────────────────────────────────────────────────

/// Pipeline stages, in the order an event passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Validated,
    TagDiffed,
    Skipped,
    DeviceFetched,
    MacrosReconciled,
    Applied,
    Noop,
    Reported,
    Done,
    Failed,
}

#[derive(Debug, Default)]
struct Trail(Vec<Stage>);

impl Trail {
    fn enter(&mut self, stage: Stage) {
        debug!(stage = %stage, "reconciliation stage");
        self.0.push(stage);
    }
}

// ── Settings / results ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    /// Added tags starting with this prefix trigger reconciliation.
    pub trigger_prefix: String,
    /// Name written into macro descriptions.
    pub provenance_source: String,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            trigger_prefix: "HCP".into(),
            provenance_source: "NetBox-HCP-ZBX".into(),
        }
    }
}

/// Terminal effect of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No added tag matched the trigger prefix.
    Skipped,
    Applied {
        device_id: u64,
        host_id: String,
        added: Vec<String>,
        updated: Vec<String>,
    },
    Noop {
        device_id: u64,
        host_id: String,
    },
}

impl Outcome {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Skipped => Stage::Skipped,
            Self::Applied { .. } => Stage::Applied,
            Self::Noop { .. } => Stage::Noop,
        }
    }
}

/// What the driver did with one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    #[serde(flatten)]
    pub tags: TagDiff,
    /// The added tag that triggered reconciliation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub stages: Vec<Stage>,
}

/// A computed but unapplied reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub device: DeviceInfo,
    pub result: ReconciliationResult,
}

// ── Driver ───────────────────────────────────────────────────────────

/// Runs events through the reconciliation pipeline.
///
/// Cheaply cloneable; collaborators are shared behind `Arc<dyn _>`.
#[derive(Clone)]
pub struct ReconciliationDriver {
    inner: Arc<DriverInner>,
}

struct DriverInner {
    inventory: Arc<dyn Inventory>,
    monitoring: Arc<dyn Monitoring>,
    notifier: Arc<dyn Notifier>,
    settings: DriverSettings,
}

impl ReconciliationDriver {
    pub fn new(
        inventory: Arc<dyn Inventory>,
        monitoring: Arc<dyn Monitoring>,
        notifier: Arc<dyn Notifier>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                inventory,
                monitoring,
                notifier,
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.inner.settings
    }

    /// Run one inbound event end to end.
    ///
    /// Validation errors are returned before any collaborator is touched.
    /// Any later failure is reported through the notifier and the `error`
    /// signal, then returned.
    pub async fn process(&self, event: &WebhookEvent) -> Result<EventReport, CoreError> {
        let mut trail = Trail::default();
        trail.enter(Stage::Received);

        let event = match event.validate() {
            Ok(ev) => ev,
            Err(e) => {
                trail.enter(Stage::Failed);
                warn!(error = %e, "rejected event");
                return Err(e);
            }
        };
        trail.enter(Stage::Validated);

        let tags = diff_tags(&event.prechange_tags, &event.postchange_tags);
        trail.enter(Stage::TagDiffed);
        debug!(
            device_id = event.device_id,
            added = ?tags.added,
            removed = ?tags.removed,
            "tag diff"
        );

        let Some(trigger) = tags
            .added
            .first_with_prefix(&self.inner.settings.trigger_prefix)
            .map(str::to_owned)
        else {
            trail.enter(Stage::Skipped);
            trail.enter(Stage::Done);
            return Ok(EventReport {
                tags,
                trigger: None,
                outcome: Outcome::Skipped,
                stages: trail.0,
            });
        };

        info!(device_id = event.device_id, tag = %trigger, "trigger tag added");
        let outcome = self.converge(event.device_id, &mut trail).await?;

        Ok(EventReport {
            tags,
            trigger: Some(trigger),
            outcome,
            stages: trail.0,
        })
    }

    /// Reconcile one device regardless of tags, with full reporting.
    pub async fn reconcile_device(&self, device_id: u64) -> Result<Outcome, CoreError> {
        let mut trail = Trail::default();
        trail.enter(Stage::Received);
        self.converge(device_id, &mut trail).await
    }

    /// Fetch and reconcile without writing back or reporting.
    pub async fn plan(&self, device_id: u64) -> Result<Plan, CoreError> {
        let device = self.inner.inventory.get_device(device_id).await?;
        self.plan_for(device).await
    }

    async fn plan_for(&self, device: DeviceInfo) -> Result<Plan, CoreError> {
        let ids = PlaceholderIds {
            tenant_id: device.tenant_id,
            device_id: device.device_id,
            site_id: device.site_id,
        };
        let template = substitute_template(&device.template, &ids);
        let current = self.inner.monitoring.get_macros(&device.host_id).await?;
        let provenance = Provenance::now(&self.inner.settings.provenance_source);
        let result = reconcile(&template, &current, &provenance);
        if !result.unreadable.is_empty() {
            warn!(
                host_id = %device.host_id,
                macros = ?result.unreadable,
                "secret macros named by the template cannot be compared; left unchanged"
            );
        }
        Ok(Plan { device, result })
    }

    async fn converge(&self, device_id: u64, trail: &mut Trail) -> Result<Outcome, CoreError> {
        let mut host_id = None;
        match self.apply(device_id, &mut host_id, trail).await {
            Ok(outcome) => {
                trail.enter(outcome.stage());
                self.report_success(&outcome).await;
                trail.enter(Stage::Reported);
                trail.enter(Stage::Done);
                Ok(outcome)
            }
            Err(e) => {
                trail.enter(Stage::Failed);
                error!(device_id, host_id = ?host_id, error = %e, "reconciliation failed");
                self.report_failure(device_id, host_id.as_deref(), &e).await;
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        device_id: u64,
        host_id: &mut Option<String>,
        trail: &mut Trail,
    ) -> Result<Outcome, CoreError> {
        let device = self.inner.inventory.get_device(device_id).await?;
        *host_id = Some(device.host_id.clone());
        trail.enter(Stage::DeviceFetched);

        let Plan { device, result } = self.plan_for(device).await?;
        trail.enter(Stage::MacrosReconciled);

        if !result.changed {
            info!(device_id, host_id = %device.host_id, "macros already in sync");
            return Ok(Outcome::Noop {
                device_id,
                host_id: device.host_id,
            });
        }

        self.inner
            .monitoring
            .set_macros(&device.host_id, &result.combined)
            .await?;
        info!(device_id, host_id = %device.host_id, summary = %result, "host macros updated");

        Ok(Outcome::Applied {
            device_id,
            host_id: device.host_id,
            added: result.added,
            updated: result.updated,
        })
    }

    // ── Reporting ────────────────────────────────────────────────────

    async fn report_success(&self, outcome: &Outcome) {
        let (message, signal, device_id, host_id) = match outcome {
            Outcome::Skipped => return,
            Outcome::Applied {
                device_id, host_id, ..
            } => (MSG_APPLIED, StatusSignal::UpdateTrue, *device_id, host_id),
            Outcome::Noop { device_id, host_id } => {
                (MSG_NOOP, StatusSignal::UpdateFalse, *device_id, host_id)
            }
        };
        self.notify(&Notification::for_device(message, device_id, Some(host_id)))
            .await;
        self.signal(
            signal,
            format!("{message} Device ID: {device_id}, Zabbix host ID: {host_id}"),
        )
        .await;
    }

    async fn report_failure(&self, device_id: u64, host_id: Option<&str>, err: &CoreError) {
        self.notify(&Notification::for_device(MSG_FAILED, device_id, host_id))
            .await;
        let message = format!(
            "{}: device_id: {device_id}, zabbix_id: {}, error: {err}",
            MSG_FAILED.trim_end_matches('.'),
            host_id.unwrap_or("unknown"),
        );
        self.signal(StatusSignal::Error, message).await;
    }

    async fn notify(&self, notification: &Notification) {
        if let Err(e) = self.inner.notifier.notify(notification).await {
            warn!(error = %e, message = %notification.message, "notification failed");
        }
    }

    async fn signal(&self, signal: StatusSignal, message: String) {
        if let Err(e) = self
            .inner
            .monitoring
            .push_signal(signal, Value::String(message))
            .await
        {
            warn!(signal = %signal, error = %e, "status signal push failed");
        }
    }
}
