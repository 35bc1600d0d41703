//! Wire configuration into live collaborators and a driver.

use std::sync::Arc;

use tracing::{debug, info, warn};

use macrosync_api::{DebugWebhook, NetBoxClient, ZabbixClient};
use macrosync_config::{Config, resolve_services};
use macrosync_core::{
    CoreError, Monitoring, NetBoxInventory, Notification, Notifier, NullNotifier,
    ReconciliationDriver, WebhookNotifier, ZabbixMonitoring,
};

use crate::error::CliError;

/// Everything a command needs to talk to NetBox and Zabbix.
pub struct Services {
    pub driver: ReconciliationDriver,
    pub monitoring: Arc<dyn Monitoring>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    /// Send the "Starting App" notification. Failures are logged only.
    pub async fn announce_start(&self) {
        if let Err(e) = self.notifier.notify(&Notification::new("Starting App")).await {
            warn!(error = %e, "startup notification failed");
        }
    }
}

/// Resolve credentials and build the collaborators from `config`.
pub async fn connect(config: &Config) -> Result<Services, CliError> {
    config.validate()?;
    let transport = config.transport();
    let creds = resolve_services(config).await?;
    debug!(netbox = %creds.netbox.url, zabbix = %creds.zabbix.url, "resolved service endpoints");

    let netbox = NetBoxClient::new(&creds.netbox.url, &creds.netbox.token, &transport)
        .map_err(CoreError::from)?;
    let zabbix = || {
        ZabbixClient::new(&creds.zabbix.url, &creds.zabbix.token, &transport)
            .map_err(CoreError::from)
    };

    let monitoring = match config.zabbix.monitoring_host.as_deref() {
        Some(host) => match ZabbixMonitoring::resolve(zabbix()?, host).await {
            Ok(monitoring) => monitoring,
            Err(e @ CoreError::AuthenticationFailed { .. }) => return Err(e.into()),
            // Status items are optional; keep serving without them.
            Err(e) => {
                warn!(host, error = %e, "could not resolve status items; signals disabled");
                ZabbixMonitoring::new(zabbix()?)
            }
        },
        None => ZabbixMonitoring::new(zabbix()?),
    };
    let monitoring: Arc<dyn Monitoring> = Arc::new(monitoring);

    let notifier: Arc<dyn Notifier> = match config.notify.webhook_url.as_deref() {
        Some(url) => {
            let hook = DebugWebhook::new(url, &transport).map_err(CoreError::from)?;
            Arc::new(WebhookNotifier::new(hook))
        }
        None => {
            info!("no notify.webhook_url configured; notifications go to the log");
            Arc::new(NullNotifier)
        }
    };

    let inventory = Arc::new(NetBoxInventory::new(netbox, config.template_location()));
    let driver = ReconciliationDriver::new(
        inventory,
        Arc::clone(&monitoring),
        Arc::clone(&notifier),
        config.driver_settings(),
    );

    Ok(Services {
        driver,
        monitoring,
        notifier,
    })
}
