// Debug webhook notifier
//
// Fire-and-report POST of a small JSON document to an operator-facing
// webhook (Teams/Slack style incoming hook).

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, status_error};

/// Body posted to the debug webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zabbix_id: Option<String>,
}

pub struct DebugWebhook {
    http: reqwest::Client,
    url: Url,
}

impl DebugWebhook {
    pub fn new(url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            url: Url::parse(url)?,
        })
    }

    pub fn with_client(url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            url: Url::parse(url)?,
        })
    }

    pub async fn post(&self, payload: &NotifyPayload) -> Result<(), Error> {
        debug!("POST {}", self.url);
        let resp = self
            .http
            .post(self.url.clone())
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, resp, "debug webhook").await)
        }
    }
}
