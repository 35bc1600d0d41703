// Shared transport configuration for building reqwest::Client instances.
//
// NetBox, Zabbix, Vault and the debug webhook all share TLS and timeout
// settings through this module, avoiding duplicated builder logic.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed inventory appliances).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
///
/// The timeout bounds every outbound call; nothing above this layer retries.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by the NetBox and Zabbix clients to inject their auth headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("macrosync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Decode a successful JSON response, or map the failure status.
///
/// `resource` names the thing being fetched for `NotFound` errors.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
    resource: &str,
) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(status_error(status, resp, resource).await);
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body))
}

/// Map a non-success status into the matching `Error` variant.
pub(crate) async fn status_error(
    status: reqwest::StatusCode,
    resp: reqwest::Response,
    resource: &str,
) -> Error {
    let raw = resp.text().await.unwrap_or_default();
    let preview = raw[..crate::error::floor_char_boundary(&raw, 200)].to_owned();

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            Error::Authentication {
                message: if preview.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {preview}")
                },
            }
        }
        reqwest::StatusCode::NOT_FOUND => Error::NotFound {
            resource: resource.to_owned(),
        },
        _ => Error::Http {
            status: status.as_u16(),
            message: if preview.is_empty() {
                status.to_string()
            } else {
                preview
            },
        },
    }
}
