// NetBox REST client
//
// Base path: /api/
// Auth: `Authorization: Token <token>` header

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::models::NetBoxDevice;
use crate::error::Error;
use crate::transport::{TransportConfig, read_json};

/// Async client for the NetBox REST API.
///
/// Read-only: macrosync never writes to the inventory.
pub struct NetBoxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetBoxClient {
    /// Build from a token and transport config.
    ///
    /// `base_url` may be the NetBox root (`https://netbox.example.com`) or
    /// already point at `/api`.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|_| Error::InvalidHeader {
                header: "Authorization",
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized API base URL (always ends with `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch a single device with its rendered config context.
    pub async fn get_device(&self, id: u64) -> Result<NetBoxDevice, Error> {
        let url = self.base_url.join(&format!("dcim/devices/{id}/"))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        read_json(resp, &format!("netbox device {id}")).await
    }
}
