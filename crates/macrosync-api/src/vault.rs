// Vault KV v2 reader
//
// GET {address}/v1/{mount}/data/{path}
// Auth: X-Vault-Token header

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, read_json};

#[derive(Deserialize)]
struct KvEnvelope {
    data: KvData,
}

#[derive(Deserialize)]
struct KvData {
    #[serde(default)]
    data: Option<HashMap<String, Value>>,
    #[serde(default)]
    metadata: Option<KvMetadata>,
}

#[derive(Deserialize)]
struct KvMetadata {
    #[serde(default)]
    version: Option<u64>,
}

/// The key/value pairs of one KV v2 secret.
///
/// Values are wrapped in `SecretString` as soon as they leave the wire.
#[derive(Debug)]
pub struct KvSecret {
    path: String,
    values: HashMap<String, SecretString>,
}

impl KvSecret {
    /// Fetch a required key, failing with `MissingField` (`{path}.{key}`).
    pub fn get(&self, key: &str) -> Result<SecretString, Error> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| Error::missing(format!("{}.{key}", self.path)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Minimal read-only client for a Vault KV v2 mount.
pub struct VaultClient {
    http: reqwest::Client,
    address: Url,
    mount_point: String,
}

impl VaultClient {
    pub fn new(
        address: &str,
        token: &SecretString,
        mount_point: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(token.expose_secret()).map_err(|_| {
            Error::InvalidHeader {
                header: "X-Vault-Token",
            }
        })?;
        value.set_sensitive(true);
        headers.insert("X-Vault-Token", value);

        let http = transport.build_client_with_headers(headers)?;
        let mut address = Url::parse(address)?;
        let path = address.path().trim_end_matches('/').to_owned();
        address.set_path(&format!("{path}/"));

        Ok(Self {
            http,
            address,
            mount_point: mount_point.trim_matches('/').to_owned(),
        })
    }

    /// Read the latest version of the secret at `path`.
    pub async fn read_kv2(&self, path: &str) -> Result<KvSecret, Error> {
        let path = path.trim_matches('/');
        let url = self
            .address
            .join(&format!("v1/{}/data/{path}", self.mount_point))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let envelope: KvEnvelope = read_json(resp, &format!("vault secret {path}")).await?;

        let data = envelope
            .data
            .data
            .ok_or_else(|| Error::missing(format!("{path}.data")))?;
        let version = envelope.data.metadata.and_then(|m| m.version);
        info!(secret_path = path, ?version, "secret loaded from Vault");

        let values = data
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, SecretString::from(text))
            })
            .collect();

        Ok(KvSecret {
            path: path.to_owned(),
            values,
        })
    }
}
