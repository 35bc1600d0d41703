// Zabbix JSON-RPC client
//
// Endpoint: {base}/api_jsonrpc.php
// Auth: `Authorization: Bearer <token>` (Zabbix 6.4+)

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use super::models::{
    HistoryPushResult, HostMacro, HostWithMacros, ItemRef, RpcRequest, RpcResponse,
};
use crate::error::Error;
use crate::transport::{TransportConfig, read_json};

/// Zabbix error code for "Not authorised" / session terminated.
const NOT_AUTHORISED: i64 = -32602;

/// Async client for the Zabbix JSON-RPC API.
///
/// Every call is a single POST to `api_jsonrpc.php`; request ids are
/// allocated from an in-process counter.
pub struct ZabbixClient {
    http: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl ZabbixClient {
    /// Build from an API token and transport config.
    ///
    /// `base_url` may be the frontend root or the full `api_jsonrpc.php` URL.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| Error::InvalidHeader {
                header: "Authorization",
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Self::with_client(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: Self::normalize_endpoint(base_url)?,
            next_id: AtomicU64::new(1),
        })
    }

    /// The resolved `api_jsonrpc.php` URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn normalize_endpoint(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        if !path.ends_with(".php") {
            url.set_path(&format!("{path}/api_jsonrpc.php"));
        }
        Ok(url)
    }

    // ── JSON-RPC plumbing ────────────────────────────────────────────

    /// Invoke `method` and unwrap the `result` member of the envelope.
    pub async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, Error>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "POST {}", self.endpoint);

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let envelope: RpcResponse<T> = read_json(resp, method).await?;

        if let Some(err) = envelope.error {
            let data = err.data.map(|d| match d {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return Err(if err.code == NOT_AUTHORISED
                && data.as_deref().is_some_and(is_auth_message)
            {
                Error::Authentication {
                    message: data.unwrap_or(err.message),
                }
            } else {
                Error::JsonRpc {
                    code: err.code,
                    message: err.message,
                    data,
                }
            });
        }

        envelope.result.ok_or_else(|| Error::missing("result"))
    }

    // ── Host macros ──────────────────────────────────────────────────

    /// Read all user macros defined directly on a host.
    pub async fn get_host_macros(&self, host_id: &str) -> Result<Vec<HostMacro>, Error> {
        let params = json!({
            "output": ["hostid"],
            "selectMacros": "extend",
            "hostids": [host_id],
        });
        let hosts: Vec<HostWithMacros> = self.call("host.get", &params).await?;
        trace!(host_id, hosts = hosts.len(), "host.get returned");

        hosts
            .into_iter()
            .next()
            .map(|h| h.macros)
            .ok_or_else(|| Error::NotFound {
                resource: format!("zabbix host {host_id}"),
            })
    }

    /// Replace the full macro set of a host.
    ///
    /// `host.update` with `macros` is a full replace: any macro not in
    /// `macros` is deleted, so callers must send the complete set.
    pub async fn set_host_macros(&self, host_id: &str, macros: &[HostMacro]) -> Result<(), Error> {
        let params = json!({
            "hostid": host_id,
            "macros": macros,
        });
        let result: Value = self.call("host.update", &params).await?;
        trace!(host_id, ?result, "host.update returned");
        Ok(())
    }

    // ── Items / history ──────────────────────────────────────────────

    /// Resolve item ids by item name on the given host.
    ///
    /// Names that do not exist on the host are simply absent from the map.
    pub async fn get_item_ids(
        &self,
        host_name: &str,
        names: &[&str],
    ) -> Result<HashMap<String, String>, Error> {
        let params = json!({
            "output": ["itemid", "name"],
            "host": host_name,
            "sortfield": "name",
        });
        let items: Vec<ItemRef> = self.call("item.get", &params).await?;

        Ok(items
            .into_iter()
            .filter(|item| names.contains(&item.name.as_str()))
            .map(|item| (item.name, item.itemid))
            .collect())
    }

    /// Push a single value into a trapper/HTTP-agent item via `history.push`.
    pub async fn push_history(&self, item_id: &str, value: impl Into<Value>) -> Result<(), Error> {
        let params = json!([{ "itemid": item_id, "value": value.into() }]);
        let result: HistoryPushResult = self.call("history.push", &params).await?;

        if let Some(failed) = result.data.into_iter().find(|d| d.error.is_some()) {
            return Err(Error::JsonRpc {
                code: 0,
                message: failed.error.unwrap_or_default(),
                data: failed.itemid.or_else(|| Some(item_id.to_owned())),
            });
        }
        Ok(())
    }
}

fn is_auth_message(data: &str) -> bool {
    let lower = data.to_ascii_lowercase();
    lower.contains("not authorized")
        || lower.contains("not authorised")
        || lower.contains("session terminated")
}
