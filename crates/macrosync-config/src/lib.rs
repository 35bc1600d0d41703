//! Configuration for macrosync.
//!
//! TOML file + `MACROSYNC_` environment layering, the legacy deployment
//! variables (`VAULT_URL`, `ZBX_MONITORING_HOST_NAME`, ...), credential
//! resolution (env → Vault → plaintext), and translation into the
//! transport and driver settings the other crates consume.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use macrosync_api::{KvSecret, TlsMode, TransportConfig, VaultClient};
use macrosync_core::{DriverSettings, TemplateLocation};

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for {service}")]
    NoCredentials {
        service: &'static str,
        what: &'static str,
    },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("vault lookup failed: {0}")]
    Vault(#[from] macrosync_api::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default = "ServiceSection::netbox")]
    pub netbox: ServiceSection,
    #[serde(default = "ServiceSection::zabbix")]
    pub zabbix: ServiceSection,
    #[serde(default)]
    pub vault: VaultSection,
    #[serde(default)]
    pub notify: NotifySection,
    #[serde(default)]
    pub heartbeat: HeartbeatSection,
    #[serde(default)]
    pub reconcile: ReconcileSection,
    #[serde(default)]
    pub sync: SyncSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            defaults: Defaults::default(),
            netbox: ServiceSection::netbox(),
            zabbix: ServiceSection::zabbix(),
            vault: VaultSection::default(),
            notify: NotifySection::default(),
            heartbeat: HeartbeatSection::default(),
            reconcile: ReconcileSection::default(),
            sync: SyncSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-request timeout in seconds for every outbound call.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Connection settings for NetBox or Zabbix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceSection {
    /// Base URL. Falls back to `{name}_url` in the Vault secret.
    pub url: Option<String>,

    /// API token in plaintext. Prefer `token_env` or Vault.
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Vault KV path holding `{name}_url` / `{name}_token`.
    pub vault_path: Option<String>,

    /// Zabbix only: host carrying the status items.
    pub monitoring_host: Option<String>,
}

impl ServiceSection {
    fn empty() -> Self {
        Self {
            url: None,
            token: None,
            token_env: None,
            vault_path: None,
            monitoring_host: None,
        }
    }

    fn netbox() -> Self {
        Self::empty()
    }

    fn zabbix() -> Self {
        Self {
            monitoring_host: Some("macrosync".into()),
            ..Self::empty()
        }
    }
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VaultSection {
    #[serde(default)]
    pub enabled: bool,
    pub url: Option<String>,
    pub token: Option<String>,
    pub token_env: Option<String>,
    #[serde(default = "default_mount")]
    pub mount_point: String,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            token: None,
            token_env: None,
            mount_point: default_mount(),
        }
    }
}

fn default_mount() -> String {
    "secret".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotifySection {
    /// Debug webhook receiving operator notifications. Unset: log only.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeartbeatSection {
    /// Seconds between uptime reports; 0 disables the heartbeat.
    #[serde(default = "default_heartbeat")]
    pub interval_secs: u64,
}

impl Default for HeartbeatSection {
    fn default() -> Self {
        Self {
            interval_secs: default_heartbeat(),
        }
    }
}

fn default_heartbeat() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileSection {
    pub trigger_prefix: String,
    pub context_key: String,
    pub macros_key: String,
    pub host_id_field: String,
    pub provenance_source: String,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        let location = TemplateLocation::default();
        let driver = DriverSettings::default();
        Self {
            trigger_prefix: driver.trigger_prefix,
            context_key: location.context_key,
            macros_key: location.macros_key,
            host_id_field: location.host_id_field,
            provenance_source: driver.provenance_source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncSection {
    /// Full-sync command argv; the device id flags are appended per run.
    #[serde(default)]
    pub command: Vec<String>,
}

// ── Derived settings ────────────────────────────────────────────────

impl Config {
    /// Parse a TOML document on top of the defaults (no env layering).
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(text))
            .extract()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e| ConfigError::Validation {
                field: "server.bind".into(),
                reason: format!("{e}: {}", self.server.bind),
            })
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.defaults.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.defaults.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.defaults.timeout),
        }
    }

    pub fn driver_settings(&self) -> DriverSettings {
        DriverSettings {
            trigger_prefix: self.reconcile.trigger_prefix.clone(),
            provenance_source: self.reconcile.provenance_source.clone(),
        }
    }

    pub fn template_location(&self) -> TemplateLocation {
        TemplateLocation {
            host_id_field: self.reconcile.host_id_field.clone(),
            context_key: self.reconcile.context_key.clone(),
            macros_key: self.reconcile.macros_key.clone(),
        }
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat.interval_secs > 0).then(|| Duration::from_secs(self.heartbeat.interval_secs))
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.reconcile.trigger_prefix.is_empty() {
            return Err(ConfigError::Validation {
                field: "reconcile.trigger_prefix".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.defaults.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        for (field, url) in [
            ("netbox.url", &self.netbox.url),
            ("zabbix.url", &self.zabbix.url),
            ("vault.url", &self.vault.url),
            ("notify.webhook_url", &self.notify.webhook_url),
        ] {
            if let Some(url) = url {
                url::Url::parse(url).map_err(|e| ConfigError::Validation {
                    field: field.into(),
                    reason: format!("{e}: {url}"),
                })?;
            }
        }
        Ok(())
    }

    /// Copy with every plaintext secret masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_owned());
        let mut out = self.clone();
        out.netbox.token = mask(&self.netbox.token);
        out.zabbix.token = mask(&self.zabbix.token);
        out.vault.token = mask(&self.vault.token);
        // Webhook URLs usually embed their credential in the path or query.
        out.notify.webhook_url = mask(&self.notify.webhook_url);
        out
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fold in the variables older deployments set directly.
    ///
    /// Values already present in the file or `MACROSYNC_` env win.
    pub fn apply_legacy_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if self.vault.url.is_none() {
            if let Some(url) = env("VAULT_URL") {
                self.vault.url = Some(url);
                self.vault.enabled = true;
            }
        }
        if let Some(mount) = env("MOUNT_POINT") {
            if self.vault.mount_point == default_mount() {
                self.vault.mount_point = mount;
            }
        }
        if self.vault.token_env.is_none() && env("VAULT_TOKEN").is_some() {
            self.vault.token_env = Some("VAULT_TOKEN".into());
        }
        if let Some(host) = env("ZBX_MONITORING_HOST_NAME") {
            if self.zabbix.monitoring_host == ServiceSection::zabbix().monitoring_host {
                self.zabbix.monitoring_host = Some(host);
            }
        }
        if self.notify.webhook_url.is_none() {
            self.notify.webhook_url = env("DEBUG_WEBHOOK_URL");
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "macrosync", "macrosync").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("macrosync");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from `path` (or the default location) plus
/// environment.
///
/// An explicitly named file must exist; the default location may be absent.
/// `MACROSYNC_ZABBIX__MONITORING_HOST=...` style variables override file
/// values, and the legacy variables fill whatever is still unset.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::NotFound {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };
    debug!(path = %path.display(), "loading config");

    let mut config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("MACROSYNC_").split("__"))
        .extract()?;

    config.apply_legacy_env(|key| std::env::var(key).ok());
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// A resolved service endpoint.
#[derive(Debug, Clone)]
pub struct ServiceCredentials {
    pub url: String,
    pub token: SecretString,
}

/// Credentials for both collaborators, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedServices {
    pub netbox: ServiceCredentials,
    pub zabbix: ServiceCredentials,
}

/// Resolve NetBox and Zabbix credentials using the process environment.
pub async fn resolve_services(config: &Config) -> Result<ResolvedServices, ConfigError> {
    resolve_services_with(config, |key| std::env::var(key).ok()).await
}

/// Resolve credentials with an explicit environment lookup.
///
/// Per service: token from the env var named by `token_env`, then the
/// Vault secret, then plaintext `token`. URLs come from config, then Vault.
pub async fn resolve_services_with(
    config: &Config,
    env: impl Fn(&str) -> Option<String> + Send + Sync,
) -> Result<ResolvedServices, ConfigError> {
    let mut secrets: HashMap<&'static str, KvSecret> = HashMap::new();

    if let Some(vault) = vault_client(config, &env)? {
        for (name, section) in [("netbox", &config.netbox), ("zabbix", &config.zabbix)] {
            let needs_vault = section.url.is_none() || service_token(section, &env).is_none();
            if needs_vault {
                let path = section.vault_path.as_deref().unwrap_or(name);
                secrets.insert(name, vault.read_kv2(path).await?);
            }
        }
    }

    Ok(ResolvedServices {
        netbox: resolve_one("netbox", &config.netbox, secrets.get("netbox"), &env)?,
        zabbix: resolve_one("zabbix", &config.zabbix, secrets.get("zabbix"), &env)?,
    })
}

fn service_token(
    section: &ServiceSection,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    section
        .token_env
        .as_deref()
        .and_then(env)
        .map(SecretString::from)
}

fn resolve_one(
    service: &'static str,
    section: &ServiceSection,
    secret: Option<&KvSecret>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ServiceCredentials, ConfigError> {
    let url = match (&section.url, secret) {
        (Some(url), _) => url.clone(),
        (None, Some(secret)) => secret
            .get(&format!("{service}_url"))?
            .expose_secret()
            .to_owned(),
        (None, None) => {
            return Err(ConfigError::NoCredentials {
                service,
                what: "url",
            });
        }
    };

    // 1. token_env → env var lookup
    if let Some(token) = service_token(section, env) {
        return Ok(ServiceCredentials { url, token });
    }

    // 2. Vault
    let token_key = format!("{service}_token");
    if let Some(secret) = secret.filter(|s| s.contains(&token_key)) {
        return Ok(ServiceCredentials {
            url,
            token: secret.get(&token_key)?,
        });
    }

    // 3. Plaintext in config
    if let Some(ref token) = section.token {
        return Ok(ServiceCredentials {
            url,
            token: SecretString::from(token.clone()),
        });
    }

    Err(ConfigError::NoCredentials {
        service,
        what: "token",
    })
}

fn vault_client(
    config: &Config,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<VaultClient>, ConfigError> {
    if !config.vault.enabled {
        return Ok(None);
    }
    let url = config
        .vault
        .url
        .clone()
        .or_else(|| env("VAULT_URL"))
        .ok_or(ConfigError::NoCredentials {
            service: "vault",
            what: "url",
        })?;
    let token = config
        .vault
        .token_env
        .as_deref()
        .and_then(env)
        .or_else(|| env("VAULT_TOKEN"))
        .or_else(|| config.vault.token.clone())
        .ok_or(ConfigError::NoCredentials {
            service: "vault",
            what: "token",
        })?;

    let client = VaultClient::new(
        &url,
        &SecretString::from(token),
        &config.vault.mount_point,
        &config.transport(),
    )?;
    Ok(Some(client))
}
