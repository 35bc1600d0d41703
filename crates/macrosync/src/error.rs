//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use macrosync_config::ConfigError;
use macrosync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(macrosync::connection_failed),
        help("Check that the service is reachable. Reason: {reason}")
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(macrosync::timeout),
        help("Raise defaults.timeout in the config file or check service health.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(macrosync::auth_failed),
        help("Verify the NetBox and Zabbix API tokens (token_env, Vault secret, or token).")
    )]
    AuthFailed { message: String },

    #[error("No {what} configured for {service}")]
    #[diagnostic(
        code(macrosync::no_credentials),
        help(
            "Set {service}.{what} in the config file, point {service}.token_env at an\n\
             environment variable, or enable [vault] so it can be read from {service}_{what}."
        )
    )]
    NoCredentials {
        service: &'static str,
        what: &'static str,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {resource}")]
    #[diagnostic(code(macrosync::not_found))]
    NotFound { resource: String },

    #[error("Device data is missing '{field}'")]
    #[diagnostic(
        code(macrosync::missing_field),
        help("Check the device's custom fields and config context in NetBox.")
    )]
    MissingField { field: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(macrosync::api_error))]
    Api { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(macrosync::validation))]
    Validation { field: String, reason: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(macrosync::config),
        help("Expected at: {path}\nShow the effective settings with: macrosync config show")
    )]
    Config { message: String, path: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Server error: {0}")]
    #[diagnostic(code(macrosync::server))]
    Server(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(macrosync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound { resource } => CliError::NotFound { resource },
            CoreError::MissingField { field } => CliError::MissingField { field },
            CoreError::Validation { message } => CliError::Validation {
                field: "event".into(),
                reason: message,
            },
            CoreError::Apply { host_id, source } => CliError::Api {
                message: format!("write-back to host {host_id} failed: {source}"),
            },
            CoreError::Api { message, .. } => CliError::Api { message },
            CoreError::Internal(message) => CliError::Api {
                message: format!("internal: {message}"),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let path = macrosync_config::config_path().display().to_string();
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { service, what } => CliError::NoCredentials { service, what },
            ConfigError::Vault(api) => CoreError::from(api).into(),
            ConfigError::NotFound { path } => CliError::Config {
                message: "config file not found".into(),
                path: path.display().to_string(),
            },
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => CliError::Config {
                message: other.to_string(),
                path,
            },
        }
    }
}
