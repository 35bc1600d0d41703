// ── Core error types ──
//
// Reconciliation-level errors. Consumers never see HTTP status codes or
// JSON-RPC envelopes directly; the `From<macrosync_api::Error>` impl
// translates transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Client errors ────────────────────────────────────────────────
    /// Malformed or incomplete inbound event. Raised before any side effect.
    #[error("Invalid event payload: {message}")]
    Validation { message: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// A collaborator response lacked a field the pipeline needs.
    #[error("Missing field: {field}")]
    MissingField { field: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        code: Option<i64>,
        status: Option<u16>,
    },

    // ── Write-back ───────────────────────────────────────────────────
    /// The full-replace macro write was rejected or could not be sent.
    #[error("Macro write-back to host {host_id} failed: {source}")]
    Apply {
        host_id: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for errors caused by the caller's payload (HTTP 400 class).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<macrosync_api::Error> for CoreError {
    fn from(err: macrosync_api::Error) -> Self {
        use macrosync_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Internal(format!("Invalid URL: {e}")),
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::InvalidHeader { header } => {
                CoreError::Internal(format!("invalid {header} header value"))
            }
            ApiError::Http { status, message } => CoreError::Api {
                message,
                code: None,
                status: Some(status),
            },
            ApiError::NotFound { resource } => CoreError::NotFound { resource },
            ApiError::JsonRpc {
                code,
                message,
                data,
            } => CoreError::Api {
                message: match data {
                    Some(data) if !data.is_empty() => format!("{message} {data}"),
                    _ => message,
                },
                code: Some(code),
                status: None,
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            ApiError::MissingField { field } => CoreError::MissingField { field },
        }
    }
}
