use thiserror::Error;

/// Top-level error type for the `macrosync-api` crate.
///
/// Covers every failure mode across the four remote surfaces:
/// transport, NetBox REST, Zabbix JSON-RPC, Vault and the debug webhook.
/// `macrosync-core` maps these into reconciliation-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected (HTTP 401/403, or a JSON-RPC "not authorised" error).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Header value could not be encoded (e.g. a token with newlines).
    #[error("Invalid header value for {header}")]
    InvalidHeader { header: &'static str },

    // ── REST ────────────────────────────────────────────────────────
    /// Non-success status from a REST endpoint (NetBox, Vault, webhook).
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The requested object does not exist.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ── JSON-RPC ────────────────────────────────────────────────────
    /// Error object returned inside a Zabbix JSON-RPC envelope.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        code: i64,
        message: String,
        data: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A response parsed, but a field the caller needs is absent or has
    /// the wrong shape. `field` is a dotted path such as
    /// `custom_fields.zabbix_hostid`.
    #[error("Missing field: {field}")]
    MissingField { field: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Http { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Build a `Deserialization` error carrying a bounded body preview.
    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let preview = &body[..floor_char_boundary(&body, 200)];
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}

/// Largest index `<= max` that falls on a UTF-8 boundary of `s`.
pub(crate) fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
