// ── Core error types ──
//
// Domain errors from tunnelsync-core. Consumers never see HTTP status
// codes, SSH errors, or XML parse failures directly; the
// `From<tunnelsync_api::Error>` impl translates them.

use thiserror::Error;

use crate::reconcile::Correction;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    // ── Malformed remote data ────────────────────────────────────────
    #[error("Tunnel broker account has no tunnels")]
    NoTunnel,

    #[error("Interface {interface} not found on router")]
    InterfaceNotFound { interface: String },

    #[error("Interface {interface} has no {field}")]
    MissingField {
        interface: String,
        field: &'static str,
    },

    #[error("Malformed link-address on {interface}: expected 'far:near', got '{value}'")]
    MalformedLinkAddress { interface: String, value: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api { message: String },

    // ── Corrective writes ────────────────────────────────────────────
    /// A correction failed. `completed` lists the corrections that were
    /// applied before it, in order.
    #[error("Correction failed: {source}")]
    Correction {
        completed: Vec<Correction>,
        #[source]
        source: Box<CoreError>,
    },
}

impl CoreError {
    /// Corrections known to have been applied before this error.
    pub fn completed_corrections(&self) -> &[Correction] {
        match self {
            Self::Correction { completed, .. } => completed,
            _ => &[],
        }
    }

    /// The underlying error, looking through a failed correction.
    pub fn root(&self) -> &CoreError {
        match self {
            Self::Correction { source, .. } => source.root(),
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tunnelsync_api::Error> for CoreError {
    fn from(err: tunnelsync_api::Error) -> Self {
        if err.is_auth_failure() {
            return CoreError::AuthenticationFailed {
                message: err.to_string(),
            };
        }
        // Operation and limit are filled in by `status::bounded`.
        if err.is_timeout() {
            return CoreError::Timeout {
                operation: "HTTP request",
                timeout_secs: 0,
            };
        }
        if err.is_connect() {
            return CoreError::ConnectionFailed {
                reason: err.to_string(),
            };
        }

        match err {
            tunnelsync_api::Error::Deserialization { message, .. } => {
                CoreError::MalformedResponse { message }
            }
            tunnelsync_api::Error::UnexpectedEof => CoreError::ConnectionFailed {
                reason: err.to_string(),
            },
            other => CoreError::Api {
                message: other.to_string(),
            },
        }
    }
}
