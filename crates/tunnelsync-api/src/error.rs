use thiserror::Error;

/// Top-level error type for the `tunnelsync-api` crate.
///
/// Covers every failure mode across both remote surfaces:
/// the tunnel broker's HTTP API and the router's NETCONF-over-SSH session.
/// `tunnelsync-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the tunnel broker.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The router refused the configured SSH key.
    #[error("SSH public key rejected for user '{username}'")]
    PublicKeyRejected { username: String },

    /// The private key file could not be read or decrypted.
    #[error("Failed to load SSH key {path}: {source}")]
    KeyLoad {
        path: String,
        #[source]
        source: russh_keys::Error,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// SSH connection or channel error.
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Tunnel broker ───────────────────────────────────────────────
    /// Non-success HTTP status from the tunnel broker.
    #[error("Tunnel broker API error (HTTP {status}): {message}")]
    TunnelBroker { status: u16, message: String },

    /// The update endpoint answered with something other than `good`/`nochg`.
    #[error("Tunnel broker rejected update: {message}")]
    UpdateRejected { message: String },

    // ── NETCONF ─────────────────────────────────────────────────────
    /// The router closed the stream mid-message.
    #[error("NETCONF session closed before end of message")]
    UnexpectedEof,

    /// One or more `<rpc-error>` elements with severity `error`.
    #[error("NETCONF RPC failed: {}", .messages.join("; "))]
    Rpc { messages: Vec<String> },

    // ── Data ────────────────────────────────────────────────────────
    /// XML deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote side rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::PublicKeyRejected { .. } | Self::KeyLoad { .. }
        )
    }

    /// Returns `true` if the failure happened before any request was answered.
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect(),
            Self::Ssh(russh::Error::IO(_) | russh::Error::Disconnect) | Self::Io(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if the HTTP client's own timeout fired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    pub(crate) fn deserialization(err: impl std::fmt::Display, body: &str) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    }
}
