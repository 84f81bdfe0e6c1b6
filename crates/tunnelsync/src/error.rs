//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use tunnelsync_config::ConfigError;
use tunnelsync_core::CoreError;

/// Process exit codes. Usage errors exit with 2 from clap itself.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
    pub const MALFORMED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Connection failed: {reason}")]
    #[diagnostic(
        code(tunnelsync::connection_failed),
        help(
            "Check that tunnelbroker.net is reachable and that the router accepts\n\
             SSH connections on the configured port with the netconf subsystem enabled."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tunnelsync::auth_failed),
        help(
            "Check tunnelbroker.username / tunnelbroker.password (or updateKey),\n\
             and junos.username / junos.keyfile / junos.passphrase."
        )
    )]
    AuthFailed { message: String },

    #[error("{operation} timed out after {seconds}s")]
    #[diagnostic(
        code(tunnelsync::timeout),
        help("Increase the limit with --timeout or `timeout` in tunnelsync.toml.")
    )]
    Timeout { operation: String, seconds: u64 },

    // ── Remote data ──────────────────────────────────────────────────
    #[error("The tunnel broker account has no tunnels")]
    #[diagnostic(
        code(tunnelsync::no_tunnel),
        help("Create a tunnel at tunnelbroker.net before running tunnelsync.")
    )]
    NoTunnel,

    #[error("{message}")]
    #[diagnostic(
        code(tunnelsync::router_interface),
        help(
            "Check junos.externalInterface and junos.tunnelInterface against\n\
             `show interfaces terse` on the router."
        )
    )]
    RouterInterface { message: String },

    #[error("Malformed response: {message}")]
    #[diagnostic(code(tunnelsync::malformed_response))]
    MalformedResponse { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(tunnelsync::api_error))]
    ApiError { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(tunnelsync::no_config),
        help(
            "Create tunnelsync.toml in one of: {searched}\n\
             or pass its directory with --config-dir."
        )
    )]
    NoConfig { searched: String },

    #[error("Invalid configuration: {field} {reason}")]
    #[diagnostic(code(tunnelsync::invalid_config))]
    InvalidConfig { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(tunnelsync::config))]
    Config(Box<figment::Error>),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NoTunnel | Self::RouterInterface { .. } | Self::MalformedResponse { .. } => {
                exit_code::MALFORMED
            }
            Self::NoConfig { .. } | Self::InvalidConfig { .. } | Self::Config(_) => {
                exit_code::CONFIG
            }
            Self::ApiError { .. } => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { searched } => CliError::NoConfig { searched },
            ConfigError::Validation { field, reason } => CliError::InvalidConfig { field, reason },
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout {
                operation,
                timeout_secs,
            } => CliError::Timeout {
                operation: operation.into(),
                seconds: timeout_secs,
            },

            CoreError::NoTunnel => CliError::NoTunnel,

            err @ (CoreError::InterfaceNotFound { .. }
            | CoreError::MissingField { .. }
            | CoreError::MalformedLinkAddress { .. }) => CliError::RouterInterface {
                message: err.to_string(),
            },

            CoreError::MalformedResponse { message } => CliError::MalformedResponse { message },

            CoreError::Api { message } => CliError::ApiError { message },

            // The completed steps are logged by the caller; the exit code
            // follows the step that failed.
            CoreError::Correction { source, .. } => CliError::from(*source),
        }
    }
}
