//! Configuration for tunnelsync.
//!
//! A single TOML file found on a search path, overlaid with `TUNNELSYNC_`
//! environment variables, and resolved into the explicit settings each
//! component takes: broker credentials, the router access descriptor, and
//! the two interface names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use tunnelsync_api::junos::DEFAULT_SSH_PORT;
use tunnelsync_api::{BrokerCredentials, JuniperDevice};
use tunnelsync_core::InterfaceNames;

pub const CONFIG_FILE: &str = "tunnelsync.toml";
pub const ENV_PREFIX: &str = "TUNNELSYNC_";

/// Env keys arrive in one case; these are restored to the file's spelling
/// so an override replaces the file value instead of sitting beside it.
const CAMEL_CASE_KEYS: &[&str] = &[
    "tunnelbroker.updateKey",
    "junos.externalInterface",
    "junos.tunnelInterface",
];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no tunnelsync.toml found (searched: {searched})")]
    NotFound { searched: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level file layout.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Seconds allowed for each remote operation.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    pub tunnelbroker: TunnelBrokerSettings,

    pub junos: JunosSettings,
}

fn default_timeout() -> u64 {
    30
}

/// `[tunnelbroker]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelBrokerSettings {
    pub username: String,

    pub password: String,

    /// Per-tunnel update key; the password is used when absent.
    #[serde(default)]
    pub update_key: Option<String>,
}

/// `[junos]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JunosSettings {
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    pub keyfile: PathBuf,

    #[serde(default)]
    pub passphrase: Option<String>,

    pub external_interface: String,

    pub tunnel_interface: String,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

// ── Config file path ────────────────────────────────────────────────

/// Directories searched for `tunnelsync.toml`, in priority order.
pub fn search_dirs(extra: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = extra {
        dirs.push(dir.to_path_buf());
    }
    dirs.push(PathBuf::from("."));
    if let Some(project) = ProjectDirs::from("net", "tunnelsync", "tunnelsync") {
        dirs.push(project.config_dir().to_path_buf());
    }
    dirs
}

/// First `tunnelsync.toml` that exists in `dirs`.
pub fn find_config_file(dirs: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    dirs.iter()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::NotFound {
            searched: dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

// ── Config loading ──────────────────────────────────────────────────

/// Find and load the config, with `extra_dir` searched first.
pub fn load_config(extra_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let path = find_config_file(&search_dirs(extra_dir))?;
    load_config_from(&path)
}

/// Load `path` overlaid with environment variables, then validate.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// `TUNNELSYNC_*` variables, `__` nesting, keys spelled as in the file.
fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX)
        .split("__")
        .map(|key| file_key(key.as_str()).into())
        .lowercase(false)
}

/// `JUNOS.TUNNELINTERFACE` → `junos.tunnelInterface`.
fn file_key(env_key: &str) -> String {
    let lower = env_key.to_ascii_lowercase();
    CAMEL_CASE_KEYS
        .iter()
        .find(|camel| camel.eq_ignore_ascii_case(&lower))
        .map_or(lower, |camel| (*camel).to_owned())
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("tunnelbroker.username", self.tunnelbroker.username.as_str()),
            ("tunnelbroker.password", self.tunnelbroker.password.as_str()),
            ("junos.hostname", self.junos.hostname.as_str()),
            ("junos.username", self.junos.username.as_str()),
            ("junos.externalInterface", self.junos.external_interface.as_str()),
            ("junos.tunnelInterface", self.junos.tunnel_interface.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Validation {
                field: (*field).into(),
                reason: "must not be empty".into(),
            });
        }
        if self.junos.keyfile.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                field: "junos.keyfile".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    /// Tunnel broker credentials, secrets wrapped.
    pub fn broker_credentials(&self) -> BrokerCredentials {
        BrokerCredentials {
            username: self.tunnelbroker.username.clone(),
            password: SecretString::from(self.tunnelbroker.password.clone()),
            update_key: self
                .tunnelbroker
                .update_key
                .clone()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        }
    }

    /// Router access descriptor.
    pub fn juniper_device(&self) -> JuniperDevice {
        JuniperDevice {
            hostname: self.junos.hostname.clone(),
            port: self.junos.port,
            username: self.junos.username.clone(),
            key_file: self.junos.keyfile.clone(),
            passphrase: self
                .junos
                .passphrase
                .clone()
                .filter(|p| !p.is_empty())
                .map(SecretString::from),
        }
    }

    pub fn interface_names(&self) -> InterfaceNames {
        InterfaceNames {
            external: self.junos.external_interface.clone(),
            tunnel: self.junos.tunnel_interface.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
