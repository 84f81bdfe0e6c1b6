// Hurricane Electric tunnel broker API

pub mod client;
pub mod models;

pub use client::{BrokerCredentials, DEFAULT_INFO_URL, DEFAULT_UPDATE_URL, TunnelBrokerClient};
pub use models::{Tunnel, TunnelInfo, UpdateOutcome};
