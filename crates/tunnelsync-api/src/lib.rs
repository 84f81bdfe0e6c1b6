// tunnelsync-api: async clients for the tunnel broker HTTP API and Junos NETCONF

pub mod error;
pub mod junos;
pub mod transport;
pub mod tunnelbroker;

pub use error::Error;
pub use junos::{InterfaceInformation, JuniperDevice, JunosSession, LogicalInterface};
pub use transport::TransportConfig;
pub use tunnelbroker::{BrokerCredentials, Tunnel, TunnelBrokerClient, TunnelInfo, UpdateOutcome};
