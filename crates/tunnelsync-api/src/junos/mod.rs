// Junos router access: NETCONF over the SSH `netconf` subsystem

pub mod models;
pub mod netconf;
pub mod session;

pub use models::{AddressFamily, InterfaceAddress, InterfaceInformation, LogicalInterface};
pub use session::{DEFAULT_SSH_PORT, JuniperDevice, JunosSession, NetconfStream};
