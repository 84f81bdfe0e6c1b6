// ── Remote system seams ──
//
// The status readers and the reconciler only talk to these two traits.
// The api crate's clients implement them here; tests substitute fakes.

use std::future::Future;

use tracing::debug;

use tunnelsync_api::{InterfaceInformation, JuniperDevice, Tunnel, TunnelBrokerClient, UpdateOutcome};

use crate::error::CoreError;

/// The tunnel broker's view of the account.
pub trait TunnelBroker {
    /// All tunnels registered on the account, in broker order.
    fn tunnels(&self) -> impl Future<Output = Result<Vec<Tunnel>, CoreError>> + Send;

    /// Record `address` as the tunnel's client endpoint.
    fn update_client_address(
        &self,
        tunnel_id: &str,
        address: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// The router's interface view and configuration.
pub trait Router {
    fn interface_information(
        &self,
    ) -> impl Future<Output = Result<InterfaceInformation, CoreError>> + Send;

    /// Set and commit `tunnel source` on `interface`.
    fn set_tunnel_source(
        &self,
        interface: &str,
        address: &str,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl TunnelBroker for TunnelBrokerClient {
    async fn tunnels(&self) -> Result<Vec<Tunnel>, CoreError> {
        Ok(self.tunnel_info().await?.tunnels)
    }

    async fn update_client_address(&self, tunnel_id: &str, address: &str) -> Result<(), CoreError> {
        match self.update_tunnel(tunnel_id, address).await? {
            UpdateOutcome::Updated => debug!(tunnel_id, address, "broker accepted new address"),
            UpdateOutcome::Unchanged => debug!(tunnel_id, address, "broker already had address"),
        }
        Ok(())
    }
}

impl Router for JuniperDevice {
    async fn interface_information(&self) -> Result<InterfaceInformation, CoreError> {
        Ok(JuniperDevice::interface_information(self).await?)
    }

    async fn set_tunnel_source(&self, interface: &str, address: &str) -> Result<(), CoreError> {
        Ok(JuniperDevice::set_tunnel_source(self, interface, address).await?)
    }
}
