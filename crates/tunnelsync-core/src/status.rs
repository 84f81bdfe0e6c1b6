// ── Status readers ──
//
// Two independent reads (broker, router) run concurrently in the calling
// task. Each returns its own value; `gather_status` merges them after the
// join. The first failure or timeout drops the other read.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::CoreError;
use crate::link_address::parse_link_address;
use crate::model::{InterfaceNames, ProviderStatus, ReconciliationStatus, RouterStatus, TunnelEndpoints};
use crate::remote::{Router, TunnelBroker};

/// Fetch the broker's record of the account's first tunnel.
///
/// Accounts with several tunnels are not supported; only the first one
/// the broker lists is considered.
pub async fn read_provider_status(broker: &impl TunnelBroker) -> Result<ProviderStatus, CoreError> {
    debug!("reading tunnel broker status");

    let tunnels = broker.tunnels().await?;
    debug!(tunnel_count = tunnels.len(), "tunnel broker status");

    let tunnel = tunnels.into_iter().next().ok_or(CoreError::NoTunnel)?;
    debug!(
        tunnel_id = %tunnel.id,
        client_v4 = %tunnel.client_v4,
        server_v4 = %tunnel.server_v4,
        "using first tunnel"
    );

    Ok(ProviderStatus {
        tunnel_id: tunnel.id,
        endpoints: TunnelEndpoints {
            near: tunnel.client_v4.trim().to_owned(),
            far: tunnel.server_v4.trim().to_owned(),
        },
    })
}

/// Read the external address and tunnel endpoints from the router.
pub async fn read_router_status(
    router: &impl Router,
    interfaces: &InterfaceNames,
) -> Result<RouterStatus, CoreError> {
    debug!(
        external_interface = %interfaces.external,
        tunnel_interface = %interfaces.tunnel,
        "reading interface config"
    );

    let information = router.interface_information().await?;

    let mut external_address = None;
    let mut endpoints = None;

    for logical in information.logical_interfaces() {
        trace!(
            name = logical.name(),
            address_families = logical.address_families.len(),
            "logical interface"
        );

        if logical.name() == interfaces.external {
            let address = logical.inet_address().ok_or_else(|| CoreError::MissingField {
                interface: interfaces.external.clone(),
                field: "inet address",
            })?;
            debug!(address, "external interface address");
            external_address = Some(address.to_owned());
        }

        if logical.name() == interfaces.tunnel {
            let link = logical.link_address().ok_or_else(|| CoreError::MissingField {
                interface: interfaces.tunnel.clone(),
                field: "link-address",
            })?;
            debug!(link_address = link, "tunnel interface link-address");
            endpoints = Some(parse_link_address(&interfaces.tunnel, link)?);
        }
    }

    Ok(RouterStatus {
        external_address: external_address.ok_or_else(|| CoreError::InterfaceNotFound {
            interface: interfaces.external.clone(),
        })?,
        endpoints: endpoints.ok_or_else(|| CoreError::InterfaceNotFound {
            interface: interfaces.tunnel.clone(),
        })?,
    })
}

/// Read both sides concurrently and merge them into one snapshot.
///
/// Each read is bounded by `limit`. Logs a warning when router and broker
/// disagree on the tunnel endpoints.
pub async fn gather_status(
    broker: &impl TunnelBroker,
    router: &impl Router,
    interfaces: &InterfaceNames,
    limit: Duration,
) -> Result<ReconciliationStatus, CoreError> {
    let (provider, router) = tokio::try_join!(
        bounded("tunnel broker status", limit, read_provider_status(broker)),
        bounded(
            "router interface status",
            limit,
            read_router_status(router, interfaces)
        ),
    )?;

    let status = ReconciliationStatus::merge(provider, router);
    status.warn_on_disagreement();
    debug!(?status, "status snapshot");
    Ok(status)
}

/// Run `fut`, failing with `CoreError::Timeout` once `limit` elapses.
///
/// A timeout raised inside `fut` (the HTTP client's own timer) is reported
/// the same way, under `operation` and `limit`.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, CoreError>>,
) -> Result<T, CoreError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Err(CoreError::Timeout { .. })) | Err(_) => Err(CoreError::Timeout {
            operation,
            timeout_secs: limit.as_secs(),
        }),
        Ok(result) => result,
    }
}
