// ── Reconciler ──
//
// Compares the router's external address with the broker's client
// endpoint and the router's own tunnel source, then issues the
// corrections that differ. Corrections run one after another, broker
// first; each is idempotent, so a partial run is finished by the next one.

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::error::CoreError;
use crate::model::ReconciliationStatus;
use crate::remote::{Router, TunnelBroker};
use crate::status::bounded;

/// One corrective write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Set the broker's client address to the external address.
    TunnelBrokerClientAddress,
    /// Set the router's tunnel source to the external address.
    RouterTunnelSource,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TunnelBrokerClientAddress => f.write_str("tunnel broker client address"),
            Self::RouterTunnelSource => f.write_str("router tunnel source"),
        }
    }
}

/// What happened to one side during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    /// Already matched the external address.
    #[default]
    Unchanged,
    /// Differed, but this was a dry run.
    Planned,
    /// Differed and was corrected.
    Applied,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub tunnel_broker: Action,
    pub router: Action,
}

impl ReconcileReport {
    fn record(&mut self, correction: Correction, action: Action) {
        match correction {
            Correction::TunnelBrokerClientAddress => self.tunnel_broker = action,
            Correction::RouterTunnelSource => self.router = action,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.tunnel_broker == Action::Unchanged && self.router == Action::Unchanged
    }
}

/// Corrections needed to bring both sides in line with the external address.
pub fn plan(status: &ReconciliationStatus) -> Vec<Correction> {
    let mut corrections = Vec::new();
    if status.provider.near != status.external_address {
        corrections.push(Correction::TunnelBrokerClientAddress);
    }
    if status.router.near != status.external_address {
        corrections.push(Correction::RouterTunnelSource);
    }
    corrections
}

pub struct Reconciler<'a, B, R> {
    broker: &'a B,
    router: &'a R,
    tunnel_interface: &'a str,
    limit: Duration,
    dry_run: bool,
}

impl<'a, B: TunnelBroker, R: Router> Reconciler<'a, B, R> {
    pub fn new(broker: &'a B, router: &'a R, tunnel_interface: &'a str, limit: Duration) -> Self {
        Self {
            broker,
            router,
            tunnel_interface,
            limit,
            dry_run: false,
        }
    }

    /// Log planned corrections instead of issuing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply every correction `status` calls for.
    ///
    /// On failure the error is `CoreError::Correction`, listing the
    /// corrections that were applied before it.
    pub async fn reconcile(
        &self,
        status: &ReconciliationStatus,
    ) -> Result<ReconcileReport, CoreError> {
        let mut report = ReconcileReport::default();
        let mut completed = Vec::new();

        for correction in plan(status) {
            if self.dry_run {
                info!(
                    %correction,
                    address = %status.external_address,
                    "dry run: would correct"
                );
                report.record(correction, Action::Planned);
                continue;
            }

            if let Err(source) = self.apply(correction, status).await {
                return Err(CoreError::Correction {
                    completed,
                    source: Box::new(source),
                });
            }
            info!(%correction, address = %status.external_address, "correction applied");
            completed.push(correction);
            report.record(correction, Action::Applied);
        }

        Ok(report)
    }

    async fn apply(
        &self,
        correction: Correction,
        status: &ReconciliationStatus,
    ) -> Result<(), CoreError> {
        let address = status.external_address.as_str();
        match correction {
            Correction::TunnelBrokerClientAddress => {
                info!(
                    tunnel_id = %status.provider_tunnel_id,
                    from = %status.provider.near,
                    to = address,
                    "setting tunnel broker client address"
                );
                bounded(
                    "tunnel broker update",
                    self.limit,
                    self.broker
                        .update_client_address(&status.provider_tunnel_id, address),
                )
                .await
            }
            Correction::RouterTunnelSource => {
                info!(
                    interface = self.tunnel_interface,
                    from = %status.router.near,
                    to = address,
                    "setting router tunnel source"
                );
                bounded(
                    "router configuration",
                    self.limit,
                    self.router.set_tunnel_source(self.tunnel_interface, address),
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::TunnelEndpoints;
    use crate::remote::fakes::{FakeBroker, FakeRouter};

    const LIMIT: Duration = Duration::from_secs(5);
    const TUNNEL: &str = "ip-0/0/0.0";

    fn status(external: &str, provider_near: &str, router_near: &str) -> ReconciliationStatus {
        ReconciliationStatus {
            external_address: external.into(),
            provider: TunnelEndpoints {
                near: provider_near.into(),
                far: "216.66.22.2".into(),
            },
            provider_tunnel_id: "1001".into(),
            router: TunnelEndpoints {
                near: router_near.into(),
                far: "216.66.22.2".into(),
            },
        }
    }

    fn fakes() -> (FakeBroker, FakeRouter) {
        (FakeBroker::default(), FakeRouter::default())
    }

    #[tokio::test]
    async fn matching_addresses_issue_no_calls() {
        let (broker, router) = fakes();
        let status = status("203.0.113.9", "203.0.113.9", "203.0.113.9");

        let report = Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .reconcile(&status)
            .await
            .unwrap();

        assert!(report.is_noop());
        assert!(broker.updates().is_empty());
        assert!(router.writes().is_empty());
    }

    #[tokio::test]
    async fn stale_broker_gets_exactly_one_update() {
        let (broker, router) = fakes();
        let status = status("203.0.113.9", "203.0.113.5", "203.0.113.9");

        let report = Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .reconcile(&status)
            .await
            .unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                tunnel_broker: Action::Applied,
                router: Action::Unchanged,
            }
        );
        assert_eq!(
            broker.updates(),
            vec![("1001".to_string(), "203.0.113.9".to_string())]
        );
        assert!(router.writes().is_empty());
    }

    #[tokio::test]
    async fn stale_router_gets_exactly_one_write() {
        let (broker, router) = fakes();
        let status = status("203.0.113.9", "203.0.113.9", "203.0.113.1");

        let report = Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .reconcile(&status)
            .await
            .unwrap();

        assert_eq!(report.router, Action::Applied);
        assert!(broker.updates().is_empty());
        assert_eq!(
            router.writes(),
            vec![(TUNNEL.to_string(), "203.0.113.9".to_string())]
        );
    }

    #[tokio::test]
    async fn both_stale_correct_both() {
        let (broker, router) = fakes();
        let status = status("203.0.113.9", "203.0.113.5", "203.0.113.5");

        Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .reconcile(&status)
            .await
            .unwrap();

        assert_eq!(broker.updates().len(), 1);
        assert_eq!(router.writes().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_issues_nothing() {
        let (broker, router) = fakes();
        let status = status("203.0.113.9", "203.0.113.5", "203.0.113.1");

        let report = Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .dry_run(true)
            .reconcile(&status)
            .await
            .unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                tunnel_broker: Action::Planned,
                router: Action::Planned,
            }
        );
        assert!(broker.updates().is_empty());
        assert!(router.writes().is_empty());
    }

    #[tokio::test]
    async fn router_failure_reports_completed_broker_update() {
        let broker = FakeBroker::default();
        let router = FakeRouter {
            fail_write: true,
            ..FakeRouter::default()
        };
        let status = status("203.0.113.9", "203.0.113.5", "203.0.113.1");

        let err = Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .reconcile(&status)
            .await
            .unwrap_err();

        assert_eq!(
            err.completed_corrections(),
            &[Correction::TunnelBrokerClientAddress]
        );
        assert!(matches!(err.root(), CoreError::Api { .. }));
        assert_eq!(broker.updates().len(), 1);
    }

    #[tokio::test]
    async fn broker_failure_stops_before_router() {
        let broker = FakeBroker {
            fail_update: true,
            ..FakeBroker::default()
        };
        let router = FakeRouter::default();
        let status = status("203.0.113.9", "203.0.113.5", "203.0.113.1");

        let err = Reconciler::new(&broker, &router, TUNNEL, LIMIT)
            .reconcile(&status)
            .await
            .unwrap_err();

        assert!(err.completed_corrections().is_empty());
        assert!(router.writes().is_empty());
    }

    #[test]
    fn plan_orders_broker_first() {
        let status = status("203.0.113.9", "203.0.113.5", "203.0.113.1");
        assert_eq!(
            plan(&status),
            vec![
                Correction::TunnelBrokerClientAddress,
                Correction::RouterTunnelSource
            ]
        );
    }
}
