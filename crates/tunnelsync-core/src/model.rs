// ── Domain model ──
//
// Each reader produces its own status value; the coordinator merges them
// into a `ReconciliationStatus` once both reads have completed.

use tracing::warn;

/// The two endpoints of a tunnel as one side records them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TunnelEndpoints {
    /// Local (client) endpoint.
    pub near: String,
    /// Remote (server) endpoint.
    pub far: String,
}

/// What the tunnel broker has on record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub tunnel_id: String,
    pub endpoints: TunnelEndpoints,
}

/// What the router reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterStatus {
    /// IPv4 address of the external interface.
    pub external_address: String,
    /// Endpoints parsed from the tunnel interface's link-address.
    pub endpoints: TunnelEndpoints,
}

/// The snapshot compared on each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationStatus {
    pub external_address: String,
    pub provider: TunnelEndpoints,
    pub provider_tunnel_id: String,
    pub router: TunnelEndpoints,
}

impl ReconciliationStatus {
    pub fn merge(provider: ProviderStatus, router: RouterStatus) -> Self {
        Self {
            external_address: router.external_address,
            provider: provider.endpoints,
            provider_tunnel_id: provider.tunnel_id,
            router: router.endpoints,
        }
    }

    /// Router and broker record the same tunnel endpoints.
    pub fn endpoints_agree(&self) -> bool {
        self.router == self.provider
    }

    /// Log a warning when router and broker disagree on the tunnel
    /// endpoints, independent of the external address.
    pub fn warn_on_disagreement(&self) {
        if !self.endpoints_agree() {
            warn!(
                provider_near = %self.provider.near,
                provider_far = %self.provider.far,
                router_near = %self.router.near,
                router_far = %self.router.far,
                external_address = %self.external_address,
                "status does not agree"
            );
        }
    }
}

/// Names of the two logical interfaces read from the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceNames {
    pub external: String,
    pub tunnel: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::Level;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// Log sink shared between the subscriber and the assertion.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_warnings(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.contents()
    }

    fn status(provider_near: &str, router_near: &str) -> ReconciliationStatus {
        ReconciliationStatus {
            external_address: "203.0.113.9".into(),
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

    #[test]
    fn disagreement_is_logged_with_both_values() {
        let status = status("203.0.113.5", "203.0.113.1");
        assert!(!status.endpoints_agree());

        let logs = capture_warnings(|| status.warn_on_disagreement());
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("status does not agree"), "{logs}");
        assert!(logs.contains("provider_near=203.0.113.5"), "{logs}");
        assert!(logs.contains("router_near=203.0.113.1"), "{logs}");
    }

    #[test]
    fn agreement_is_silent() {
        let status = status("203.0.113.5", "203.0.113.5");
        assert!(status.endpoints_agree());

        let logs = capture_warnings(|| status.warn_on_disagreement());
        assert!(logs.is_empty(), "{logs}");
    }
}
