// Tunnel broker response models
//
// `tunnelInfo.php` answers with a flat XML document: one `<tunnel>`
// element per registered tunnel, its id carried as an attribute.

use serde::Deserialize;

use crate::error::Error;

/// Parsed `tunnelInfo.php` response.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TunnelInfo {
    #[serde(rename = "tunnel", default)]
    pub tunnels: Vec<Tunnel>,
}

impl TunnelInfo {
    pub fn from_xml(body: &str) -> Result<Self, Error> {
        quick_xml::de::from_str(body).map_err(|e| Error::deserialization(e, body))
    }
}

/// A single registered 6in4 tunnel.
///
/// `client_v4` is the near side (our router), `server_v4` the broker's
/// tunnel server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Tunnel {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "serverv4")]
    pub server_v4: String,
    #[serde(rename = "clientv4")]
    pub client_v4: String,
    #[serde(rename = "serverv6", default)]
    pub server_v6: Option<String>,
    #[serde(rename = "clientv6", default)]
    pub client_v6: Option<String>,
    #[serde(default)]
    pub routed64: Option<String>,
    #[serde(default)]
    pub routed48: Option<String>,
}

/// Result of a successful `nic/update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// `good`: the client endpoint was changed.
    Updated,
    /// `nochg`: the broker already had this address.
    Unchanged,
}

impl UpdateOutcome {
    /// Interpret the dyndns-style plain-text body of `nic/update`.
    pub fn from_body(body: &str) -> Result<Self, Error> {
        let body = body.trim();
        match body.split_whitespace().next().unwrap_or_default() {
            "good" => Ok(Self::Updated),
            "nochg" => Ok(Self::Unchanged),
            "badauth" => Err(Error::Authentication {
                message: "tunnel broker rejected the update credentials".into(),
            }),
            _ => Err(Error::UpdateRejected {
                message: body.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_tunnel_info() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<tunnels>
  <tunnel id="123456">
    <description>home</description>
    <serverv4>216.66.22.2</serverv4>
    <clientv4>198.51.100.7</clientv4>
    <serverv6>2001:470:1f0a:1::1/64</serverv6>
    <clientv6>2001:470:1f0a:1::2/64</clientv6>
    <routed64>2001:470:1f0b:1::/64</routed64>
  </tunnel>
</tunnels>"#;

        let info = TunnelInfo::from_xml(body).unwrap();
        assert_eq!(info.tunnels.len(), 1);
        let tunnel = &info.tunnels[0];
        assert_eq!(tunnel.id, "123456");
        assert_eq!(tunnel.server_v4, "216.66.22.2");
        assert_eq!(tunnel.client_v4, "198.51.100.7");
        assert_eq!(tunnel.routed64.as_deref(), Some("2001:470:1f0b:1::/64"));
        assert_eq!(tunnel.routed48, None);
    }

    #[test]
    fn parses_empty_tunnel_list() {
        let info = TunnelInfo::from_xml("<tunnels></tunnels>").unwrap();
        assert!(info.tunnels.is_empty());
    }

    #[test]
    fn rejects_garbage() {
        let result = TunnelInfo::from_xml("<tunnels><tunnel>");
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn update_outcomes() {
        assert_eq!(
            UpdateOutcome::from_body("good 203.0.113.9\n").unwrap(),
            UpdateOutcome::Updated
        );
        assert_eq!(
            UpdateOutcome::from_body("nochg 203.0.113.9").unwrap(),
            UpdateOutcome::Unchanged
        );
        assert!(matches!(
            UpdateOutcome::from_body("badauth"),
            Err(Error::Authentication { .. })
        ));
        match UpdateOutcome::from_body("abuse") {
            Err(Error::UpdateRejected { message }) => assert_eq!(message, "abuse"),
            other => panic!("expected UpdateRejected, got {other:?}"),
        }
    }
}
