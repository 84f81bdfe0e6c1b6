// Junos interface view models
//
// Deserialized from the `<get-interface-information/>` reply. Junos pads
// element text with newlines, so accessors trim before handing values out.

use serde::Deserialize;

use crate::error::Error;

#[derive(Deserialize)]
struct InterfaceReply {
    #[serde(rename = "interface-information")]
    information: InterfaceInformation,
}

/// `<interface-information>`: every physical interface on the router.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceInformation {
    #[serde(rename = "physical-interface", default)]
    pub physical_interfaces: Vec<PhysicalInterface>,
}

impl InterfaceInformation {
    /// Parse a full `<rpc-reply>` to `<get-interface-information/>`.
    pub fn from_reply(reply: &str) -> Result<Self, Error> {
        let parsed: InterfaceReply =
            quick_xml::de::from_str(reply).map_err(|e| Error::deserialization(e, reply))?;
        Ok(parsed.information)
    }

    /// All logical interfaces, flattened across physical interfaces.
    pub fn logical_interfaces(&self) -> impl Iterator<Item = &LogicalInterface> {
        self.physical_interfaces
            .iter()
            .flat_map(|p| p.logical_interfaces.iter())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhysicalInterface {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "logical-interface", default)]
    pub logical_interfaces: Vec<LogicalInterface>,
}

/// A unit such as `ge-0/0/0.0` or `ip-0/0/0.0`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogicalInterface {
    #[serde(default)]
    name: String,
    #[serde(rename = "link-address", default)]
    link_address: Option<String>,
    #[serde(rename = "address-family", default)]
    pub address_families: Vec<AddressFamily>,
}

impl LogicalInterface {
    pub fn name(&self) -> &str {
        self.name.trim()
    }

    /// The raw link-address field (for tunnels, `far:near`).
    pub fn link_address(&self) -> Option<&str> {
        self.link_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// First local address of the `inet` family, without its prefix length.
    pub fn inet_address(&self) -> Option<&str> {
        self.address_families
            .iter()
            .filter(|af| af.name() == "inet")
            .flat_map(|af| af.addresses.iter())
            .find_map(InterfaceAddress::local)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressFamily {
    #[serde(rename = "address-family-name", default)]
    name: String,
    #[serde(rename = "interface-address", default)]
    pub addresses: Vec<InterfaceAddress>,
}

impl AddressFamily {
    pub fn name(&self) -> &str {
        self.name.trim()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceAddress {
    #[serde(rename = "ifa-local", default)]
    local: Option<String>,
}

impl InterfaceAddress {
    pub fn local(&self) -> Option<&str> {
        let local = self.local.as_deref()?.trim();
        let address = local.split_once('/').map_or(local, |(addr, _)| addr);
        (!address.is_empty()).then_some(address)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    const REPLY: &str = r#"<rpc-reply xmlns:junos="http://xml.juniper.net/junos/18.4R1/junos">
<interface-information xmlns="http://xml.juniper.net/junos/18.4R1/junos-interface" junos:style="normal">
<physical-interface>
<name>
ge-0/0/0
</name>
<logical-interface>
<name>
ge-0/0/0.0
</name>
<address-family>
<address-family-name>
inet
</address-family-name>
<interface-address>
<ifa-destination>
203.0.113.0/24
</ifa-destination>
<ifa-local>
203.0.113.9
</ifa-local>
</interface-address>
</address-family>
</logical-interface>
</physical-interface>
<physical-interface>
<name>
ip-0/0/0
</name>
<logical-interface>
<name>
ip-0/0/0.0
</name>
<link-address junos:format="IP-Header">
216.66.22.2:203.0.113.9
</link-address>
<address-family>
<address-family-name>
inet6
</address-family-name>
<interface-address>
<ifa-local>
2001:470:1f0a:1::2/64
</ifa-local>
</interface-address>
</address-family>
</logical-interface>
</physical-interface>
</interface-information>
</rpc-reply>"#;

    #[test]
    fn parses_interface_view() {
        let info = InterfaceInformation::from_reply(REPLY).unwrap();
        let names: Vec<&str> = info.logical_interfaces().map(LogicalInterface::name).collect();
        assert_eq!(names, vec!["ge-0/0/0.0", "ip-0/0/0.0"]);
    }

    #[test]
    fn external_interface_inet_address() {
        let info = InterfaceInformation::from_reply(REPLY).unwrap();
        let external = info
            .logical_interfaces()
            .find(|l| l.name() == "ge-0/0/0.0")
            .unwrap();
        assert_eq!(external.inet_address(), Some("203.0.113.9"));
        assert_eq!(external.link_address(), None);
    }

    #[test]
    fn tunnel_interface_link_address() {
        let info = InterfaceInformation::from_reply(REPLY).unwrap();
        let tunnel = info
            .logical_interfaces()
            .find(|l| l.name() == "ip-0/0/0.0")
            .unwrap();
        assert_eq!(tunnel.link_address(), Some("216.66.22.2:203.0.113.9"));
        // inet6 only: no IPv4 address on the tunnel unit
        assert_eq!(tunnel.inet_address(), None);
    }

    #[test]
    fn prefix_length_is_stripped() {
        let address = InterfaceAddress {
            local: Some("198.51.100.1/30".into()),
        };
        assert_eq!(address.local(), Some("198.51.100.1"));
    }
}
