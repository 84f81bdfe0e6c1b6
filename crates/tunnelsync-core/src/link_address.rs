use crate::error::CoreError;
use crate::model::TunnelEndpoints;

/// Split a tunnel interface's `far:near` link-address.
///
/// Exactly one colon and two non-empty parts are required; the first part
/// is always the far side.
pub fn parse_link_address(interface: &str, value: &str) -> Result<TunnelEndpoints, CoreError> {
    let malformed = || CoreError::MalformedLinkAddress {
        interface: interface.to_owned(),
        value: value.to_owned(),
    };

    let mut parts = value.trim().split(':').map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(far), Some(near), None) if !far.is_empty() && !near.is_empty() => {
            Ok(TunnelEndpoints {
                near: near.to_owned(),
                far: far.to_owned(),
            })
        }
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn far_comes_first() {
        let endpoints = parse_link_address("ip-0/0/0.0", "216.66.22.2:203.0.113.9").unwrap();
        assert_eq!(endpoints.far, "216.66.22.2");
        assert_eq!(endpoints.near, "203.0.113.9");
    }

    #[test]
    fn order_is_never_swapped() {
        for (far, near) in [
            ("192.0.2.1", "198.51.100.2"),
            ("198.51.100.2", "192.0.2.1"),
            ("10.0.0.1", "10.0.0.1"),
        ] {
            let endpoints = parse_link_address("ip-0/0/0.0", &format!("{far}:{near}")).unwrap();
            assert_eq!((endpoints.far.as_str(), endpoints.near.as_str()), (far, near));
        }
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let endpoints = parse_link_address("ip-0/0/0.0", "\n216.66.22.2:203.0.113.9\n").unwrap();
        assert_eq!(endpoints.near, "203.0.113.9");
    }

    #[test]
    fn wrong_part_count_is_malformed() {
        for value in [
            "",
            "216.66.22.2",
            "216.66.22.2:203.0.113.9:41",
            "2001:db8::1",
            ":203.0.113.9",
            "216.66.22.2:",
        ] {
            match parse_link_address("ip-0/0/0.0", value) {
                Err(CoreError::MalformedLinkAddress { interface, value: got }) => {
                    assert_eq!(interface, "ip-0/0/0.0");
                    assert_eq!(got, value);
                }
                other => panic!("{value:?}: expected MalformedLinkAddress, got {other:?}"),
            }
        }
    }
}
