//! Property tests for host classification and host:port parsing.

use std::net::{Ipv4Addr, Ipv6Addr};

use proptest::prelude::*;
use sipkit_sip_core::types::{Host, HostKind, HostPort};

proptest! {
    #[test]
    fn prop_ipv4_literals_classify_as_ipv4(octets in any::<[u8; 4]>()) {
        let addr = Ipv4Addr::from(octets);
        let host = Host::new(&addr.to_string()).unwrap();
        prop_assert_eq!(host.kind(), HostKind::Ipv4);
        prop_assert_eq!(host.ip_addr(), Some(addr.into()));
    }

    #[test]
    fn prop_ipv6_literals_classify_as_ipv6(segments in any::<[u16; 8]>()) {
        let addr = Ipv6Addr::from(segments);
        for text in [addr.to_string(), format!("[{}]", addr)] {
            let host = Host::new(&text).unwrap();
            prop_assert_eq!(host.kind(), HostKind::Ipv6);
            prop_assert_eq!(host.ip_addr(), Some(addr.into()));
            prop_assert_eq!(host.to_string(), format!("[{}]", addr));
        }
    }

    #[test]
    fn prop_hostnames_classify_as_hostname(name in "[a-z][a-z0-9]{0,8}(\\.[a-z][a-z0-9-]{0,8}[a-z0-9]){0,3}") {
        let host = Host::new(&name).unwrap();
        prop_assert!(host.is_hostname());
        prop_assert_eq!(host.as_str(), name.as_str());
    }

    #[test]
    fn prop_host_port_renders_what_it_parsed(octets in any::<[u8; 4]>(), port in 1u16..=u16::MAX) {
        let text = format!("{}:{}", Ipv4Addr::from(octets), port);
        let hp: HostPort = text.parse().unwrap();
        prop_assert_eq!(hp.port, Some(port));
        prop_assert_eq!(hp.to_string(), text);
    }
}

#[test]
fn test_invalid_hosts_are_rejected() {
    for text in ["", "-bad.com", "bad-.com", "256.1.1.1x", "a..b", "host name", "[::1"] {
        assert!(Host::new(text).is_err(), "{} should be rejected", text);
    }
}

#[test]
fn test_out_of_range_octets_are_not_ipv4() {
    let host = Host::new("256.1.1.1");
    assert!(host.map(|h| h.kind() != HostKind::Ipv4).unwrap_or(true));
}
