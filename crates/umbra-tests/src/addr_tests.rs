//! Address classification across the supported families.

use std::collections::HashSet;

use umbra_netaddr::{Endpoint, NetAddress, Network};

/// Family and routability for a spread of well-known addresses.
#[test]
fn test_classification_samples() {
    let cases: &[(&str, Network, bool)] = &[
        ("250.47.183.9", Network::Ipv4, true),
        // RFC1918 space stays routable: peers behind NAT gossip it
        ("10.0.0.1", Network::Ipv4, true),
        ("192.168.1.5", Network::Ipv4, true),
        ("169.254.1.1", Network::Unroutable, false),
        ("127.0.0.1", Network::Unroutable, false),
        ("0.0.0.0", Network::Unroutable, false),
        ("2001:4860:4860::8888", Network::Ipv6, true),
        ("2001:db8::1", Network::Unroutable, false),
        ("fe80::1", Network::Unroutable, false),
        ("::1", Network::Unroutable, false),
        // OnionCat encapsulation reads as a Tor peer
        ("fd87:d87e:eb43:edb1:8e4:3588:e546:35ca", Network::Tor, true),
        // a GarlicCat slot with no destination attached is unusable
        ("fd60:db4d:ddb5::1", Network::Unroutable, false),
        // other RFC4193 space is plain unroutable
        ("fd42:1:2:3::1", Network::Unroutable, false),
    ];
    for &(input, network, routable) in cases {
        let addr: NetAddress = input.parse().unwrap();
        assert_eq!(addr.network(), network, "{input}");
        assert_eq!(addr.is_routable(), routable, "{input}");
    }
}

#[test]
fn test_onion_name_survives_parsing_and_display() {
    let addr: NetAddress = "expyuzz4wqqyqhjn.onion".parse().unwrap();
    assert_eq!(addr.network(), Network::Tor);
    assert_eq!(addr.to_string(), "expyuzz4wqqyqhjn.onion");
}

#[test]
fn test_endpoint_display_round_trips() {
    for input in [
        "1.2.3.4:8333",
        "[2001:db8::1]:8333",
        "expyuzz4wqqyqhjn.onion:9030",
    ] {
        let ep: Endpoint = input.parse().unwrap();
        assert_eq!(ep.to_string(), input);
        assert_eq!(input.parse::<Endpoint>().unwrap(), ep);
    }
}

/// Peers in one /16 share a bucket, peers elsewhere do not.
#[test]
fn test_groups_partition_ipv4_space() {
    let a: NetAddress = "1.2.3.4".parse().unwrap();
    let b: NetAddress = "1.2.200.200".parse().unwrap();
    let c: NetAddress = "1.3.3.4".parse().unwrap();
    assert_eq!(a.group(), b.group());
    assert_ne!(a.group(), c.group());
}

#[test]
fn test_groups_keep_families_apart() {
    let addrs: &[&str] = &[
        "8.8.8.8",
        "2001:4860:4860::8888",
        "expyuzz4wqqyqhjn.onion",
        "127.0.0.1",
    ];
    let groups: HashSet<Vec<u8>> = addrs
        .iter()
        .map(|s| s.parse::<NetAddress>().unwrap().group())
        .collect();
    assert_eq!(groups.len(), addrs.len());
}

#[test]
fn test_reachability_ranks_sources_for_a_tor_partner() {
    let onion: NetAddress = "expyuzz4wqqyqhjn.onion".parse().unwrap();
    let v4: NetAddress = "8.8.8.8".parse().unwrap();
    let local: NetAddress = "127.0.0.1".parse().unwrap();

    let from_onion = onion.reachability_from(Some(&onion));
    let from_v4 = v4.reachability_from(Some(&onion));
    let from_local = local.reachability_from(Some(&onion));
    assert!(from_onion > from_v4, "onion peers should prefer onion sources");
    assert!(from_v4 > from_local);
}
