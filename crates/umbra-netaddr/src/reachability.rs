//! Reachability scoring between address families
//!
//! When advertising our own addresses to a partner we rank which of
//! them the partner is most likely able to connect back to.

use crate::addr::NetAddress;
use crate::network::Network;

/// How well one of our addresses serves a given partner. Higher is
/// better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reachability {
    Unreachable,
    /// Reachable only in principle
    Default,
    Teredo,
    /// IPv6 behind a translation tunnel
    Ipv6Weak,
    Ipv4,
    /// Untunnelled IPv6
    Ipv6Strong,
    /// Same overlay network on both sides
    Private,
}

/// Family extended with the Teredo range, which routes differently
/// from the rest of IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtNetwork {
    Net(Network),
    Teredo,
    Unknown,
}

fn ext_network(addr: Option<&NetAddress>) -> ExtNetwork {
    match addr {
        None => ExtNetwork::Unknown,
        Some(addr) if addr.is_rfc4380() => ExtNetwork::Teredo,
        Some(addr) => ExtNetwork::Net(addr.network()),
    }
}

impl NetAddress {
    /// Ranks this address of ours for advertising to `partner`.
    /// `None` stands for a partner of unknown family.
    pub fn reachability_from(&self, partner: Option<&NetAddress>) -> Reachability {
        use ExtNetwork::{Net, Teredo, Unknown};
        use Network::{I2p, Ipv4, Ipv6, Tor, Unroutable};

        if !self.is_routable() {
            return Reachability::Unreachable;
        }

        let ours = ext_network(Some(self));
        let theirs = ext_network(partner);
        let tunnelled = self.is_rfc3964() || self.is_rfc6052() || self.is_rfc6145();

        match theirs {
            Net(Ipv4) => match ours {
                Net(Ipv4) => Reachability::Ipv4,
                _ => Reachability::Default,
            },
            Net(Ipv6) => match ours {
                Teredo => Reachability::Teredo,
                Net(Ipv4) => Reachability::Ipv4,
                Net(Ipv6) if tunnelled => Reachability::Ipv6Weak,
                Net(Ipv6) => Reachability::Ipv6Strong,
                _ => Reachability::Default,
            },
            Net(I2p) => match ours {
                Net(I2p) => Reachability::Private,
                // I2P peers cannot dial out of the overlay
                _ => Reachability::Unreachable,
            },
            Net(Tor) => match ours {
                Net(Ipv4) => Reachability::Ipv4,
                Net(Tor) => Reachability::Private,
                _ => Reachability::Default,
            },
            Teredo => match ours {
                Teredo => Reachability::Teredo,
                Net(Ipv6) => Reachability::Ipv6Weak,
                Net(Ipv4) => Reachability::Ipv4,
                _ => Reachability::Default,
            },
            Unknown | Net(Unroutable) => match ours {
                Teredo => Reachability::Teredo,
                Net(Ipv6) => Reachability::Ipv6Weak,
                Net(Ipv4) => Reachability::Ipv4,
                Net(Tor) | Net(I2p) => Reachability::Private,
                _ => Reachability::Default,
            },
        }
    }
}
