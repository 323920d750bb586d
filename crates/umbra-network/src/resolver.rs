//! Peer name resolution
//!
//! Overlay names never touch DNS: `.onion` decodes locally, `.i2p`
//! goes through the address book and then the SAM session. An overlay
//! name that fails there is a definitive failure, not a fallthrough
//! to DNS, otherwise a search domain could hijack hidden peers.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use umbra_netaddr::{i2p, split_host_port, Endpoint, I2pDestination, NetAddress};

use crate::error::{NetError, NetResult};
use crate::session::{AddressBook, EmptyAddressBook, NoSession, OverlaySession};

/// How long to wait on a blocking lookup task between cancellation
/// checks.
const LOOKUP_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Resolves peer names to addresses.
pub struct Resolver {
    address_book: Arc<dyn AddressBook>,
    session: Arc<dyn OverlaySession>,
    cancel: CancellationToken,
}

impl Resolver {
    pub fn new(
        address_book: Arc<dyn AddressBook>,
        session: Arc<dyn OverlaySession>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            address_book,
            session,
            cancel,
        }
    }

    /// Resolver without I2P collaborators, for tools and tests.
    pub fn without_overlay() -> Self {
        Self::new(
            Arc::new(EmptyAddressBook),
            Arc::new(NoSession),
            CancellationToken::new(),
        )
    }

    /// Resolves `host` (no port part) to plain addresses.
    /// `max_results` of 0 means unlimited.
    pub async fn lookup_host(
        &self,
        host: &str,
        max_results: usize,
        allow_lookup: bool,
    ) -> NetResult<Vec<NetAddress>> {
        if host.is_empty() {
            return Err(NetError::Resolution("empty host name".into()));
        }
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        self.lookup_intern(host, max_results, allow_lookup).await
    }

    /// Resolves `name`, which may carry a `:port` suffix, into
    /// endpoints. `default_port` fills in when none is given.
    pub async fn lookup(
        &self,
        name: &str,
        default_port: u16,
        allow_lookup: bool,
        max_results: usize,
    ) -> NetResult<Vec<Endpoint>> {
        if name.is_empty() {
            return Err(NetError::Resolution("empty host name".into()));
        }
        let (host, port) = split_host_port(name);
        let port = port.unwrap_or(default_port);
        let addrs = self.lookup_intern(&host, max_results, allow_lookup).await?;
        Ok(addrs
            .into_iter()
            .map(|addr| Endpoint::new(addr, port))
            .collect())
    }

    /// First endpoint for `name`.
    pub async fn lookup_one(
        &self,
        name: &str,
        default_port: u16,
        allow_lookup: bool,
    ) -> NetResult<Endpoint> {
        let mut endpoints = self.lookup(name, default_port, allow_lookup, 1).await?;
        endpoints
            .pop()
            .ok_or_else(|| NetError::Resolution(format!("no addresses for {name}")))
    }

    /// Strictly local parsing: numeric literals and self-describing
    /// overlay names, no DNS and no session lookups.
    pub async fn lookup_numeric(&self, name: &str, default_port: u16) -> NetResult<Endpoint> {
        self.lookup_one(name, default_port, false).await
    }

    async fn lookup_intern(
        &self,
        host: &str,
        max_results: usize,
        allow_lookup: bool,
    ) -> NetResult<Vec<NetAddress>> {
        if let Some(addr) = self.resolve_special(host, allow_lookup).await? {
            return Ok(vec![addr]);
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![NetAddress::from(ip)]);
        }
        if !allow_lookup {
            return Err(NetError::Resolution(format!("not a numeric address: {host}")));
        }
        self.dns_lookup(host, max_results).await
    }

    /// Handles names the overlay networks define. `Ok(None)` means the
    /// name is not special; errors are definitive and DNS must not see
    /// the name.
    async fn resolve_special(
        &self,
        host: &str,
        allow_lookup: bool,
    ) -> NetResult<Option<NetAddress>> {
        if host.len() > 6 && host.ends_with(".onion") {
            let addr = NetAddress::from_onion_name(host)?;
            return Ok(Some(addr));
        }
        if !i2p::is_i2p_host(host) {
            return Ok(None);
        }
        if let Ok(dest) = I2pDestination::from_base64(host) {
            return Ok(Some(NetAddress::from_i2p_destination(dest)));
        }
        if !allow_lookup {
            return Err(NetError::Resolution(format!(
                "I2P name lookup disabled: {host}"
            )));
        }
        if let Some(dest) = self.address_book.cached_destination(host) {
            debug!(host, "I2P name served from address book");
            return Ok(Some(NetAddress::from_i2p_destination(dest)));
        }
        // a SAM naming lookup can take a very long while, keep it off
        // the async runtime
        debug!(host, "querying I2P session for destination");
        let session = Arc::clone(&self.session);
        let name = host.to_string();
        let dest = self
            .run_blocking(move || session.name_lookup(&name))
            .await
            .map_err(|e| match e {
                NetError::Cancelled => NetError::Cancelled,
                other => NetError::Resolution(format!("I2P name lookup failed for {host}: {other}")),
            })?;
        Ok(Some(NetAddress::from_i2p_destination(dest)))
    }

    async fn dns_lookup(&self, host: &str, max_results: usize) -> NetResult<Vec<NetAddress>> {
        debug!(host, "resolving through DNS");
        let name = host.to_string();
        let resolved = self
            .run_blocking(move || {
                (name.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|addrs| addrs.collect::<Vec<_>>())
            })
            .await?;

        let mut out = Vec::new();
        for sock in resolved {
            out.push(NetAddress::from(sock.ip()));
            if max_results > 0 && out.len() >= max_results {
                break;
            }
        }
        if out.is_empty() {
            return Err(NetError::Resolution(format!("no addresses for {host}")));
        }
        debug!(host, count = out.len(), "resolved");
        Ok(out)
    }

    /// Runs a blocking lookup off the runtime, waking periodically to
    /// honor shutdown.
    async fn run_blocking<T, F>(&self, task: F) -> NetResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> io::Result<T> + Send + 'static,
    {
        let mut handle = tokio::task::spawn_blocking(task);
        loop {
            if self.cancel.is_cancelled() {
                handle.abort();
                return Err(NetError::Cancelled);
            }
            match tokio::time::timeout(LOOKUP_POLL_INTERVAL, &mut handle).await {
                Ok(Ok(result)) => return Ok(result?),
                Ok(Err(join)) => {
                    return Err(NetError::Resolution(format!("lookup task failed: {join}")))
                }
                Err(_elapsed) => continue,
            }
        }
    }
}
