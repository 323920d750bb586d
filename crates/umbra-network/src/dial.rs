//! Outbound connection establishment
//!
//! The dialer picks direct TCP, a per-family SOCKS5 proxy, or the I2P
//! session, based on the target's family and the proxy registry.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use umbra_netaddr::{split_host_port, Endpoint, I2pDestination, NetAddress};

use crate::config::NetContext;
use crate::error::{NetError, NetResult};
use crate::proxy::ProxyRegistry;
use crate::resolver::Resolver;
use crate::session::OverlaySession;
use crate::socks5::socks5_handshake;

/// Establishes outbound connections.
pub struct Dialer {
    ctx: NetContext,
    registry: Arc<ProxyRegistry>,
    session: Arc<dyn OverlaySession>,
    resolver: Resolver,
}

impl Dialer {
    pub fn new(
        ctx: NetContext,
        registry: Arc<ProxyRegistry>,
        session: Arc<dyn OverlaySession>,
        resolver: Resolver,
    ) -> Self {
        Self {
            ctx,
            registry,
            session,
            resolver,
        }
    }

    /// Connects to `target`, going through the family's proxy when one
    /// is configured. I2P targets ride the session; neither proxying
    /// nor DNS applies to them.
    pub async fn connect(&self, target: &Endpoint) -> NetResult<TcpStream> {
        if target.addr.is_i2p() {
            let Some(dest) = target.addr.i2p_destination() else {
                return Err(NetError::InvalidAddress(format!(
                    "cannot dial {target}: destination unknown"
                )));
            };
            return self.connect_overlay(dest).await;
        }
        match self.registry.proxy(target.addr.network()) {
            None => self.connect_directly(target).await,
            Some(proxy) => {
                debug!(target = %target, proxy = %proxy, "connecting through proxy");
                let stream = self.connect_directly(&proxy).await?;
                socks5_handshake(stream, &target.addr.to_string(), target.port).await
            }
        }
    }

    /// Connects to a named destination. Resolves locally when
    /// possible, otherwise hands the raw name to the name proxy.
    ///
    /// Returns the endpoint actually dialed; through the name proxy
    /// that is the unspecified placeholder, since only the proxy
    /// learns the real address.
    pub async fn connect_by_name(
        &self,
        name: &str,
        default_port: u16,
    ) -> NetResult<(Endpoint, TcpStream)> {
        let (host, port) = split_host_port(name);
        let port = port.unwrap_or(default_port);

        let allow_lookup = self.ctx.name_lookup && !self.registry.have_name_proxy();
        match self.resolver.lookup_one(&host, port, allow_lookup).await {
            Ok(target) if target.addr.is_valid() => {
                let stream = self.connect(&target).await?;
                Ok((target, stream))
            }
            _ => {
                let Some(name_proxy) = self.registry.name_proxy() else {
                    return Err(NetError::Resolution(format!("cannot resolve {host}")));
                };
                debug!(host = %host, proxy = %name_proxy, "connecting by name through proxy");
                let stream = self.connect_directly(&name_proxy).await?;
                let stream = socks5_handshake(stream, &host, port).await?;
                let placeholder = Endpoint::new(NetAddress::from_ipv4(Ipv4Addr::UNSPECIFIED), 0);
                Ok((placeholder, stream))
            }
        }
    }

    /// Direct connection, without consulting the proxy table. Only
    /// families with a socket form can be dialed this way.
    pub async fn connect_directly(&self, target: &Endpoint) -> NetResult<TcpStream> {
        let Some(sock_addr) = target.to_socket_addr() else {
            return Err(NetError::InvalidAddress(format!(
                "cannot dial {target}: unsupported network"
            )));
        };
        debug!(addr = %target, "trying connection");
        let stream = timeout(self.ctx.connect_timeout, TcpStream::connect(sock_addr))
            .await
            .map_err(|_| NetError::Timeout(format!("connecting to {target}")))?
            .map_err(NetError::Io)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    async fn connect_overlay(&self, dest: &I2pDestination) -> NetResult<TcpStream> {
        let b32 = dest.to_b32_address();
        debug!(dest = %b32, "connecting through I2P session");
        let session = Arc::clone(&self.session);
        let dest = dest.clone();
        let stream = tokio::task::spawn_blocking(move || session.connect(&dest))
            .await
            .map_err(|e| NetError::OverlayUnavailable(format!("session task failed: {e}")))?
            .map_err(|e| NetError::OverlayUnavailable(format!("{b32}: {e}")))?;
        stream.set_nonblocking(true)?;
        Ok(TcpStream::from_std(stream)?)
    }
}
