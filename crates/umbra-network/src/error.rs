//! Error types for the transport layer

use thiserror::Error;
use umbra_netaddr::AddrError;

use crate::socks5::Socks5Reply;

/// Transport error type
#[derive(Error, Debug)]
pub enum NetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("address error: {0}")]
    Addr(#[from] AddrError),

    #[error("connection timeout: {0}")]
    Timeout(String),

    #[error("name resolution failed: {0}")]
    Resolution(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("SOCKS5 protocol violation: {0}")]
    ProxyProtocol(&'static str),

    #[error("proxy refused connection: {0}")]
    ProxyRejected(Socks5Reply),

    #[error("I2P session unavailable: {0}")]
    OverlayUnavailable(String),

    #[error("lookup cancelled")]
    Cancelled,
}

/// Result type for transport operations
pub type NetResult<T> = Result<T, NetError>;
