//! Connection plumbing for the node
//!
//! - [`config`]: dial-time settings
//! - [`dial`]: outbound connection establishment
//! - [`proxy`]: per-family SOCKS5 proxy registry
//! - [`resolver`]: name resolution with overlay interception
//! - [`session`]: I2P session and notification seams
//! - [`socks5`]: SOCKS5 client handshake
//! - [`timedata`]: peer-derived clock adjustment

pub mod config;
pub mod dial;
pub mod error;
pub mod proxy;
pub mod resolver;
pub mod session;
pub mod socks5;
pub mod timedata;

pub use config::{NetContext, DEFAULT_CONNECT_TIMEOUT};
pub use dial::Dialer;
pub use error::{NetError, NetResult};
pub use proxy::ProxyRegistry;
pub use resolver::Resolver;
pub use session::{
    AddressBook, EmptyAddressBook, LogNotify, NoSession, NotifySink, OverlaySession,
};
pub use socks5::{socks5_handshake, Socks5Reply};
pub use timedata::TimeData;

pub use umbra_netaddr::{Endpoint, I2pDestination, NetAddress, Network};
