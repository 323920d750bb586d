//! Capability seams toward the I2P router and the embedding node
//!
//! The transport layer never talks SAM itself. It consumes an
//! established session through [`OverlaySession`] and asks the node
//! for cached names and warning delivery through the other traits.

use std::io;
use std::net::TcpStream;

use umbra_netaddr::I2pDestination;

/// Access to an established I2P SAM session.
///
/// Streams come back as already-connected OS sockets so the dialer can
/// hand them to the async runtime like any other connection.
pub trait OverlaySession: Send + Sync {
    /// Opens a stream to `dest` through the session. Blocking.
    fn connect(&self, dest: &I2pDestination) -> io::Result<TcpStream>;

    /// Resolves an I2P name (`*.i2p`, `*.b32.i2p`) to a destination.
    /// Blocking, and potentially very slow.
    fn name_lookup(&self, name: &str) -> io::Result<I2pDestination>;
}

/// Cache of previously learned I2P destinations keyed by name.
pub trait AddressBook: Send + Sync {
    fn cached_destination(&self, name: &str) -> Option<I2pDestination>;
}

/// Receiver for operator-facing warnings.
pub trait NotifySink: Send + Sync {
    fn warn(&self, message: &str);
}

/// Session stub for nodes running without an I2P router.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSession;

impl OverlaySession for NoSession {
    fn connect(&self, _dest: &I2pDestination) -> io::Result<TcpStream> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no I2P session"))
    }

    fn name_lookup(&self, _name: &str) -> io::Result<I2pDestination> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no I2P session"))
    }
}

/// Address book that has never seen a name.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyAddressBook;

impl AddressBook for EmptyAddressBook {
    fn cached_destination(&self, _name: &str) -> Option<I2pDestination> {
        None
    }
}

/// Routes warnings into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotify;

impl NotifySink for LogNotify {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
