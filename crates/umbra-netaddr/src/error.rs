//! Error types for address parsing and encoding

use thiserror::Error;

/// Address error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddrError {
    #[error("invalid base32 encoding: {0}")]
    Base32(String),

    #[error("invalid base64 encoding: {0}")]
    Base64(String),

    #[error("onion identifier must decode to {expected} bytes, got {actual}")]
    OnionLength { expected: usize, actual: usize },

    #[error("I2P destination must be {expected} characters, got {actual}")]
    DestinationLength { expected: usize, actual: usize },

    #[error("I2P destination missing certificate terminator")]
    DestinationTerminator,

    #[error("unparseable address: {0}")]
    Unparseable(String),
}

/// Result type for address operations
pub type AddrResult<T> = Result<T, AddrError>;
