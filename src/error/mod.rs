//! Error handling for the wire codecs and the peer transport
//!
//! Decoding either yields a complete value or one of these errors; nothing is
//! handed back half-built. Receive timeouts and signature checks are not errors
//! (they surface as `Ok(None)` and `bool` respectively).

use std::fmt;

/// Result type alias for codec and transport operations
pub type Result<T> = std::result::Result<T, NyzoError>;

/// Error types for codec, key and transport operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NyzoError {
    /// Buffer shorter than a field requires, or an impossible length field
    MalformedBuffer(String),
    /// Transaction tag outside the known set; the surrounding offset is lost
    UnknownTransactionType(u8),
    /// Message tag outside the closed enumeration
    UnknownMessageType(u16),
    /// Content that cannot be written in the layout its blockchain version requires
    LayoutMismatch(String),
    /// Connect, send or receive failure
    Connection(String),
    /// Key material rejected, RNG or clock failure
    Crypto(String),
    /// Key file unreadable or badly formatted
    KeyFile(String),
    /// Configuration file errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for NyzoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NyzoError::MalformedBuffer(msg) => write!(f, "Malformed buffer: {msg}"),
            NyzoError::UnknownTransactionType(tag) => {
                write!(f, "Unknown transaction type: {tag}")
            }
            NyzoError::UnknownMessageType(tag) => write!(f, "Unknown message type: {tag}"),
            NyzoError::LayoutMismatch(msg) => write!(f, "Layout mismatch: {msg}"),
            NyzoError::Connection(msg) => write!(f, "Connection error: {msg}"),
            NyzoError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            NyzoError::KeyFile(msg) => write!(f, "Key file error: {msg}"),
            NyzoError::Config(msg) => write!(f, "Configuration error: {msg}"),
            NyzoError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for NyzoError {}

impl From<std::io::Error> for NyzoError {
    fn from(err: std::io::Error) -> Self {
        NyzoError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for NyzoError {
    fn from(err: toml::de::Error) -> Self {
        NyzoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for NyzoError {
    fn from(err: serde_json::Error) -> Self {
        NyzoError::Io(format!("JSON rendering failed: {err}"))
    }
}
