//! Utility functions and helpers
//!
//! Hashing, timestamps, the bounded byte reader every codec decodes through,
//! and the dash-grouped hex format used for keys and identifiers.

pub mod bytes;
pub mod crypto;
pub mod encoding;

pub use bytes::{string_byte_size, write_string, ByteReader};
pub use crypto::{current_timestamp, double_sha256, sha256_digest};
pub use encoding::{bytes_as_string_with_dashes, bytes_from_string_with_dashes, serialize_hex};
