//! Fixed-width value types shared by every codec, and the height/version packing rule

use crate::core::field_size;
use data_encoding::HEXLOWER;
use serde::{Serialize, Serializer};
use std::fmt;

const HEIGHT_MASK: u64 = 0x0000_ffff_ffff_ffff;
const VERSION_SHIFT: u32 = 48;

/// 32-byte Ed25519 public key identifying an account or a verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Identifier(pub [u8; field_size::IDENTIFIER]);

/// 64-byte Ed25519 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(pub [u8; field_size::SIGNATURE]);

/// Receiver of every transfer into the cycle account; it never pays the periodic fee
pub const TRANSFER_IDENTIFIER: Identifier = {
    let mut bytes = [0u8; field_size::IDENTIFIER];
    bytes[field_size::IDENTIFIER - 1] = 1;
    Identifier(bytes)
};

impl Identifier {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature([0u8; field_size::SIGNATURE])
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::utils::serialize_hex(&self.0, serializer)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::utils::serialize_hex(&self.0, serializer)
    }
}

/// Pack a blockchain version into the top 16 bits and a height into the low 48.
pub fn pack_height_and_version(version: u16, height: u64) -> u64 {
    ((version as u64) << VERSION_SHIFT) | (height & HEIGHT_MASK)
}

/// Returns `(version, height)`.
pub fn unpack_height_and_version(packed: u64) -> (u16, u64) {
    ((packed >> VERSION_SHIFT) as u16, packed & HEIGHT_MASK)
}

/// Only the low 48 bits of a previous-hash height are significant
pub fn mask_height(height: u64) -> u64 {
    height & HEIGHT_MASK
}
