//! Local key management
//!
//! Loads or creates the node's Ed25519 seed file, signs outgoing data and
//! verifies signatures received from peers.

pub mod keys;

pub use keys::{verify_signature, KeyPair};
