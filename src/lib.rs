//! # nyzo-wire - Nyzo peer protocol client
//!
//! The byte-level formats a Nyzo verifier speaks, and a client that frames
//! them over TCP. When I come back to this code, here's the map:
//!
//! ## How I Organized My Code
//! - `core/`: field widths, identifiers, and the transaction, balance list and block codecs
//! - `network/`: message types, the signed message envelope, content codecs, the TCP connection
//! - `storage/`: the chain snapshot (`.nyzoblock`) reader
//! - `wallet/`: the Ed25519 seed file, signing and verification
//! - `config/`: peer address, timeout and key path from TOML files and the environment
//! - `utils/`: hashing, the bounded byte reader, dash-grouped hex
//! - `cli/`: command-line parsing for the `nyzo-wire` binary
//!
//! ## Things I Need to Remember
//! - Every integer on the wire is big-endian
//! - Every decoder returns the value and the number of bytes it consumed
//! - Signatures cover the signing form, which is never the transmission form
//! - Messages from peers are not trusted until `verify_signature` says so

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{
    BalanceList, BalanceListItem, Block, CycleSignatureLayout, Identifier, Signature, Transaction,
    TransactionType,
};
pub use error::{NyzoError, Result};
pub use network::{
    BlockRequest, BlockResponse, Connection, ConnectionState, Message, MessageContent,
    MessageType, SignatureState, StatusResponse, TransactionResponse,
};
pub use storage::ChainSnapshot;
pub use utils::{current_timestamp, double_sha256, sha256_digest};
pub use wallet::{verify_signature, KeyPair};
