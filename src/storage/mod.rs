//! Chain data on disk
//!
//! Reads the flat chain-snapshot format: signed blocks with the balance list
//! for each chain segment interleaved.

pub mod chain_snapshot;

pub use chain_snapshot::{read, read_file, read_snapshot, ChainSnapshot};
