//! Command-line interface
//!
//! Argument parsing for the `nyzo-wire` binary.

pub mod commands;

pub use commands::{Command, Opt};
