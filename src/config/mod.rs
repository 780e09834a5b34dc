//! Configuration management
//!
//! Peer address, socket timeout, key file location and packet dumping,
//! layered from defaults, TOML files and the environment.

pub mod settings;

pub use settings::{Config, DEFAULT_KEY_PATH, DEFAULT_PORT};
