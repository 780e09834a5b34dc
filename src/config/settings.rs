use crate::error::{NyzoError, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9444;
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_KEY_PATH: &str = "tmp/verifier_private_seed";

const DEFAULT_CONFIG_FILE: &str = "config.default.toml";
const USER_CONFIG_FILE: &str = "config.toml";

const HOST_KEY: &str = "NYZO_HOST";
const PORT_KEY: &str = "NYZO_PORT";
const NETWORK_TIMEOUT_KEY: &str = "NYZO_NETWORK_TIMEOUT";
const SEED_KEY: &str = "NYZO_SEED";
const DUMP_PACKETS_KEY: &str = "NYZO_DUMP_PACKETS";

/// Client settings, built once at startup and passed where needed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub network_timeout: Duration,
    pub key_path: PathBuf,
    pub dump_packets: bool,
}

// Any subset of the settings, as written in a TOML file
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    host: Option<String>,
    port: Option<u16>,
    network_timeout: Option<u64>,
    key_path: Option<PathBuf>,
    dump_packets: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            network_timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
            key_path: PathBuf::from(DEFAULT_KEY_PATH),
            dump_packets: false,
        }
    }
}

impl Config {
    /// Defaults, then `config.default.toml` and `config.toml` from `dir` when
    /// present, then `NYZO_*` environment variables.
    pub fn load(dir: &Path) -> Result<Config> {
        let mut config = Config::default();
        for name in [DEFAULT_CONFIG_FILE, USER_CONFIG_FILE] {
            let path = dir.join(name);
            if path.is_file() {
                config.overlay_file(&path)?;
            }
        }
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    fn overlay_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .map_err(|e| NyzoError::Config(format!("{}: {e}", path.display())))?;
        let partial: PartialConfig = toml::from_str(&text)
            .map_err(|e| NyzoError::Config(format!("{}: {e}", path.display())))?;
        debug!("Loaded settings from {}", path.display());
        self.overlay(partial);
        Ok(())
    }

    fn overlay(&mut self, partial: PartialConfig) {
        if let Some(host) = partial.host {
            self.host = host;
        }
        if let Some(port) = partial.port {
            self.port = port;
        }
        if let Some(seconds) = partial.network_timeout {
            self.network_timeout = Duration::from_secs(seconds);
        }
        if let Some(key_path) = partial.key_path {
            self.key_path = key_path;
        }
        if let Some(dump_packets) = partial.dump_packets {
            self.dump_packets = dump_packets;
        }
    }

    // `lookup` stands in for the process environment so tests stay hermetic
    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_KEY) {
            self.host = host;
        }
        if let Some(port) = lookup(PORT_KEY) {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| NyzoError::Config(format!("{PORT_KEY}={port}: {e}")))?;
        }
        if let Some(seconds) = lookup(NETWORK_TIMEOUT_KEY) {
            let seconds: u64 = seconds
                .trim()
                .parse()
                .map_err(|e| NyzoError::Config(format!("{NETWORK_TIMEOUT_KEY}={seconds}: {e}")))?;
            self.network_timeout = Duration::from_secs(seconds);
        }
        if let Some(key_path) = lookup(SEED_KEY) {
            self.key_path = PathBuf::from(key_path);
        }
        if let Some(flag) = lookup(DUMP_PACKETS_KEY) {
            self.dump_packets = parse_flag(&flag);
        }
        if self.network_timeout.is_zero() {
            warn!("A zero network timeout disables socket timeouts; using the default");
            self.network_timeout = Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS);
        }
        Ok(())
    }

    /// `host:port` of the peer to talk to
    pub fn peer_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}
