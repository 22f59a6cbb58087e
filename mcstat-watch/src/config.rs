//! Watcher configuration.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mcstat_core::{MonitorConfig, ProbeOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config at {}", .0.display())]
    Missing(PathBuf),

    #[error("cannot read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration for the watcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Which server to watch.
    pub server: ServerConfig,
    /// Polling behaviour.
    pub monitor: MonitorSection,
    /// Notification delivery.
    pub notify: NotifyConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `host` or `host:port`.
    pub address: String,
    /// Follow `_minecraft._tcp` SRV records for port-less addresses.
    pub resolve_srv: bool,
}

/// Polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Seconds between probes.
    pub interval_secs: u64,
    /// Per-probe deadline in milliseconds.
    pub timeout_ms: u64,
    /// Also notify for the first result after startup.
    pub notify_on_first: bool,
}

/// Notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Program run as `<command> <title> <message>` on every change.
    /// Empty means log only.
    pub command: String,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost".into(),
            resolve_srv: true,
        }
    }
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval_secs: 120,
            timeout_ms: 5000,
            notify_on_first: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────

impl WatchConfig {
    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_millis(self.monitor.timeout_ms),
            resolve_srv: self.server.resolve_srv,
            ..ProbeOptions::default()
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_secs(self.monitor.interval_secs),
            notify_on_first: self.monitor.notify_on_first,
        }
    }

    /// The notify command, if one is configured.
    pub fn notify_command(&self) -> Option<&str> {
        match self.notify.command.trim() {
            "" => None,
            command => Some(command),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl WatchConfig {
    /// Load from a TOML file.
    ///
    /// Nothing is logged here; the caller decides how to report a
    /// fallback once logging is up.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::Missing(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a TOML file, falling back to defaults. The reason for a
    /// fallback is handed back so it can be logged after the subscriber
    /// is installed.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(io::Error::other)?;
        std::fs::write(path, text)
    }
}

// ── Tests ────────────────────────────────────────────────────────
