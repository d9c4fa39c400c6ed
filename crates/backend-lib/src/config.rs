// ============================
// mdwiki-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Session lifecycle knobs
    pub session: SessionSettings,
    /// Wiki behavior flags
    pub wiki: WikiSettings,
    /// Search engine knobs
    pub search: SearchSettings,
    /// Login brute-force lockout knobs
    pub login_rate_limit: RateLimitSettings,
}

/// Session lifecycle knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Sliding expiry window in hours
    pub window_hours: i64,
    /// Interval between expired-carrier sweeps, in seconds
    pub sweep_interval_secs: u64,
}

/// Wiki behavior flags
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikiSettings {
    /// When true, page ids are generated tokens; when false, the title
    /// doubles as the id and a title change renames the record
    pub separate_page_title_and_id: bool,
    /// Snapshot the pre-update document on every page update
    pub save_to_archive: bool,
    /// Number of pages returned by the latest-pages listing
    pub latest_count: usize,
}

/// Search engine knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Bound on concurrently scored documents per stage
    pub concurrency: usize,
    /// Ranking is ascending by points by default; set this to get the
    /// highest-first order instead
    pub rank_descending: bool,
}

/// Login brute-force lockout knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Failed attempts before a client is locked out
    pub max_attempts: u32,
    /// Lockout duration in seconds
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().expect("static default addr"),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            session: SessionSettings::default(),
            wiki: WikiSettings::default(),
            search: SearchSettings::default(),
            login_rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            window_hours: 5,
            sweep_interval_secs: 15 * 60,
        }
    }
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            separate_page_title_and_id: false,
            save_to_archive: true,
            latest_count: 20,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            rank_descending: false,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Load settings from `config/default.toml` plus `MDWIKI__*` env overrides
    pub fn load() -> Result<Self> {
        Self::load_from("config/default.toml")
    }

    /// Load settings from an explicit file path plus env overrides
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MDWIKI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
