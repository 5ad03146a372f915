use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::request::TransferOptions;

/// Transport defaults applied to every request (`[transfer]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Connection setup limit in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer limit in seconds.
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    pub max_redirects: u32,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 30,
            follow_redirects: true,
            max_redirects: 5,
            user_agent: None,
        }
    }
}

impl TransferConfig {
    pub fn to_options(&self) -> TransferOptions {
        TransferOptions {
            follow_redirects: Some(self.follow_redirects),
            max_redirects: Some(self.max_redirects),
            connect_timeout: Some(Duration::from_secs(self.connect_timeout_secs)),
            timeout: Some(Duration::from_secs(self.timeout_secs)),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Sliding-window rate limit (optional `[throttle]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Completed calls allowed per second before dispatch pauses.
    pub rate_per_second: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            rate_per_second: 100,
        }
    }
}

/// Global configuration loaded from `~/.config/muxcurl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxConfig {
    /// Maximum concurrent transfers.
    pub multiplex_limit: usize,
    /// Attempts per request (including the first) on timeout or HTTP 429.
    pub max_attempts: u32,
    /// Upper bound in milliseconds on one transport wait.
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Optional rate limit; if missing, dispatch is never throttled.
    #[serde(default)]
    pub throttle: Option<ThrottleConfig>,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            multiplex_limit: 5,
            max_attempts: 1,
            poll_interval_ms: 1000,
            transfer: TransferConfig::default(),
            throttle: None,
            headers: BTreeMap::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("muxcurl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Read configuration from `path`.
pub fn load_from(path: &Path) -> Result<MuxConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: MuxConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MuxConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MuxConfig::default();
        write_to(&path, &default_cfg)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Write `cfg` as TOML, creating parent directories as needed.
pub fn write_to(path: &Path, cfg: &MuxConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}
