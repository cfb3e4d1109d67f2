//! Configuration for zarchive.
//!
//! Lookup order: explicit `--config` path > `./zarchive.toml` > user config
//! (`~/.config/zarchive/config.toml`) > defaults. `ZULIP_*` environment
//! variables override the `[zulip]` section.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  dirs,
  error::{ArchiveError, Result},
  fetch::PAGE_SIZE,
};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "zarchive.toml";

// ============================================================================
// Remote Configuration
// ============================================================================

/// Connection settings for the chat server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZulipConfig {
  /// Server base URL, e.g. "https://chat.example.org"
  #[serde(skip_serializing_if = "Option::is_none")]
  pub site: Option<String>,

  /// Bot or user email used for basic auth
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,

  /// API key. If not set, reads from ZULIP_API_KEY env var
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,
}

// ============================================================================
// Archive Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
  /// Root of the JSON document store (default: <data dir>/json)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub json_root: Option<PathBuf>,

  /// Streams to archive. `"*"` means every public stream.
  /// Has no default; a sync refuses to start while it is unset.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub included_streams: Option<Vec<String>>,

  /// Streams never archived, even when matched by `included_streams`
  pub excluded_streams: Vec<String>,

  /// Messages requested per round-trip (default: 1000)
  pub page_size: u32,

  /// Extra seconds slept on top of the server's `retry-after` (default: 1.0)
  pub retry_padding_secs: f64,
}

impl Default for ArchiveConfig {
  fn default() -> Self {
    Self {
      json_root: None,
      included_streams: None,
      excluded_streams: Vec::new(),
      page_size: PAGE_SIZE,
      retry_padding_secs: 1.0,
    }
  }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Log level: error, warn, info, debug, trace (RUST_LOG overrides)
  pub level: String,

  /// Also write logs to this file
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

// ============================================================================
// Root Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub zulip: ZulipConfig,
  pub archive: ArchiveConfig,
  pub logging: LoggingConfig,
}

impl Config {
  /// Load the effective configuration.
  ///
  /// An explicit path must exist; discovered files are optional. Parse errors
  /// are always fatal.
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let mut config = match Self::locate(explicit)? {
      Some(path) => Self::from_file(&path)?,
      None => {
        debug!("No config file found, using defaults");
        Self::default()
      }
    };
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
  }

  /// Find which config file `load` would read.
  pub fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
      if !path.exists() {
        return Err(ArchiveError::config(format!("Config file not found: {}", path.display())));
      }
      return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
      return Ok(Some(local));
    }

    Ok(Self::user_config_path().filter(|p| p.exists()))
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path).map_err(|e| ArchiveError::io(path, e))?;
    let config = toml::from_str(&content)
      .map_err(|e| ArchiveError::config(format!("Invalid config file {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    Some(dirs::default_config_dir().join("config.toml"))
  }

  /// Apply `ZULIP_SITE`, `ZULIP_EMAIL` and `ZULIP_API_KEY` on top of the file values.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(site) = lookup("ZULIP_SITE") {
      debug!("ZULIP_SITE found in environment");
      self.zulip.site = Some(site);
    }
    if let Some(email) = lookup("ZULIP_EMAIL") {
      debug!("ZULIP_EMAIL found in environment");
      self.zulip.email = Some(email);
    }
    if let Some(key) = lookup("ZULIP_API_KEY") {
      debug!("ZULIP_API_KEY found in environment");
      self.zulip.api_key = Some(key);
    }
  }

  /// Root of the JSON document store.
  pub fn json_root(&self) -> PathBuf {
    self
      .archive
      .json_root
      .clone()
      .unwrap_or_else(|| dirs::default_data_dir().join("json"))
  }

  /// Starter config written by `zarchive config init`.
  pub fn template() -> Self {
    Self {
      zulip: ZulipConfig {
        site: Some("https://chat.example.org".to_string()),
        email: Some("archive-bot@example.org".to_string()),
        api_key: None,
      },
      archive: ArchiveConfig {
        included_streams: Some(vec!["*".to_string()]),
        ..Default::default()
      },
      logging: LoggingConfig::default(),
    }
  }
}
