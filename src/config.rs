use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub retry: RetryConfig,
  #[serde(default)]
  pub save: SaveConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base path of the remote data endpoint, e.g. "http://127.0.0.1:8000/api"
  pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Attempts per network call, first try included
  pub max_attempts: u32,
  pub initial_backoff_ms: u64,
  pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_backoff_ms: 500,
      max_backoff_ms: 5_000,
    }
  }
}

impl RetryConfig {
  /// Exponential backoff before the attempt following `attempt` (1-based),
  /// capped at `max_backoff_ms`.
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    let ms = self.initial_backoff_ms.saturating_mul(factor);
    Duration::from_millis(ms.min(self.max_backoff_ms))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
  /// Quiet period before a scheduled save fires
  pub quiet_ms: u64,
}

impl Default for SaveConfig {
  fn default() -> Self {
    Self { quiet_ms: 500 }
  }
}

impl SaveConfig {
  pub fn quiet_period(&self) -> Duration {
    Duration::from_millis(self.quiet_ms)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Persist the fallback snapshot to disk so it survives restarts
  pub durable: bool,
  /// Explicit database path; defaults to the platform data directory
  pub path: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./prodlog.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/prodlog/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/prodlog/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("prodlog.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("prodlog").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}
