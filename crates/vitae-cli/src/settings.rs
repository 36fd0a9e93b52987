//! Process configuration.
//!
//! Built once in `main` from an optional TOML file plus `VITAE_`-prefixed
//! environment overrides, then passed down explicitly. Nothing reads the
//! environment after startup.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite store file.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,

  /// Directory holding the structured source files.
  #[serde(default = "default_data_dir")]
  pub data_dir: PathBuf,

  /// Directory backups are written to and restored from.
  #[serde(default = "default_backup_dir")]
  pub backup_dir: PathBuf,

  /// Stop migrations at the verification checkpoint until confirmed.
  #[serde(default)]
  pub require_confirmation: bool,
}

fn default_store_path() -> PathBuf {
  PathBuf::from("vitae.db")
}

fn default_data_dir() -> PathBuf {
  PathBuf::from("data")
}

fn default_backup_dir() -> PathBuf {
  PathBuf::from("backup")
}

impl Settings {
  /// Load configuration from `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("VITAE"))
      .build()
      .context("failed to read configuration")?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }
}
