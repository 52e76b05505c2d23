//! Engine configuration
//!
//! Persisted as JSON next to the database, versioned so old installs can be
//! migrated in place on load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE: &str = "shoebox.json";

/// Main engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
	/// Config schema version
	pub version: u32,

	/// Data directory path
	pub data_dir: PathBuf,

	/// Days a receipt keeps its local page blobs after the review outcome
	/// turned terminal.
	pub retention_days: u32,

	/// How many remote ids go into one status-check request.
	pub status_batch_size: usize,

	/// Account selected when the app was last used.
	pub last_account_id: Option<String>,
}

impl EngineConfig {
	/// Load configuration from a data directory, creating a default config
	/// file if none exists yet.
	pub fn load_from(data_dir: &Path) -> Result<Self> {
		let config_path = data_dir.join(CONFIG_FILE);

		if config_path.exists() {
			let json = fs::read_to_string(&config_path)
				.with_context(|| format!("failed to read {}", config_path.display()))?;
			let mut config: EngineConfig = serde_json::from_str(&json)
				.with_context(|| format!("failed to parse {}", config_path.display()))?;

			if config.version < Self::target_version() {
				info!(
					"Migrating config from v{} to v{}",
					config.version,
					Self::target_version()
				);
				config.migrate()?;
				config.save()?;
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default_with_dir(data_dir.to_path_buf());
			config.save()?;
			Ok(config)
		}
	}

	/// Create default configuration rooted at a specific data directory.
	pub fn default_with_dir(data_dir: PathBuf) -> Self {
		Self {
			version: Self::target_version(),
			data_dir,
			retention_days: 90,
			status_batch_size: 25,
			last_account_id: None,
		}
	}

	/// Persist the configuration to its data directory.
	pub fn save(&self) -> Result<()> {
		fs::create_dir_all(&self.data_dir)?;
		let config_path = self.data_dir.join(CONFIG_FILE);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)
			.with_context(|| format!("failed to write {}", config_path.display()))?;
		Ok(())
	}

	fn target_version() -> u32 {
		1
	}

	fn migrate(&mut self) -> Result<()> {
		// v1 is the first schema; nothing to migrate from yet.
		self.version = Self::target_version();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_creates_default_when_missing() {
		let tmp = tempfile::tempdir().unwrap();
		let config = EngineConfig::load_from(tmp.path()).unwrap();

		assert_eq!(config.retention_days, 90);
		assert_eq!(config.status_batch_size, 25);
		assert!(config.last_account_id.is_none());
		assert!(tmp.path().join(CONFIG_FILE).exists());
	}

	#[test]
	fn test_round_trip() {
		let tmp = tempfile::tempdir().unwrap();
		let mut config = EngineConfig::load_from(tmp.path()).unwrap();
		config.retention_days = 30;
		config.last_account_id = Some("acct-9".into());
		config.save().unwrap();

		let reloaded = EngineConfig::load_from(tmp.path()).unwrap();
		assert_eq!(reloaded.retention_days, 30);
		assert_eq!(reloaded.last_account_id.as_deref(), Some("acct-9"));
	}
}
