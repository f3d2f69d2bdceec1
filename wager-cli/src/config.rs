use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use wager_core::AssetSettings;

/// Local deployment configuration: the authority account, the simulated
/// oracle's expiry policy and seed, and the per-asset settings table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub authority: String,
    /// Seconds between acceptance and the force-expiry deadline.
    pub expiry_secs: i64,
    /// Seed for the local oracle's deterministic draws, generated on first
    /// run.
    pub oracle_seed: u64,
    /// Settings keyed by asset display name ("native" or a token symbol).
    pub assets: BTreeMap<String, AssetSettings>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let mut assets = BTreeMap::new();
        assets.insert(
            "native".to_string(),
            AssetSettings {
                fee_rate: 100,
                min_stake: 1,
            },
        );
        assets.insert(
            "chip".to_string(),
            AssetSettings {
                fee_rate: 250,
                min_stake: 100,
            },
        );
        Self {
            authority: "authority".to_string(),
            expiry_secs: 3600,
            oracle_seed: rand::thread_rng().gen(),
            assets,
        }
    }
}

impl CliConfig {
    fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("config.json")
    }

    /// Loads the config from the data directory, writing the default on
    /// first run.
    pub fn load_or_init(data_dir: &Path) -> anyhow::Result<Self> {
        let path = Self::path(data_dir);
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config = serde_json::from_str(&content)
                .with_context(|| format!("invalid config at {}", path.display()))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(data_dir)?;
            tracing::info!("Wrote default config to {}", path.display());
            Ok(config)
        }
    }

    pub fn save(&self, data_dir: &Path) -> anyhow::Result<()> {
        let path = Self::path(data_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
