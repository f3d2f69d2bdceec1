//! Local stand-ins for the engine's external collaborators: a settings
//! authority backed by the config file, a deterministic hash-based oracle,
//! and an in-memory asset bank with escrow accounting.

use crate::config::CliConfig;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use wager_core::{
    AccountId, Asset, AssetBank, AssetSettings, EngineError, GameId, RandomnessOracle, Result,
    SettingsAuthority,
};

/// Settings authority reading from the per-asset table in the CLI config.
pub struct LocalSettings {
    table: HashMap<Asset, AssetSettings>,
}

impl LocalSettings {
    pub fn from_config(config: &CliConfig) -> Result<Self> {
        let mut table = HashMap::new();
        for (name, settings) in &config.assets {
            table.insert(name.parse::<Asset>()?, *settings);
        }
        Ok(Self { table })
    }
}

impl SettingsAuthority for LocalSettings {
    fn settings(&self, asset: &Asset) -> Result<AssetSettings> {
        self.table
            .get(asset)
            .copied()
            .ok_or_else(|| EngineError::UnsupportedAsset(asset.clone()))
    }
}

/// Simulated randomness oracle.
///
/// Deadlines are `now + expiry`; random values are drawn deterministically
/// from SHA-256 over the seed and the game id, so a replay of the same
/// deployment resolves the same way.
pub struct LocalOracle {
    seed: u64,
    expiry: Duration,
}

impl LocalOracle {
    pub fn new(seed: u64, expiry_secs: i64) -> Self {
        Self {
            seed,
            expiry: Duration::seconds(expiry_secs),
        }
    }

    fn digest(&self, game_id: GameId) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(game_id.to_le_bytes());
        hasher.finalize().into()
    }

    /// The oracle's random value for a game.
    pub fn draw(&self, game_id: GameId) -> u64 {
        let digest = self.digest(game_id);
        let mut value = [0u8; 8];
        value.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(value)
    }

    /// Hex form of the full digest backing [`LocalOracle::draw`], for
    /// display.
    pub fn digest_hex(&self, game_id: GameId) -> String {
        hex::encode(self.digest(game_id))
    }
}

impl RandomnessOracle for LocalOracle {
    fn request_randomness(&mut self, game_id: GameId, count: u32) -> Result<DateTime<Utc>> {
        if count == 0 {
            return Err(EngineError::oracle("requested zero random values"));
        }
        let deadline = Utc::now() + self.expiry;
        tracing::debug!(
            "Randomness requested for game {} ({} values), deadline {}",
            game_id,
            count,
            deadline
        );
        Ok(deadline)
    }
}

/// In-memory bank: account balances plus the engine's escrow, per asset.
///
/// Allowance bookkeeping is out of scope; a pull only checks the payer's
/// balance.
#[derive(Debug, Default)]
pub struct LocalBank {
    balances: HashMap<(AccountId, Asset), u64>,
    escrow: HashMap<Asset, u64>,
}

impl LocalBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(
        balances: impl IntoIterator<Item = (AccountId, Asset, u64)>,
        escrow: impl IntoIterator<Item = (Asset, u64)>,
    ) -> Self {
        let mut bank = Self::new();
        for (account, asset, amount) in balances {
            bank.balances.insert((account, asset), amount);
        }
        for (asset, amount) in escrow {
            bank.escrow.insert(asset, amount);
        }
        bank
    }

    /// Faucet deposit, outside any game flow.
    pub fn deposit(&mut self, account: &AccountId, asset: &Asset, amount: u64) {
        *self
            .balances
            .entry((account.clone(), asset.clone()))
            .or_insert(0) += amount;
    }

    /// Moves a native payment into escrow before a call is dispatched, the
    /// way the execution environment would attach value to a call.
    pub fn attach(&mut self, account: &AccountId, amount: u64) -> Result<()> {
        self.pull(&Asset::Native, account, amount)
    }

    /// Returns an attached payment after a failed call.
    pub fn refund_attached(&mut self, account: &AccountId, amount: u64) -> Result<()> {
        self.push(&Asset::Native, account, amount)
    }

    pub fn escrowed(&self, asset: &Asset) -> u64 {
        self.escrow.get(asset).copied().unwrap_or(0)
    }

    pub fn balances_for(&self, account: &AccountId) -> Vec<(Asset, u64)> {
        let mut entries: Vec<(Asset, u64)> = self
            .balances
            .iter()
            .filter(|((a, _), _)| a == account)
            .map(|((_, asset), amount)| (asset.clone(), *amount))
            .collect();
        entries.sort_by_key(|(asset, _)| asset.to_string());
        entries
    }

    pub fn iter_balances(&self) -> impl Iterator<Item = (&AccountId, &Asset, u64)> {
        self.balances
            .iter()
            .map(|((account, asset), amount)| (account, asset, *amount))
    }

    pub fn iter_escrow(&self) -> impl Iterator<Item = (&Asset, u64)> {
        self.escrow.iter().map(|(asset, amount)| (asset, *amount))
    }
}

impl AssetBank for LocalBank {
    fn pull(&mut self, asset: &Asset, from: &AccountId, amount: u64) -> Result<()> {
        let balance = self
            .balances
            .entry((from.clone(), asset.clone()))
            .or_insert(0);
        if *balance < amount {
            return Err(EngineError::InsufficientBalance {
                need: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        *self.escrow.entry(asset.clone()).or_insert(0) += amount;
        Ok(())
    }

    fn push(&mut self, asset: &Asset, to: &AccountId, amount: u64) -> Result<()> {
        let escrow = self.escrow.entry(asset.clone()).or_insert(0);
        if *escrow < amount {
            return Err(EngineError::transfer(format!(
                "escrow holds {} {} but {} was requested",
                escrow, asset, amount
            )));
        }
        *escrow -= amount;
        *self
            .balances
            .entry((to.clone(), asset.clone()))
            .or_insert(0) += amount;
        Ok(())
    }

    fn balance(&self, asset: &Asset, account: &AccountId) -> u64 {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_draw_is_deterministic() {
        let oracle = LocalOracle::new(42, 3600);
        assert_eq!(oracle.draw(7), oracle.draw(7));
        // Different games get independent draws.
        assert_ne!(oracle.digest_hex(1), oracle.digest_hex(2));
    }

    #[test]
    fn test_bank_pull_checks_balance() {
        let mut bank = LocalBank::new();
        let alice = "alice".to_string();
        bank.deposit(&alice, &Asset::Native, 100);

        assert!(bank.pull(&Asset::Native, &alice, 150).is_err());
        bank.pull(&Asset::Native, &alice, 60).unwrap();
        assert_eq!(bank.balance(&Asset::Native, &alice), 40);
        assert_eq!(bank.escrowed(&Asset::Native), 60);
    }

    #[test]
    fn test_bank_push_is_bounded_by_escrow() {
        let mut bank = LocalBank::new();
        let alice = "alice".to_string();
        bank.deposit(&alice, &Asset::Native, 10);
        bank.pull(&Asset::Native, &alice, 10).unwrap();

        assert!(bank.push(&Asset::Native, &alice, 11).is_err());
        bank.push(&Asset::Native, &alice, 10).unwrap();
        // Zero-amount pushes always succeed.
        bank.push(&Asset::Native, &alice, 0).unwrap();
    }
}
