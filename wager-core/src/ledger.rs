use crate::types::{AccountId, Asset};
use std::collections::HashMap;

/// Pull-payment ledger: per-account, per-asset credits awaiting withdrawal.
///
/// Pure bookkeeping with exactly two write paths: additive credit and an
/// atomic read-and-zero used by withdrawal. Entries are zeroed in place,
/// never removed, so a balance can never go negative by construction.
#[derive(Debug, Default, Clone)]
pub struct RewardLedger {
    entries: HashMap<(AccountId, Asset), u64>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the account's withdrawable balance for `asset`.
    /// The entry is created on first credit.
    pub fn credit(&mut self, account: &AccountId, asset: &Asset, amount: u64) {
        let entry = self
            .entries
            .entry((account.clone(), asset.clone()))
            .or_insert(0);
        *entry += amount;
    }

    /// Reads the full balance and zeroes it in a single step. Returns the
    /// amount that was owed, which may be zero.
    pub fn take(&mut self, account: &AccountId, asset: &Asset) -> u64 {
        match self.entries.get_mut(&(account.clone(), asset.clone())) {
            Some(entry) => std::mem::take(entry),
            None => 0,
        }
    }

    pub fn balance(&self, account: &AccountId, asset: &Asset) -> u64 {
        self.entries
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Total credited across all accounts for `asset`.
    pub fn total_for_asset(&self, asset: &Asset) -> u64 {
        self.entries
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| amount)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &Asset, u64)> {
        self.entries
            .iter()
            .map(|((account, asset), amount)| (account, asset, *amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(s: &str) -> AccountId {
        s.to_string()
    }

    #[test]
    fn test_credit_accumulates() {
        let mut ledger = RewardLedger::new();
        let alice = acct("alice");
        ledger.credit(&alice, &Asset::Native, 100);
        ledger.credit(&alice, &Asset::Native, 50);
        assert_eq!(ledger.balance(&alice, &Asset::Native), 150);
    }

    #[test]
    fn test_entries_are_keyed_per_asset() {
        let mut ledger = RewardLedger::new();
        let alice = acct("alice");
        let chip = Asset::Token("chip".to_string());
        ledger.credit(&alice, &Asset::Native, 10);
        ledger.credit(&alice, &chip, 20);
        assert_eq!(ledger.balance(&alice, &Asset::Native), 10);
        assert_eq!(ledger.balance(&alice, &chip), 20);
    }

    #[test]
    fn test_take_zeroes_atomically() {
        let mut ledger = RewardLedger::new();
        let alice = acct("alice");
        ledger.credit(&alice, &Asset::Native, 75);
        assert_eq!(ledger.take(&alice, &Asset::Native), 75);
        assert_eq!(ledger.balance(&alice, &Asset::Native), 0);
        // A second take owes nothing but still succeeds.
        assert_eq!(ledger.take(&alice, &Asset::Native), 0);
    }

    #[test]
    fn test_take_on_missing_entry_is_zero() {
        let mut ledger = RewardLedger::new();
        assert_eq!(ledger.take(&acct("nobody"), &Asset::Native), 0);
    }
}
