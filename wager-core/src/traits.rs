use crate::error::Result;
use crate::types::{AccountId, Asset, AssetSettings, GameId};
use chrono::{DateTime, Utc};

/// Supplies per-asset fee and minimum-bet settings.
///
/// Owned and administered by the games authority; the engine snapshots the
/// fee rate at game creation, so later reconfiguration never touches games
/// already in flight.
pub trait SettingsAuthority {
    fn settings(&self, asset: &Asset) -> Result<AssetSettings>;
}

/// Delivers unbiased random values for accepted games.
///
/// The oracle also owns the global expiry policy: registering a request
/// returns the absolute deadline after which the game may be force-expired
/// by anyone.
pub trait RandomnessOracle {
    fn request_randomness(&mut self, game_id: GameId, count: u32) -> Result<DateTime<Utc>>;
}

/// Transfer interface over the engine's escrow.
///
/// Only the interface contract is specified here; native attached payments
/// never go through [`AssetBank::pull`] because the environment has already
/// moved the attached value into escrow when the call is dispatched.
pub trait AssetBank {
    /// Pulls `amount` of `asset` from `from` into the escrow (transferFrom
    /// semantics). Insufficient balance or allowance surfaces as an error.
    fn pull(&mut self, asset: &Asset, from: &AccountId, amount: u64) -> Result<()>;

    /// Pushes `amount` of `asset` out of the escrow to `to`. A zero-amount
    /// push must succeed.
    fn push(&mut self, asset: &Asset, to: &AccountId, amount: u64) -> Result<()>;

    fn balance(&self, asset: &Asset, account: &AccountId) -> u64;
}
