//! Peer-to-peer wagering engine.
//!
//! Two participants escrow equal stakes on a binary outcome, an external
//! randomness oracle resolves it, and the winner's net-of-fee prize is
//! credited to a pull-payment ledger. The engine is the lifecycle state
//! machine plus the bookkeeping that guarantees funds are never lost,
//! double-spent, or stuck; settings, randomness and token transfers are
//! injected collaborators behind the traits in [`traits`].

pub mod active_set;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod store;
pub mod traits;
pub mod types;

pub use active_set::ActiveSet;
pub use engine::WagerEngine;
pub use error::{EngineError, Result};
pub use events::Event;
pub use ledger::RewardLedger;
pub use store::GameStore;
pub use traits::{AssetBank, RandomnessOracle, SettingsAuthority};
pub use types::{
    AccountId, Asset, AssetSettings, Game, GameId, GameStatus, Side, FEE_SCALE,
};
