use crate::types::{Asset, GameId, GameStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("side selector {0} is not a valid side")]
    SideNotSelected(u8),

    #[error("invalid asset: {0:?}")]
    InvalidAsset(String),

    #[error("a game must be funded through exactly one channel, not both tokens and native value")]
    DualFunding,

    #[error("stake {stake} is below the minimum bet of {minimum}")]
    BetTooSmall { stake: u64, minimum: u64 },

    #[error("stake {0} exceeds the maximum supported bet")]
    StakeTooLarge(u64),

    #[error("fee rate {fee_rate} exceeds the scale of {maximum}")]
    InvalidFeeRate { fee_rate: u64, maximum: u64 },

    #[error("attached payment of {attached} does not match the stake of {expected}")]
    StakeMismatch { expected: u64, attached: u64 },

    #[error("insufficient balance: need {need}, have {available}")]
    InsufficientBalance { need: u64, available: u64 },

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("game {0} does not exist")]
    GameNotFound(GameId),

    #[error("game {id} is {status}, expected {expected}")]
    WrongStatus {
        id: GameId,
        status: GameStatus,
        expected: GameStatus,
    },

    #[error("game {id} does not expire until {deadline}")]
    NotYetExpired {
        id: GameId,
        deadline: DateTime<Utc>,
    },

    #[error("only the creator of game {0} may quit it")]
    NotCreator(GameId),

    #[error("caller is not the games authority")]
    NotAuthority,

    #[error("no settings configured for asset '{0}'")]
    UnsupportedAsset(Asset),

    #[error("randomness payload is empty")]
    MissingRandomness,

    #[error("oracle error: {0}")]
    Oracle(String),
}

impl EngineError {
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::TransferFailed(msg.into())
    }

    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }
}
