use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequential game identifier, assigned at creation and never reused.
pub type GameId = u64;

/// Opaque account address.
pub type AccountId = String;

/// Fixed-point scale representing 100% for fee rates (basis points).
pub const FEE_SCALE: u64 = 10_000;

/// Asset a game is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The chain-native asset, funded via attached payments.
    Native,
    /// A fungible token, funded via pull transfers.
    Token(String),
}

impl Asset {
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(symbol) => write!(f, "{}", symbol),
        }
    }
}

impl FromStr for Asset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(EngineError::InvalidAsset(s.to_string())),
            "native" => Ok(Asset::Native),
            symbol => Ok(Asset::Token(symbol.to_string())),
        }
    }
}

/// One of the two sides of a binary outcome.
///
/// Numeric encoding is 1-indexed (`Heads = 1`, `Tails = 2`); zero is the
/// "not selected" value and is rejected at the conversion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Heads,
    Tails,
}

impl Side {
    /// Maps a random draw onto a side: `(value mod 2) + 1` under the
    /// 1-indexed encoding, so even values land on heads, odd on tails.
    pub fn from_random(value: u64) -> Self {
        if value % 2 == 0 {
            Side::Heads
        } else {
            Side::Tails
        }
    }

    pub fn other(self) -> Self {
        match self {
            Side::Heads => Side::Tails,
            Side::Tails => Side::Heads,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Side::Heads => 1,
            Side::Tails => 2,
        }
    }
}

impl TryFrom<u8> for Side {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Heads),
            2 => Ok(Side::Tails),
            other => Err(EngineError::SideNotSelected(other)),
        }
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heads" | "1" => Ok(Side::Heads),
            "tails" | "2" => Ok(Side::Tails),
            _ => Err(EngineError::SideNotSelected(0)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Heads => write!(f, "heads"),
            Side::Tails => write!(f, "tails"),
        }
    }
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Created,
    Accepted,
    Canceled,
    Finished,
}

impl GameStatus {
    /// Canceled and Finished are terminal; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Canceled | GameStatus::Finished)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Created => write!(f, "created"),
            GameStatus::Accepted => write!(f, "accepted"),
            GameStatus::Canceled => write!(f, "canceled"),
            GameStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Per-asset settings supplied by the settings authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Fee rate in basis points against [`FEE_SCALE`], applied to the
    /// combined pot of a decided game.
    pub fee_rate: u64,
    /// Minimum stake per side.
    pub min_stake: u64,
}

/// A single wager between two participants.
///
/// Records are permanent history: created once, mutated only by the engine's
/// transition functions, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub asset: Asset,
    /// Amount wagered by one participant on one side. The combined pot is
    /// derived, never stored; see [`Game::combined_pot`].
    pub stake_per_side: u64,
    /// Fee rate snapshotted from the settings authority at creation time.
    /// Immutable even if the authority later reconfigures the asset.
    pub fee_rate: u64,
    pub player_a: AccountId,
    /// Acceptor; unset until the game is accepted.
    pub player_b: Option<AccountId>,
    /// The creator's chosen side. The acceptor implicitly takes the other.
    pub bet_a: Side,
    /// The resolved winning side; unset until settlement.
    pub win_bet: Option<Side>,
    pub status: GameStatus,
    /// Absolute deadline after which an accepted game may be force-expired
    /// by anyone. Unset before acceptance.
    pub expire_time: Option<DateTime<Utc>>,
}

impl Game {
    /// Sum of both stakes. Defined only once a second player has joined.
    pub fn combined_pot(&self) -> Option<u64> {
        self.player_b.as_ref().map(|_| self.stake_per_side * 2)
    }

    /// The acceptor's side, i.e. the one the creator did not pick.
    pub fn bet_b(&self) -> Option<Side> {
        self.player_b.as_ref().map(|_| self.bet_a.other())
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_mapping() {
        // Even and odd draws are a pure function of value mod 2.
        assert_eq!(Side::from_random(0), Side::Heads);
        assert_eq!(Side::from_random(2), Side::Heads);
        assert_eq!(Side::from_random(1), Side::Tails);
        assert_eq!(Side::from_random(u64::MAX), Side::Tails);
        assert_eq!(Side::from_random(0), Side::from_random(2));
    }

    #[test]
    fn test_side_conversion_rejects_unselected() {
        assert!(Side::try_from(0).is_err());
        assert!(Side::try_from(3).is_err());
        assert_eq!(Side::try_from(1).unwrap(), Side::Heads);
        assert_eq!(Side::try_from(2).unwrap(), Side::Tails);
    }

    #[test]
    fn test_asset_round_trip() {
        assert_eq!("native".parse::<Asset>().unwrap(), Asset::Native);
        assert_eq!(
            "chip".parse::<Asset>().unwrap(),
            Asset::Token("chip".to_string())
        );
        assert_eq!(Asset::Token("chip".to_string()).to_string(), "chip");
        assert!("".parse::<Asset>().is_err());
    }

    #[test]
    fn test_combined_pot_requires_acceptor() {
        let mut game = Game {
            id: 0,
            asset: Asset::Native,
            stake_per_side: 50,
            fee_rate: 100,
            player_a: "alice".to_string(),
            player_b: None,
            bet_a: Side::Heads,
            win_bet: None,
            status: GameStatus::Created,
            expire_time: None,
        };
        assert_eq!(game.combined_pot(), None);
        assert_eq!(game.bet_b(), None);

        game.player_b = Some("bob".to_string());
        game.status = GameStatus::Accepted;
        assert_eq!(game.combined_pot(), Some(100));
        assert_eq!(game.bet_b(), Some(Side::Tails));
    }
}
