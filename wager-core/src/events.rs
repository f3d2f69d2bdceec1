use crate::types::{AccountId, Asset, Game, GameId, Side};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle notifications emitted by the engine.
///
/// Queued internally and drained by the embedder; every notification is also
/// mirrored to `tracing`. A force-expiry emits [`Event::GameExpired`]
/// immediately followed by the generic [`Event::GameCanceled`] for the same
/// id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    GameCreated {
        id: GameId,
        creator: AccountId,
        game: Game,
    },
    GameAccepted {
        id: GameId,
        acceptor: AccountId,
        deadline: DateTime<Utc>,
    },
    GameFinished {
        id: GameId,
        winner: AccountId,
        winning_side: Side,
        prize: u64,
        fee: u64,
    },
    GameCanceled {
        id: GameId,
    },
    GameExpired {
        id: GameId,
    },
    Withdraw {
        account: AccountId,
        asset: Asset,
        amount: u64,
    },
}
