use crate::active_set::ActiveSet;
use crate::error::{EngineError, Result};
use crate::events::Event;
use crate::ledger::RewardLedger;
use crate::store::GameStore;
use crate::traits::{AssetBank, RandomnessOracle, SettingsAuthority};
use crate::types::{AccountId, Asset, Game, GameId, GameStatus, Side, FEE_SCALE};
use chrono::{DateTime, Utc};

/// The game lifecycle state machine with escrow accounting.
///
/// Legal transitions: `Created -> Accepted -> {Finished | Canceled}` and
/// `Created -> Canceled` (creator quit). Every entry point either applies
/// fully or fails without touching state; outbound transfers happen only
/// after all bookkeeping for the operation is final.
///
/// The engine holds its collaborators by value, injected at construction.
/// Authority-gated entry points check the caller against the configured
/// authority account.
pub struct WagerEngine<S, O, B> {
    authority: AccountId,
    settings: S,
    oracle: O,
    bank: B,
    games: GameStore,
    active: ActiveSet,
    ledger: RewardLedger,
    events: Vec<Event>,
}

impl<S, O, B> WagerEngine<S, O, B>
where
    S: SettingsAuthority,
    O: RandomnessOracle,
    B: AssetBank,
{
    pub fn new(authority: AccountId, settings: S, oracle: O, bank: B) -> Self {
        Self {
            authority,
            settings,
            oracle,
            bank,
            games: GameStore::new(),
            active: ActiveSet::new(),
            ledger: RewardLedger::new(),
            events: Vec::new(),
        }
    }

    /// Restores an engine from a persisted snapshot: games in id order plus
    /// reward ledger entries. The active set is rebuilt from game statuses.
    pub fn with_state<I>(
        authority: AccountId,
        settings: S,
        oracle: O,
        bank: B,
        games: Vec<Game>,
        rewards: I,
    ) -> Self
    where
        I: IntoIterator<Item = (AccountId, Asset, u64)>,
    {
        let mut engine = Self::new(authority, settings, oracle, bank);
        for game in games {
            let id = game.id;
            let active = game.is_active();
            engine.games.push(game);
            if active {
                engine.active.insert(id);
            }
        }
        for (account, asset, amount) in rewards {
            engine.ledger.credit(&account, &asset, amount);
        }
        engine
    }

    /// Creates a new game and escrows the creator's stake.
    ///
    /// Token games are funded by a pull transfer of `stake`; native games by
    /// the attached payment, in which case the declared `stake` parameter is
    /// ignored. Supplying both channels at once is rejected.
    pub fn create_game(
        &mut self,
        caller: &AccountId,
        asset: Asset,
        stake: u64,
        side: Side,
        attached: u64,
    ) -> Result<GameId> {
        if !asset.is_native() && stake > 0 && attached > 0 {
            return Err(EngineError::DualFunding);
        }
        let stake = if asset.is_native() { attached } else { stake };

        let cfg = self.settings.settings(&asset)?;
        // The settings authority is an external collaborator; a rate above
        // the scale would make the fee exceed the pot.
        if cfg.fee_rate > FEE_SCALE {
            return Err(EngineError::InvalidFeeRate {
                fee_rate: cfg.fee_rate,
                maximum: FEE_SCALE,
            });
        }
        if stake < cfg.min_stake {
            return Err(EngineError::BetTooSmall {
                stake,
                minimum: cfg.min_stake,
            });
        }
        // Reject stakes whose doubling at acceptance would wrap.
        if stake > u64::MAX / 2 {
            return Err(EngineError::StakeTooLarge(stake));
        }

        if !asset.is_native() {
            self.bank.pull(&asset, caller, stake)?;
        }

        let id = self.games.next_id();
        let game = Game {
            id,
            asset,
            stake_per_side: stake,
            fee_rate: cfg.fee_rate,
            player_a: caller.clone(),
            player_b: None,
            bet_a: side,
            win_bet: None,
            status: GameStatus::Created,
            expire_time: None,
        };
        self.games.push(game.clone());
        self.active.insert(id);

        tracing::info!(
            "Game {} created by {} ({} {} on {})",
            id,
            caller,
            game.stake_per_side,
            game.asset,
            game.bet_a
        );
        self.emit(Event::GameCreated {
            id,
            creator: caller.clone(),
            game,
        });
        Ok(id)
    }

    /// Joins an open game as the second player and requests randomness.
    ///
    /// The acceptor's funding must match the stored stake exactly: for
    /// native games the attached payment equals the stake to the unit, for
    /// token games exactly the stake is pulled. The side was fixed at
    /// creation and is not re-validated.
    pub fn accept_game(&mut self, caller: &AccountId, id: GameId, attached: u64) -> Result<()> {
        let game = self.games.get(id).ok_or(EngineError::GameNotFound(id))?;
        ensure_status(game, GameStatus::Created)?;
        let asset = game.asset.clone();
        let stake = game.stake_per_side;

        if asset.is_native() {
            if attached != stake {
                return Err(EngineError::StakeMismatch {
                    expected: stake,
                    attached,
                });
            }
        } else if attached > 0 {
            return Err(EngineError::DualFunding);
        }

        // Request randomness before pulling funds so a failed pull leaves no
        // value in flight; the orphaned request is harmless because the game
        // stays in Created and fulfillment will fail the status check.
        let deadline = self.oracle.request_randomness(id, 1)?;
        if !asset.is_native() {
            self.bank.pull(&asset, caller, stake)?;
        }

        let game = self.games.get_mut(id).ok_or(EngineError::GameNotFound(id))?;
        game.player_b = Some(caller.clone());
        game.status = GameStatus::Accepted;
        game.expire_time = Some(deadline);

        tracing::info!("Game {} accepted by {}, expires {}", id, caller, deadline);
        self.emit(Event::GameAccepted {
            id,
            acceptor: caller.clone(),
            deadline,
        });
        Ok(())
    }

    /// Withdraws an unaccepted game. Creator only.
    ///
    /// The single stake is pushed straight back to the creator; this is the
    /// one settlement path that bypasses the reward ledger, since only one
    /// party's funds are involved and no fee applies.
    pub fn quit(&mut self, caller: &AccountId, id: GameId) -> Result<()> {
        let game = self.games.get(id).ok_or(EngineError::GameNotFound(id))?;
        ensure_status(game, GameStatus::Created)?;
        if game.player_a != *caller {
            return Err(EngineError::NotCreator(id));
        }
        let asset = game.asset.clone();
        let stake = game.stake_per_side;

        let game = self.games.get_mut(id).ok_or(EngineError::GameNotFound(id))?;
        game.status = GameStatus::Canceled;
        self.active.remove(id);

        // A failed refund unwinds the transition so the stake stays
        // recoverable through a retried quit.
        if let Err(err) = self.bank.push(&asset, caller, stake) {
            let game = self.games.get_mut(id).ok_or(EngineError::GameNotFound(id))?;
            game.status = GameStatus::Created;
            self.active.insert(id);
            return Err(err);
        }

        tracing::info!("Game {} quit by creator {}, stake refunded", id, caller);
        self.emit(Event::GameCanceled { id });
        Ok(())
    }

    /// Force-expires an accepted game whose deadline has passed. Callable by
    /// anyone; `now` is the caller-observed block time.
    pub fn cancel_expired_game(&mut self, id: GameId, now: DateTime<Utc>) -> Result<()> {
        let game = self.games.get(id).ok_or(EngineError::GameNotFound(id))?;
        ensure_status(game, GameStatus::Accepted)?;
        let deadline = game.expire_time.ok_or(EngineError::WrongStatus {
            id,
            status: game.status,
            expected: GameStatus::Accepted,
        })?;
        if now < deadline {
            return Err(EngineError::NotYetExpired { id, deadline });
        }
        self.settle_cancellation(id, true)
    }

    /// Cancels an accepted game. Authority only.
    pub fn cancel_game(&mut self, caller: &AccountId, id: GameId) -> Result<()> {
        self.require_authority(caller)?;
        let game = self.games.get(id).ok_or(EngineError::GameNotFound(id))?;
        ensure_status(game, GameStatus::Accepted)?;
        self.settle_cancellation(id, false)
    }

    /// Shared cancellation settlement: splits the combined pot back into the
    /// two original stakes and credits each to its owner's ledger entry. No
    /// fee is charged, fees only apply to decided outcomes.
    fn settle_cancellation(&mut self, id: GameId, expired: bool) -> Result<()> {
        let game = self.games.get(id).ok_or(EngineError::GameNotFound(id))?;
        ensure_status(game, GameStatus::Accepted)?;
        let asset = game.asset.clone();
        let stake = game.stake_per_side;
        let player_a = game.player_a.clone();
        let player_b = game.player_b.clone().ok_or(EngineError::WrongStatus {
            id,
            status: game.status,
            expected: GameStatus::Accepted,
        })?;

        let game = self.games.get_mut(id).ok_or(EngineError::GameNotFound(id))?;
        game.status = GameStatus::Canceled;
        self.active.remove(id);

        self.ledger.credit(&player_a, &asset, stake);
        self.ledger.credit(&player_b, &asset, stake);

        tracing::info!(
            "Game {} canceled{}, both stakes credited to the ledger",
            id,
            if expired { " (expired)" } else { "" }
        );
        if expired {
            self.emit(Event::GameExpired { id });
        }
        self.emit(Event::GameCanceled { id });
        Ok(())
    }

    /// Settles an accepted game with the oracle's random values. Authority
    /// only.
    ///
    /// The first value is reduced to a side by parity; the winner's net
    /// prize (combined pot minus fee) is credited to the ledger and the fee
    /// is pushed straight to the authority as the protocol's fee sink.
    pub fn fulfill_random_number(
        &mut self,
        caller: &AccountId,
        id: GameId,
        values: &[u64],
    ) -> Result<()> {
        self.require_authority(caller)?;
        let value = *values.first().ok_or(EngineError::MissingRandomness)?;

        let game = self.games.get(id).ok_or(EngineError::GameNotFound(id))?;
        ensure_status(game, GameStatus::Accepted)?;
        let asset = game.asset.clone();
        let player_a = game.player_a.clone();
        let player_b = game.player_b.clone().ok_or(EngineError::WrongStatus {
            id,
            status: game.status,
            expected: GameStatus::Accepted,
        })?;
        let pot = game.stake_per_side * 2;
        let fee = pot as u128 * game.fee_rate as u128 / FEE_SCALE as u128;
        let fee = fee as u64;
        let prize = pot - fee;
        let winning_side = Side::from_random(value);
        let winner = if game.bet_a == winning_side {
            player_a
        } else {
            player_b
        };

        let game = self.games.get_mut(id).ok_or(EngineError::GameNotFound(id))?;
        game.win_bet = Some(winning_side);
        game.status = GameStatus::Finished;
        self.active.remove(id);

        // Escrowed funds always cover the fee with a conforming bank; if the
        // push still fails, unwind the transition so the game can be settled
        // again.
        let authority = self.authority.clone();
        if let Err(err) = self.bank.push(&asset, &authority, fee) {
            let game = self.games.get_mut(id).ok_or(EngineError::GameNotFound(id))?;
            game.win_bet = None;
            game.status = GameStatus::Accepted;
            self.active.insert(id);
            return Err(err);
        }
        self.ledger.credit(&winner, &asset, prize);

        tracing::info!(
            "Game {} finished: {} wins {} (fee {})",
            id,
            winner,
            prize,
            fee
        );
        self.emit(Event::GameFinished {
            id,
            winner,
            winning_side,
            prize,
            fee,
        });
        Ok(())
    }

    /// Withdraws the caller's full ledger balance for `asset`.
    ///
    /// The balance is read and zeroed before the transfer so a re-entrant
    /// call can never withdraw twice; a failed push re-credits the ledger so
    /// the operation stays all-or-nothing. Succeeds (and notifies) even when
    /// nothing is owed.
    pub fn withdraw(&mut self, caller: &AccountId, asset: &Asset) -> Result<u64> {
        let amount = self.ledger.take(caller, asset);
        if let Err(err) = self.bank.push(asset, caller, amount) {
            self.ledger.credit(caller, asset, amount);
            return Err(err);
        }

        tracing::info!("{} withdrew {} {}", caller, amount, asset);
        self.emit(Event::Withdraw {
            account: caller.clone(),
            asset: asset.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Paginates full history in creation order. Returns the true total
    /// count alongside the clamped page.
    pub fn list(&self, offset: usize, limit: usize) -> (usize, Vec<Game>) {
        (self.games.len(), self.games.page(offset, limit).to_vec())
    }

    /// Paginates the active set. Returns the true active count alongside the
    /// clamped page; ordering is unspecified after any removal.
    pub fn list_active(&self, offset: usize, limit: usize) -> (usize, Vec<Game>) {
        let page = self
            .active
            .page(offset, limit)
            .iter()
            .filter_map(|&id| self.games.get(id).cloned())
            .collect();
        (self.active.len(), page)
    }

    /// Withdrawable ledger balance for `(account, asset)`.
    pub fn rewards(&self, account: &AccountId, asset: &Asset) -> u64 {
        self.ledger.balance(account, asset)
    }

    pub fn game(&self, id: GameId) -> Option<&Game> {
        self.games.get(id)
    }

    pub fn total_count(&self) -> usize {
        self.games.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, id: GameId) -> bool {
        self.active.contains(id)
    }

    pub fn authority(&self) -> &AccountId {
        &self.authority
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Drains the queued lifecycle notifications.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn require_authority(&self, caller: &AccountId) -> Result<()> {
        if *caller != self.authority {
            return Err(EngineError::NotAuthority);
        }
        Ok(())
    }

    fn emit(&mut self, event: Event) {
        tracing::debug!(?event, "lifecycle event");
        self.events.push(event);
    }
}

fn ensure_status(game: &Game, expected: GameStatus) -> Result<()> {
    if game.status != expected {
        return Err(EngineError::WrongStatus {
            id: game.id,
            status: game.status,
            expected,
        });
    }
    Ok(())
}
