use crate::config::CliConfig;
use crate::sim::{LocalBank, LocalOracle, LocalSettings};
use crate::store::{Snapshot, Store};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use std::path::PathBuf;
use wager_core::{
    AccountId, Asset, AssetBank, AssetSettings, EngineError, Event, GameId, Side, WagerEngine,
    FEE_SCALE,
};

pub type LocalEngine = WagerEngine<LocalSettings, LocalOracle, LocalBank>;

/// One loaded local deployment: config, snapshot store and the engine built
/// from the last saved state.
pub struct App {
    pub data_dir: PathBuf,
    pub config: CliConfig,
    pub store: Store,
    pub engine: LocalEngine,
}

impl App {
    /// Writes the engine's current state back to the snapshot store.
    fn persist(&mut self) -> anyhow::Result<()> {
        let snapshot = Snapshot {
            games: self.engine.list(0, usize::MAX).1,
            rewards: self
                .engine
                .ledger()
                .iter()
                .map(|(account, asset, amount)| (account.clone(), asset.clone(), amount))
                .collect(),
            balances: self
                .engine
                .bank()
                .iter_balances()
                .map(|(account, asset, amount)| (account.clone(), asset.clone(), amount))
                .collect(),
            escrow: self
                .engine
                .bank()
                .iter_escrow()
                .map(|(asset, amount)| (asset.clone(), amount))
                .collect(),
        };
        self.store.save(&snapshot)
    }

    fn flush_events(&mut self) -> Vec<Event> {
        let events = self.engine.drain_events();
        for event in &events {
            tracing::debug!(?event, "engine event");
        }
        events
    }

    fn authority_or(&self, account: Option<String>) -> AccountId {
        account.unwrap_or_else(|| self.config.authority.clone())
    }
}

pub fn create_game(
    app: &mut App,
    account: &str,
    asset: &str,
    amount: u64,
    side: &str,
) -> anyhow::Result<()> {
    let asset: Asset = asset.parse()?;
    let side: Side = side.parse()?;
    let account = account.to_string();

    let id = if asset.is_native() {
        // Attached payment: the environment moves the value into escrow
        // before the call and returns it if the call fails.
        app.engine.bank_mut().attach(&account, amount)?;
        match app
            .engine
            .create_game(&account, asset.clone(), 0, side, amount)
        {
            Ok(id) => id,
            Err(err) => {
                app.engine.bank_mut().refund_attached(&account, amount)?;
                return Err(err.into());
            }
        }
    } else {
        app.engine
            .create_game(&account, asset.clone(), amount, side, 0)?
    };

    app.flush_events();
    app.persist()?;

    println!("Created game {}", id);
    println!("Stake: {} {}", amount, asset);
    println!("Your side: {}", side);
    println!();
    println!("Share this command with an opponent:");
    println!("wager accept <their-account> {}", id);
    Ok(())
}

pub fn accept_game(
    app: &mut App,
    account: &str,
    game_id: GameId,
    attach: Option<u64>,
) -> anyhow::Result<()> {
    let account = account.to_string();
    let game = app
        .engine
        .game(game_id)
        .ok_or(EngineError::GameNotFound(game_id))?;
    let asset = game.asset.clone();
    let stake = game.stake_per_side;

    if asset.is_native() {
        // Default to the exact stake; --attach lets you see what happens
        // when the payment does not match.
        let attached = attach.unwrap_or(stake);
        app.engine.bank_mut().attach(&account, attached)?;
        if let Err(err) = app.engine.accept_game(&account, game_id, attached) {
            app.engine.bank_mut().refund_attached(&account, attached)?;
            return Err(err.into());
        }
    } else {
        app.engine.accept_game(&account, game_id, 0)?;
    }

    app.flush_events();
    app.persist()?;

    let deadline = app
        .engine
        .game(game_id)
        .and_then(|g| g.expire_time)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("Accepted game {}: the pot is now {} {}", game_id, stake * 2, asset);
    println!("Awaiting the oracle; expires {}", deadline);
    println!();
    println!("The authority settles with:");
    println!("wager fulfill {}", game_id);
    Ok(())
}

pub fn quit_game(app: &mut App, account: &str, game_id: GameId) -> anyhow::Result<()> {
    let account = account.to_string();
    app.engine.quit(&account, game_id)?;
    app.flush_events();
    app.persist()?;

    println!("Quit game {}; your stake was returned to your balance", game_id);
    Ok(())
}

pub fn expire_game(app: &mut App, game_id: GameId) -> anyhow::Result<()> {
    app.engine.cancel_expired_game(game_id, Utc::now())?;
    app.flush_events();
    app.persist()?;

    println!("Game {} expired and canceled", game_id);
    println!("Both stakes are now withdrawable: wager withdraw <account> <asset>");
    Ok(())
}

pub fn cancel_game(
    app: &mut App,
    game_id: GameId,
    account: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let caller = app.authority_or(account);

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Cancel game {} and credit both stakes back?",
                game_id
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    app.engine.cancel_game(&caller, game_id)?;
    app.flush_events();
    app.persist()?;

    println!("Game {} canceled by the authority", game_id);
    println!("Both stakes are now withdrawable: wager withdraw <account> <asset>");
    Ok(())
}

pub fn fulfill_game(
    app: &mut App,
    game_id: GameId,
    value: Option<u64>,
    account: Option<String>,
) -> anyhow::Result<()> {
    let caller = app.authority_or(account);
    let value = match value {
        Some(value) => value,
        None => {
            let drawn = app.engine.oracle().draw(game_id);
            println!(
                "Oracle draw for game {}: {} (digest {})",
                game_id,
                drawn,
                app.engine.oracle().digest_hex(game_id)
            );
            drawn
        }
    };

    app.engine.fulfill_random_number(&caller, game_id, &[value])?;

    let events = app.flush_events();
    app.persist()?;

    for event in &events {
        if let Event::GameFinished {
            winner,
            winning_side,
            prize,
            fee,
            ..
        } = event
        {
            println!("Game {} finished!", game_id);
            println!("Winning side: {}", winning_side);
            println!("Winner: {} ({} credited to their rewards)", winner, prize);
            println!("Fee paid to authority: {}", fee);
        }
    }
    Ok(())
}

pub fn withdraw(app: &mut App, account: &str, asset: &str) -> anyhow::Result<()> {
    let asset: Asset = asset.parse()?;
    let account = account.to_string();
    let amount = app.engine.withdraw(&account, &asset)?;
    app.flush_events();
    app.persist()?;

    println!("Withdrew {} {} to {}", amount, asset, account);
    if amount == 0 {
        println!("(nothing was owed)");
    }
    Ok(())
}

pub fn show_rewards(app: &App, account: &str, asset: &str) -> anyhow::Result<()> {
    let asset: Asset = asset.parse()?;
    let amount = app.engine.rewards(&account.to_string(), &asset);
    println!("Withdrawable rewards for {}: {} {}", account, amount, asset);
    Ok(())
}

pub fn list_games(
    app: &App,
    offset: usize,
    limit: usize,
    active: bool,
) -> anyhow::Result<()> {
    let (total, page) = if active {
        app.engine.list_active(offset, limit)
    } else {
        app.engine.list(offset, limit)
    };

    if total == 0 {
        println!("No games yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "ID", "Status", "Asset", "Stake", "Pot", "Creator", "Acceptor", "Won by", "Expires",
    ]);

    for game in &page {
        let pot = game
            .combined_pot()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let acceptor = game.player_b.clone().unwrap_or_else(|| "-".to_string());
        let won_by = game
            .win_bet
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let expires = game
            .expire_time
            .map(|d| d.format("%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            game.id.to_string(),
            game.status.to_string(),
            game.asset.to_string(),
            game.stake_per_side.to_string(),
            pot,
            game.player_a.clone(),
            acceptor,
            won_by,
            expires,
        ]);
    }

    if active {
        // Active-set enumeration is unordered by contract; only full
        // history pages in creation order.
        println!("Active games ({} total, unordered):", total);
    } else {
        println!("All games ({} total, creation order):", total);
    }
    println!("{}", table);
    Ok(())
}

pub fn show_balance(app: &App, account: &str) -> anyhow::Result<()> {
    let account = account.to_string();
    let mut assets: Vec<Asset> = app
        .engine
        .bank()
        .balances_for(&account)
        .into_iter()
        .map(|(asset, _)| asset)
        .collect();
    for (acct, asset, _) in app.engine.ledger().iter() {
        if *acct == account && !assets.contains(asset) {
            assets.push(asset.clone());
        }
    }

    if assets.is_empty() {
        println!("No balances for {}", account);
        println!("Fund the account with: wager faucet {} <asset> <amount>", account);
        return Ok(());
    }
    assets.sort_by_key(|a| a.to_string());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Asset", "Balance", "Withdrawable rewards"]);
    for asset in &assets {
        table.add_row(vec![
            asset.to_string(),
            app.engine.bank().balance(asset, &account).to_string(),
            app.engine.rewards(&account, asset).to_string(),
        ]);
    }

    println!("Balances for {}:", account);
    println!("{}", table);
    Ok(())
}

pub fn faucet(app: &mut App, account: &str, asset: &str, amount: u64) -> anyhow::Result<()> {
    let asset: Asset = asset.parse()?;
    let account = account.to_string();
    app.engine.bank_mut().deposit(&account, &asset, amount);
    app.persist()?;

    println!("Funded {} with {} {}", account, amount, asset);
    Ok(())
}

pub fn show_settings(app: &App) -> anyhow::Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Asset", "Fee (bps)", "Minimum stake"]);
    for (asset, settings) in &app.config.assets {
        table.add_row(vec![
            asset.clone(),
            settings.fee_rate.to_string(),
            settings.min_stake.to_string(),
        ]);
    }

    println!("Authority account: {}", app.config.authority);
    println!("Expiry after acceptance: {}s", app.config.expiry_secs);
    println!("{}", table);
    Ok(())
}

pub fn set_settings(
    app: &mut App,
    asset: &str,
    fee_bps: u64,
    min_stake: u64,
) -> anyhow::Result<()> {
    // Validated so the engine never sees an unparseable asset name.
    let parsed: Asset = asset.parse()?;
    if fee_bps > FEE_SCALE {
        return Err(EngineError::InvalidFeeRate {
            fee_rate: fee_bps,
            maximum: FEE_SCALE,
        }
        .into());
    }
    app.config.assets.insert(
        parsed.to_string(),
        AssetSettings {
            fee_rate: fee_bps,
            min_stake,
        },
    );
    app.config.save(&app.data_dir)?;

    println!("Updated settings for {}: fee {} bps, minimum stake {}", parsed, fee_bps, min_stake);
    println!("Games already created keep the fee rate snapshotted at creation.");
    Ok(())
}
