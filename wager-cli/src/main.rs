mod commands;
mod config;
mod sim;
mod store;

use clap::{Parser, Subcommand};
use commands::App;
use config::CliConfig;
use sim::{LocalBank, LocalOracle, LocalSettings};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wager_core::{EngineError, WagerEngine};

#[derive(Parser)]
#[command(name = "wager")]
#[command(about = "Peer-to-peer coin-flip wagering on a local simulated chain")]
#[command(version)]
struct Cli {
    /// Data directory for config and state (defaults to the platform data
    /// dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a game and escrow your stake
    Create {
        /// Your account name
        account: String,
        /// Asset to wager ("native" or a token symbol)
        asset: String,
        /// Stake per side
        amount: u64,
        /// Side you bet on ("heads" or "tails")
        side: String,
    },
    /// Accept an open game, taking the opposite side
    Accept {
        /// Your account name
        account: String,
        /// Game to accept
        game_id: u64,
        /// Override the attached native payment (must match the stake)
        #[arg(long)]
        attach: Option<u64>,
    },
    /// Withdraw an unaccepted game you created and get your stake back
    Quit {
        /// Your account name
        account: String,
        /// Game to quit
        game_id: u64,
    },
    /// Cancel an accepted game whose deadline has passed
    Expire {
        /// Game to expire
        game_id: u64,
    },
    /// Cancel an accepted game (authority only)
    Cancel {
        /// Game to cancel
        game_id: u64,
        /// Call as this account instead of the configured authority
        #[arg(long)]
        account: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Deliver the oracle's random value and settle (authority only)
    Fulfill {
        /// Game to settle
        game_id: u64,
        /// Random value to deliver (defaults to the local oracle's draw)
        #[arg(long)]
        value: Option<u64>,
        /// Call as this account instead of the configured authority
        #[arg(long)]
        account: Option<String>,
    },
    /// Withdraw your accumulated rewards for an asset
    Withdraw {
        /// Your account name
        account: String,
        /// Asset to withdraw
        asset: String,
    },
    /// Show withdrawable rewards for an account
    Rewards {
        /// Account to inspect
        account: String,
        /// Asset to inspect
        asset: String,
    },
    /// List games
    List {
        /// Skip this many games
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Page size
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Only games still open or awaiting settlement
        #[arg(long)]
        active: bool,
    },
    /// Show an account's bank balances and rewards
    Balance {
        /// Account to inspect
        account: String,
    },
    /// Fund an account in the simulated bank
    Faucet {
        /// Account to fund
        account: String,
        /// Asset to mint
        asset: String,
        /// Amount to mint
        amount: u64,
    },
    /// Show or edit per-asset settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the settings table
    Show,
    /// Set the fee and minimum stake for an asset
    Set {
        /// Asset to configure
        asset: String,
        /// Authority fee in basis points of the combined pot
        #[arg(long)]
        fee_bps: u64,
        /// Smallest allowed stake per side
        #[arg(long)]
        min_stake: u64,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wager={level},wager_core={level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn load_app(data_dir: Option<PathBuf>) -> anyhow::Result<App> {
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wager"),
    };
    std::fs::create_dir_all(&data_dir)?;

    let config = CliConfig::load_or_init(&data_dir)?;
    let store = store::Store::open(&data_dir.join("wager.db"))?;
    let snapshot = store.load()?;

    let settings = LocalSettings::from_config(&config)?;
    let oracle = LocalOracle::new(config.oracle_seed, config.expiry_secs);
    let bank = LocalBank::restore(snapshot.balances, snapshot.escrow);
    let engine = WagerEngine::with_state(
        config.authority.clone(),
        settings,
        oracle,
        bank,
        snapshot.games,
        snapshot.rewards,
    );

    Ok(App {
        data_dir,
        config,
        store,
        engine,
    })
}

fn run(app: &mut App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Create {
            account,
            asset,
            amount,
            side,
        } => commands::create_game(app, &account, &asset, amount, &side),
        Commands::Accept {
            account,
            game_id,
            attach,
        } => commands::accept_game(app, &account, game_id, attach),
        Commands::Quit { account, game_id } => commands::quit_game(app, &account, game_id),
        Commands::Expire { game_id } => commands::expire_game(app, game_id),
        Commands::Cancel {
            game_id,
            account,
            yes,
        } => commands::cancel_game(app, game_id, account, yes),
        Commands::Fulfill {
            game_id,
            value,
            account,
        } => commands::fulfill_game(app, game_id, value, account),
        Commands::Withdraw { account, asset } => commands::withdraw(app, &account, &asset),
        Commands::Rewards { account, asset } => commands::show_rewards(app, &account, &asset),
        Commands::List {
            offset,
            limit,
            active,
        } => commands::list_games(app, offset, limit, active),
        Commands::Balance { account } => commands::show_balance(app, &account),
        Commands::Faucet {
            account,
            asset,
            amount,
        } => commands::faucet(app, &account, &asset, amount),
        Commands::Settings(SettingsCommands::Show) => commands::show_settings(app),
        Commands::Settings(SettingsCommands::Set {
            asset,
            fee_bps,
            min_stake,
        }) => commands::set_settings(app, &asset, fee_bps, min_stake),
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::InsufficientBalance { need, available }) => {
            eprintln!("Error: insufficient balance (need {}, have {})", need, available);
            eprintln!("Fund the account with: wager faucet <account> <asset> <amount>");
        }
        Some(EngineError::StakeMismatch { expected, attached }) => {
            eprintln!(
                "Error: the attached payment must equal the stake exactly ({} expected, {} attached)",
                expected, attached
            );
        }
        Some(EngineError::NotAuthority) => {
            eprintln!("Error: only the configured authority account may do this");
            eprintln!("See `wager settings show` for the authority account");
        }
        Some(EngineError::NotYetExpired { deadline, .. }) => {
            eprintln!("Error: the game has not reached its deadline yet ({})", deadline);
        }
        _ => eprintln!("Error: {:#}", err),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut app = match load_app(cli.data_dir) {
        Ok(app) => app,
        Err(err) => {
            report(&err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&mut app, cli.command) {
        report(&err);
        std::process::exit(1);
    }
}
