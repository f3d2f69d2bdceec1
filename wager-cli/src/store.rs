//! SQLite snapshot store for the local deployment: game records, reward
//! ledger entries, bank balances and escrow survive between invocations.

use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use wager_core::{AccountId, Asset, Game};

/// Full persisted state of a local deployment.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub games: Vec<Game>,
    pub rewards: Vec<(AccountId, Asset, u64)>,
    pub balances: Vec<(AccountId, Asset, u64)>,
    pub escrow: Vec<(Asset, u64)>,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                record TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS rewards (
                account TEXT NOT NULL,
                asset TEXT NOT NULL,
                amount INTEGER NOT NULL,
                PRIMARY KEY (account, asset)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS balances (
                account TEXT NOT NULL,
                asset TEXT NOT NULL,
                amount INTEGER NOT NULL,
                PRIMARY KEY (account, asset)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS escrow (
                asset TEXT PRIMARY KEY,
                amount INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub fn load(&self) -> anyhow::Result<Snapshot> {
        let conn = self.conn.lock();
        let mut snapshot = Snapshot::default();

        let mut stmt = conn.prepare("SELECT record FROM games ORDER BY id ASC")?;
        let games = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for record in games {
            let game: Game =
                serde_json::from_str(&record?).context("corrupt game record in store")?;
            snapshot.games.push(game);
        }

        let mut stmt = conn.prepare("SELECT account, asset, amount FROM rewards")?;
        let rewards = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for entry in rewards {
            let (account, asset, amount) = entry?;
            snapshot
                .rewards
                .push((account, asset.parse::<Asset>()?, amount as u64));
        }

        let mut stmt = conn.prepare("SELECT account, asset, amount FROM balances")?;
        let balances = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for entry in balances {
            let (account, asset, amount) = entry?;
            snapshot
                .balances
                .push((account, asset.parse::<Asset>()?, amount as u64));
        }

        let mut stmt = conn.prepare("SELECT asset, amount FROM escrow")?;
        let escrow = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for entry in escrow {
            let (asset, amount) = entry?;
            snapshot.escrow.push((asset.parse::<Asset>()?, amount as u64));
        }

        Ok(snapshot)
    }

    /// Replaces the stored snapshot in a single transaction.
    pub fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM games", [])?;
        tx.execute("DELETE FROM rewards", [])?;
        tx.execute("DELETE FROM balances", [])?;
        tx.execute("DELETE FROM escrow", [])?;

        for game in &snapshot.games {
            let record = serde_json::to_string(game)?;
            tx.execute(
                "INSERT INTO games (id, record) VALUES (?1, ?2)",
                params![game.id as i64, record],
            )?;
        }
        for (account, asset, amount) in &snapshot.rewards {
            tx.execute(
                "INSERT INTO rewards (account, asset, amount) VALUES (?1, ?2, ?3)",
                params![account, asset.to_string(), *amount as i64],
            )?;
        }
        for (account, asset, amount) in &snapshot.balances {
            tx.execute(
                "INSERT INTO balances (account, asset, amount) VALUES (?1, ?2, ?3)",
                params![account, asset.to_string(), *amount as i64],
            )?;
        }
        for (asset, amount) in &snapshot.escrow {
            tx.execute(
                "INSERT INTO escrow (asset, amount) VALUES (?1, ?2)",
                params![asset.to_string(), *amount as i64],
            )?;
        }

        tx.commit()?;
        tracing::debug!("Saved snapshot: {} games", snapshot.games.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wager_core::{GameStatus, Side};

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("wager.db")).unwrap();

        let snapshot = Snapshot {
            games: vec![Game {
                id: 0,
                asset: Asset::Token("chip".to_string()),
                stake_per_side: 100,
                fee_rate: 250,
                player_a: "alice".to_string(),
                player_b: Some("bob".to_string()),
                bet_a: Side::Heads,
                win_bet: None,
                status: GameStatus::Accepted,
                expire_time: Some(chrono::Utc::now()),
            }],
            rewards: vec![("alice".to_string(), Asset::Native, 42)],
            balances: vec![("bob".to_string(), Asset::Native, 1_000)],
            escrow: vec![(Asset::Token("chip".to_string()), 200)],
        };
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.games, snapshot.games);
        assert_eq!(loaded.rewards, snapshot.rewards);
        assert_eq!(loaded.balances, snapshot.balances);
        assert_eq!(loaded.escrow, snapshot.escrow);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("wager.db")).unwrap();

        let mut snapshot = Snapshot {
            balances: vec![("alice".to_string(), Asset::Native, 10)],
            ..Default::default()
        };
        store.save(&snapshot).unwrap();

        snapshot.balances = vec![("alice".to_string(), Asset::Native, 99)];
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.balances, vec![("alice".to_string(), Asset::Native, 99)]);
    }
}
