use crate::types::{Game, GameId};

/// Append-only record of every game ever created, addressed by id.
///
/// The single source of truth for game state: ids are indexes into the
/// backing vector, assigned sequentially and never reused. Records are
/// mutated only through the engine's transition functions and never deleted,
/// so full-history enumeration is insertion-ordered and immutable.
#[derive(Debug, Default, Clone)]
pub struct GameStore {
    games: Vec<Game>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next created game will receive.
    pub fn next_id(&self) -> GameId {
        self.games.len() as GameId
    }

    pub fn push(&mut self, game: Game) {
        debug_assert_eq!(game.id, self.next_id());
        self.games.push(game);
    }

    pub fn get(&self, id: GameId) -> Option<&Game> {
        self.games.get(id as usize)
    }

    pub(crate) fn get_mut(&mut self, id: GameId) -> Option<&mut Game> {
        self.games.get_mut(id as usize)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Page of history clamped to `[offset, min(offset + limit, len))`.
    /// An offset at or past the end, or a zero limit, yields an empty page.
    pub fn page(&self, offset: usize, limit: usize) -> &[Game] {
        let start = offset.min(self.games.len());
        let end = offset.saturating_add(limit).min(self.games.len());
        &self.games[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, GameStatus, Side};

    fn game(id: GameId) -> Game {
        Game {
            id,
            asset: Asset::Native,
            stake_per_side: 10,
            fee_rate: 100,
            player_a: "alice".to_string(),
            player_b: None,
            bet_a: Side::Heads,
            win_bet: None,
            status: GameStatus::Created,
            expire_time: None,
        }
    }

    fn store_with(n: u64) -> GameStore {
        let mut store = GameStore::new();
        for id in 0..n {
            store.push(game(id));
        }
        store
    }

    #[test]
    fn test_ids_are_sequential() {
        let store = store_with(3);
        assert_eq!(store.next_id(), 3);
        assert_eq!(store.get(0).unwrap().id, 0);
        assert_eq!(store.get(2).unwrap().id, 2);
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_page_returns_creation_order() {
        let store = store_with(5);
        let ids: Vec<GameId> = store.page(0, 10).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_page_clamping() {
        let store = store_with(5);
        assert_eq!(store.page(3, 10).len(), 2);
        assert_eq!(store.page(5, 1).len(), 0);
        assert_eq!(store.page(99, 1).len(), 0);
        assert_eq!(store.page(0, 0).len(), 0);
        assert_eq!(store.page(2, 2).iter().map(|g| g.id).collect::<Vec<_>>(), vec![2, 3]);
    }
}
