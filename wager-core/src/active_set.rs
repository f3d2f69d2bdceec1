use crate::types::GameId;
use std::collections::HashMap;

/// Unordered index of games still in a non-terminal state.
///
/// Removal is swap-and-pop: the last id moves into the vacated slot, so
/// enumeration order is not stable across removals. Callers paging over the
/// active set must tolerate an arbitrary permutation of the remaining ids;
/// only membership is guaranteed. Insert, remove and membership tests are
/// all O(1) on average.
#[derive(Debug, Default, Clone)]
pub struct ActiveSet {
    ids: Vec<GameId>,
    positions: HashMap<GameId, usize>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: GameId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.ids.len());
        self.ids.push(id);
        true
    }

    /// Swap-and-pop removal. Returns false if the id was not present.
    pub fn remove(&mut self, id: GameId) -> bool {
        let Some(pos) = self.positions.remove(&id) else {
            return false;
        };
        let last = self.ids.len() - 1;
        self.ids.swap(pos, last);
        self.ids.pop();
        if pos < self.ids.len() {
            self.positions.insert(self.ids[pos], pos);
        }
        true
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Page of active ids clamped to `[offset, min(offset + limit, len))`.
    /// An offset at or past the end, or a zero limit, yields an empty page.
    pub fn page(&self, offset: usize, limit: usize) -> &[GameId] {
        let start = offset.min(self.ids.len());
        let end = offset.saturating_add(limit).min(self.ids.len());
        &self.ids[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = GameId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_insert_and_membership() {
        let mut set = ActiveSet::new();
        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(!set.insert(1));
        assert!(set.contains(1));
        assert!(!set.contains(3));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_removal_keeps_a_valid_permutation() {
        let mut set = ActiveSet::new();
        for id in 0..5 {
            set.insert(id);
        }
        assert!(set.remove(1));
        assert!(!set.remove(1));

        let remaining: HashSet<GameId> = set.iter().collect();
        assert_eq!(remaining, HashSet::from([0, 2, 3, 4]));
        // Every surviving id must still be findable through the index.
        for id in [0, 2, 3, 4] {
            assert!(set.contains(id));
        }
    }

    #[test]
    fn test_remove_last_then_reuse_slot() {
        let mut set = ActiveSet::new();
        set.insert(10);
        set.insert(20);
        assert!(set.remove(20));
        assert!(set.remove(10));
        assert!(set.is_empty());
        assert!(set.insert(30));
        assert!(set.contains(30));
    }

    #[test]
    fn test_page_clamping() {
        let mut set = ActiveSet::new();
        for id in 0..4 {
            set.insert(id);
        }
        assert_eq!(set.page(0, 10).len(), 4);
        assert_eq!(set.page(2, 10).len(), 2);
        assert_eq!(set.page(4, 10).len(), 0);
        assert_eq!(set.page(100, 10).len(), 0);
        assert_eq!(set.page(0, 0).len(), 0);
    }
}
