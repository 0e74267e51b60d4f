//! Legacy id to new id translation tables.
use std::collections::HashMap;

use ledger_migrate_shared::{EntityKind, LegacyId, NewId};

/// Mapping from legacy identifiers to new-store identifiers for one entity type.
///
/// Grows monotonically for the duration of a run; there is no removal.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    ids: HashMap<LegacyId, NewId>,
}

impl IdentityMap {
    pub fn resolve(&self, legacy_id: &str) -> Option<NewId> {
        self.ids.get(legacy_id).copied()
    }

    /// Records a pair. A legacy id that is already mapped keeps its first new id.
    pub fn insert(&mut self, legacy_id: impl Into<LegacyId>, new_id: NewId) {
        self.ids.entry(legacy_id.into()).or_insert(new_id);
    }

    /// Seeds the map from pairs already present in the new store.
    ///
    /// Returns how many pairs were added.
    pub fn seed(&mut self, pairs: impl IntoIterator<Item = (LegacyId, NewId)>) -> usize {
        let before = self.ids.len();
        for (legacy_id, new_id) in pairs {
            self.insert(legacy_id, new_id);
        }
        self.ids.len() - before
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One identity map per entity type.
#[derive(Debug, Default, Clone)]
pub struct IdentityMaps {
    accounts: IdentityMap,
    categories: IdentityMap,
    sheets: IdentityMap,
    transactions: IdentityMap,
}

impl IdentityMaps {
    pub fn resolve(&self, kind: EntityKind, legacy_id: &str) -> Option<NewId> {
        self.get(kind).resolve(legacy_id)
    }

    pub fn get(&self, kind: EntityKind) -> &IdentityMap {
        match kind {
            EntityKind::Account => &self.accounts,
            EntityKind::Category => &self.categories,
            EntityKind::Sheet => &self.sheets,
            EntityKind::Transaction => &self.transactions,
        }
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> &mut IdentityMap {
        match kind {
            EntityKind::Account => &mut self.accounts,
            EntityKind::Category => &mut self.categories,
            EntityKind::Sheet => &mut self.sheets,
            EntityKind::Transaction => &mut self.transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_resolve_after_insert() {
        let mut map = IdentityMap::default();
        let id = Uuid::new_v4();
        map.insert("u1", id);

        assert_eq!(map.resolve("u1"), Some(id));
        assert_eq!(map.resolve("u2"), None);
    }

    #[test]
    fn test_first_mapping_wins() {
        let mut map = IdentityMap::default();
        let first = Uuid::new_v4();
        map.insert("u1", first);
        map.insert("u1", Uuid::new_v4());

        assert_eq!(map.resolve("u1"), Some(first));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_seed_counts_new_pairs_only() {
        let mut map = IdentityMap::default();
        map.insert("u1", Uuid::new_v4());

        let added = map.seed(vec![
            ("u1".to_string(), Uuid::new_v4()),
            ("u2".to_string(), Uuid::new_v4()),
        ]);
        assert_eq!(added, 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_maps_are_separate_per_kind() {
        let mut maps = IdentityMaps::default();
        let id = Uuid::new_v4();
        maps.get_mut(EntityKind::Sheet).insert("x1", id);

        assert_eq!(maps.resolve(EntityKind::Sheet, "x1"), Some(id));
        assert_eq!(maps.resolve(EntityKind::Category, "x1"), None);
        assert!(maps.get(EntityKind::Account).is_empty());
    }
}
