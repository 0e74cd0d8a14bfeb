//! Dense-index side table for player ids. The model addresses players by
//! contiguous index; this maps back to the stable FPL id without hashing in
//! the hot path.

use rustc_hash::FxHashMap;

use crate::domain::PlayerId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdLookup {
    id_to_index: FxHashMap<PlayerId, usize>,
    index_to_id: Vec<PlayerId>,
}

impl IdLookup {
    /// Builds the two-way table, failing with the offending id on a duplicate.
    pub fn build(ids: impl Iterator<Item = PlayerId>) -> Result<Self, PlayerId> {
        let index_to_id: Vec<_> = ids.collect();
        let mut id_to_index =
            FxHashMap::with_capacity_and_hasher(index_to_id.len(), Default::default());
        for (index, &id) in index_to_id.iter().enumerate() {
            if id_to_index.insert(id, index).is_some() {
                return Err(id);
            }
        }
        Ok(Self {
            id_to_index,
            index_to_id,
        })
    }

    pub fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.id_to_index.get(&id).copied()
    }

    pub fn id_at(&self, index: usize) -> Option<PlayerId> {
        self.index_to_id.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.index_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let lookup =
            IdLookup::build([PlayerId(10), PlayerId(3), PlayerId(42)].into_iter()).unwrap();
        assert_eq!(3, lookup.len());
        assert_eq!(Some(1), lookup.index_of(PlayerId(3)));
        assert_eq!(Some(PlayerId(42)), lookup.id_at(2));
        assert_eq!(None, lookup.index_of(PlayerId(99)));
        assert_eq!(None, lookup.id_at(3));
    }

    #[test]
    fn rejects_duplicates() {
        let result = IdLookup::build([PlayerId(1), PlayerId(2), PlayerId(1)].into_iter());
        assert_eq!(Err(PlayerId(1)), result);
    }
}
