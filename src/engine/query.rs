//! Snapshot iteration over every record matching a query schema.
//!
//! [`EntityTypeIter`] captures, at construction time, the set of entity
//! arrays whose schema is a superset of the query schema and whose published
//! record count is nonzero. The sequence it yields is the flat concatenation
//! of each captured array's `[0, count)` range.
//!
//! ## Snapshot semantics
//!
//! - Arrays created after the iterator exists are not visible to it.
//! - Per-array counts are the published counts at construction: records
//!   created mid-block become visible only after the next integration phase,
//!   and records deleted mid-block stay visible until it.
//! - The iterator is finite and restartable by constructing a new one.
//!
//! ## Concurrency
//!
//! No locking protects ad hoc iteration. Iterating while mutating the
//! underlying arrays outside the block/worker machinery (appending or
//! deleting) is a contract violation.

use crate::engine::entity::EntityRef;
use crate::engine::storage::EntityArray;

/// Lazily yields an [`EntityRef`] for every record in a snapshot of matching
/// arrays.
pub struct EntityTypeIter<'a> {
    arrays: Vec<(&'a EntityArray, usize)>,
    position: usize,
    index: usize,
}

impl<'a> EntityTypeIter<'a> {
    /// Builds an iterator over `arrays`, each paired with the record count to
    /// walk.
    pub(crate) fn new(arrays: Vec<(&'a EntityArray, usize)>) -> Self {
        Self {
            arrays,
            position: 0,
            index: 0,
        }
    }

    /// Number of arrays captured by the snapshot.
    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    /// Total records the snapshot will yield.
    pub fn record_count(&self) -> usize {
        self.arrays.iter().map(|(_, count)| count).sum()
    }
}

impl<'a> Iterator for EntityTypeIter<'a> {
    type Item = EntityRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.arrays.len() {
            let (array, count) = self.arrays[self.position];
            if self.index < count {
                let record = EntityRef::new(array, self.index);
                self.index += 1;
                return Some(record);
            }
            self.position += 1;
            self.index = 0;
        }
        None
    }
}
