//! Concurrent id → record map.

use dashmap::DashMap;

use crate::domain::{Record, RecordId, Status};
use crate::observability::RecordCounts;

/// Concurrent mapping from id to record.
///
/// Everything returned is a clone; callers never get references into the map.
/// Readers may observe a write that is in flight under a row lock
/// (last write wins), nothing stronger.
#[derive(Default)]
pub struct KeyedStore {
    records: DashMap<RecordId, Record>,
}

impl KeyedStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn get(&self, id: RecordId) -> Option<Record> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Visit records until `visit` returns `false`. Order is unspecified.
    ///
    /// Records are copied out first and `visit` runs with no shard guard
    /// held, so a slow visitor never stalls writers (and may itself write).
    /// Writes landing during the walk are not seen.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&Record) -> bool,
    {
        for record in self.snapshot() {
            if !visit(&record) {
                break;
            }
        }
    }

    /// Copy of every record, in no particular order.
    ///
    /// Each shard is read-locked only while its entries are cloned.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Insert or overwrite the entry for `record.id`.
    pub fn store(&self, record: Record) {
        self.records.insert(record.id, record);
    }

    /// Read-modify-write of one entry. Returns the new value, or `None` when
    /// the id is absent (nothing is inserted).
    pub fn update_with<F>(&self, id: RecordId, f: F) -> Option<Record>
    where
        F: FnOnce(&mut Record),
    {
        let mut entry = self.records.get_mut(&id)?;
        f(entry.value_mut());
        Some(entry.value().clone())
    }

    /// Remove if present; reports whether it was.
    pub fn delete(&self, id: RecordId) -> bool {
        self.records.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records per status.
    pub fn counts(&self) -> RecordCounts {
        let mut counts = RecordCounts::default();
        for entry in self.records.iter() {
            match entry.value().status {
                Status::Incomplete => counts.incomplete += 1,
                Status::Completed => counts.completed += 1,
            }
        }
        counts
    }
}
