use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::DirectoryError;
use crate::models::garage::{GarageRecord, GarageStatus};
use crate::store::{GarageCollection, GarageFilter};

struct Entry {
    seq: u64,
    record: GarageRecord,
}

/// Garage documents held in memory.
///
/// Queries return documents in insertion order, which is the tie-break order
/// callers see for equal distances.
#[derive(Default)]
pub struct InMemoryGarages {
    entries: DashMap<String, Entry>,
    next_seq: AtomicU64,
}

impl InMemoryGarages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores a document as-is. A blank id gets a fresh one. An existing id
    /// is overwritten but keeps its original position.
    pub fn insert_record(&self, mut record: GarageRecord) -> GarageRecord {
        if record.id.trim().is_empty() {
            record.id = Uuid::new_v4().to_string();
        }

        let seq = match self.entries.get(&record.id) {
            Some(existing) => existing.seq,
            None => self.next_seq.fetch_add(1, Ordering::SeqCst),
        };
        self.entries.insert(
            record.id.clone(),
            Entry {
                seq,
                record: record.clone(),
            },
        );
        record
    }

    pub fn get(&self, id: &str) -> Option<GarageRecord> {
        self.entries.get(id).map(|entry| entry.record.clone())
    }

    pub fn list(&self) -> Vec<GarageRecord> {
        self.ordered(|_| true)
    }

    /// Records a moderation decision. The rejection reason is kept only for
    /// rejected garages.
    pub fn set_status(
        &self,
        id: &str,
        status: GarageStatus,
        rejection_reason: Option<String>,
    ) -> Option<GarageRecord> {
        self.update(id, |record| {
            record.status = Some(status);
            record.rejection_reason = match status {
                GarageStatus::Rejected => rejection_reason,
                _ => None,
            };
            record.reviewed_at = Some(Utc::now());
        })
    }

    pub fn set_active(&self, id: &str, is_active: bool) -> Option<GarageRecord> {
        self.update(id, |record| record.is_active = Some(is_active))
    }

    pub fn remove(&self, id: &str) -> Option<GarageRecord> {
        self.entries.remove(id).map(|(_, entry)| entry.record)
    }

    fn update<F>(&self, id: &str, apply: F) -> Option<GarageRecord>
    where
        F: FnOnce(&mut GarageRecord),
    {
        let mut entry = self.entries.get_mut(id)?;
        apply(&mut entry.record);
        entry.record.updated_at = Some(Utc::now());
        Some(entry.record.clone())
    }

    fn ordered<P>(&self, keep: P) -> Vec<GarageRecord>
    where
        P: Fn(&GarageRecord) -> bool,
    {
        let mut matched: Vec<(u64, GarageRecord)> = self
            .entries
            .iter()
            .filter(|entry| keep(&entry.value().record))
            .map(|entry| (entry.value().seq, entry.value().record.clone()))
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, record)| record).collect()
    }
}

impl GarageCollection for InMemoryGarages {
    fn query(
        &self,
        filter: GarageFilter,
    ) -> BoxFuture<'_, Result<Vec<GarageRecord>, DirectoryError>> {
        Box::pin(async move { Ok(self.ordered(|record| filter.matches(record))) })
    }
}
