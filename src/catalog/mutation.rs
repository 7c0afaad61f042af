//! Mutation coordinator
//!
//! Runs each write as one read -> validate -> write cycle against the store.
//! Cycles are serialized through a single mutex so two requests in this
//! process cannot interleave their read and write phases. Writers in other
//! processes are not coordinated.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::observability::{Event, Logger};

use super::errors::{CatalogError, CatalogResult};
use super::record::MovieRecord;
use super::store::RecordStore;
use super::validator::MovieValidator;

/// Write side of the catalog
#[derive(Debug)]
pub struct MutationCoordinator {
    store: Arc<RecordStore>,
    validator: MovieValidator,
    write_lock: Mutex<()>,
}

impl MutationCoordinator {
    pub fn new(store: Arc<RecordStore>, validator: MovieValidator) -> Self {
        Self {
            store,
            validator,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> CatalogResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| CatalogError::Unexpected("Catalog write lock poisoned".to_string()))
    }

    /// Validates `payload` and appends it.
    pub fn create(&self, payload: &Value) -> CatalogResult<MovieRecord> {
        let _guard = self.lock()?;

        let existing = self.store.load_for_write()?;
        let record = self.validator.validate_create(payload, &existing)?;
        self.store.append_one(&record)?;

        Logger::info(
            Event::MovieCreated,
            &[("id", record.id.as_str()), ("title", record.title.as_str())],
        );
        Ok(record)
    }

    /// Merges a validated patch into the movie with exactly this id.
    ///
    /// # Errors
    ///
    /// `not_found` if no movie has `id`; `validation` if the patch is bad.
    /// The lookup happens first, so a bad patch for a missing id reports
    /// `not_found`.
    pub fn update(&self, id: &str, patch: &Value) -> CatalogResult<MovieRecord> {
        let _guard = self.lock()?;

        let mut records = self.store.load_for_write()?;
        let index = position_of(&records, id)?;
        let patch = self.validator.validate_update(patch)?;

        patch.apply(&mut records[index]);
        self.store.rewrite_all(&records)?;

        let updated = records.swap_remove(index);
        Logger::info(Event::MovieUpdated, &[("id", updated.id.as_str())]);
        Ok(updated)
    }

    /// Removes the movie with exactly this id, keeping the others in order.
    pub fn delete(&self, id: &str) -> CatalogResult<MovieRecord> {
        let _guard = self.lock()?;

        let mut records = self.store.load_for_write()?;
        let index = position_of(&records, id)?;
        let removed = records.remove(index);
        self.store.rewrite_all(&records)?;

        Logger::info(
            Event::MovieDeleted,
            &[
                ("id", removed.id.as_str()),
                ("remaining", records.len().to_string().as_str()),
            ],
        );
        Ok(removed)
    }
}

fn position_of(records: &[MovieRecord], id: &str) -> CatalogResult<usize> {
    records
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| CatalogError::not_found(format!("Movie '{}' not found", id)))
}
