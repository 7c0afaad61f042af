//! # Movie Catalog
//!
//! The CSV-backed movie store and everything that reads or writes it.
//!
//! - [`RecordStore`] owns the file; nothing else opens it
//! - [`QueryEngine`] answers read-only questions by full scan
//! - [`MutationCoordinator`] runs validated create/update/delete cycles
//!
//! There is no cache: every operation reloads the file, so the file on disk
//! is always the source of truth.

mod csv;
pub mod errors;
pub mod mutation;
pub mod query;
pub mod record;
pub mod store;
pub mod validator;

use std::path::PathBuf;
use std::sync::Arc;

pub use errors::{CatalogError, CatalogResult, ErrorKind};
pub use mutation::MutationCoordinator;
pub use query::{
    DurationFilter, DurationReport, GenreStats, Metrics, Page, PageRequest, QueryEngine,
    RatingFilter, SortKey, YearFilter,
};
pub use record::MovieRecord;
pub use store::RecordStore;
pub use validator::{MoviePatch, MovieValidator};

/// Read and write halves over one shared store
#[derive(Debug)]
pub struct MovieCatalog {
    store: Arc<RecordStore>,
    query: QueryEngine,
    mutations: MutationCoordinator,
}

impl MovieCatalog {
    /// Catalog over the file at `path`, validating against the real clock.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_validator(path, MovieValidator::new())
    }

    pub fn with_validator(path: impl Into<PathBuf>, validator: MovieValidator) -> Self {
        let store = Arc::new(RecordStore::new(path));
        Self {
            query: QueryEngine::new(store.clone()),
            mutations: MutationCoordinator::new(store.clone(), validator),
            store,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn query(&self) -> &QueryEngine {
        &self.query
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }
}
