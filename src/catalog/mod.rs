//! Leaderboard catalog: one immutable snapshot at a time, swapped whole on refresh.

mod load;

use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::Serialize;
use tracing::info;

use crate::error::CoreResult;
use crate::model::{Modality, ModelRecord};

pub use load::load_dir;
#[cfg(test)]
pub(crate) use load::load_tables;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSource {
    pub modality: Modality,
    pub source: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    records: Vec<ModelRecord>,
    sources: Vec<CatalogSource>,
    loaded_at: String,
}

impl Catalog {
    /// Records ordered by model name.
    pub fn all_records(&self) -> &[ModelRecord] {
        &self.records
    }

    pub fn sources(&self) -> &[CatalogSource] {
        &self.sources
    }

    pub fn loaded_at(&self) -> &str {
        &self.loaded_at
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn count_with(&self, modality: Modality) -> usize {
        self.records
            .iter()
            .filter(|record| record.score(modality).is_some())
            .count()
    }
}

#[derive(Debug)]
pub struct CatalogStore {
    snapshot: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Loads `dir` fully before swapping; on error the current snapshot stays published.
    pub fn refresh(&self, dir: &Path) -> CoreResult<Arc<Catalog>> {
        let next = Arc::new(load_dir(dir)?);
        self.publish(Arc::clone(&next));
        info!(source = %dir.display(), records = next.record_count(), "catalog snapshot replaced");
        Ok(next)
    }

    fn publish(&self, next: Arc<Catalog>) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}

static GLOBAL_CATALOG: OnceLock<CatalogStore> = OnceLock::new();

/// Loads the process-wide catalog, or refreshes it when already initialized.
pub fn init_global(dir: &Path) -> CoreResult<&'static CatalogStore> {
    if let Some(store) = GLOBAL_CATALOG.get() {
        store.refresh(dir)?;
        return Ok(store);
    }

    let fresh = Arc::new(load_dir(dir)?);
    let store = GLOBAL_CATALOG.get_or_init(|| CatalogStore {
        snapshot: RwLock::new(Arc::clone(&fresh)),
    });
    // A concurrent initializer may have won; the newest load is published either way.
    store.publish(Arc::clone(&fresh));
    info!(source = %dir.display(), records = fresh.record_count(), "catalog initialized");

    Ok(store)
}
