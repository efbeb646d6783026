use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use shopdb_core::catalog::load_catalog;
use shopdb_core::config::IndexSettings;
use shopdb_core::corpus::Corpus;
use shopdb_core::error::Result;
use shopdb_core::traits::CatalogSource;
use shopdb_text::Snapshot;

/// Loads, normalizes and indexes a catalog into a fresh snapshot.
pub fn build_snapshot(source: &dyn CatalogSource, settings: &IndexSettings) -> Result<Snapshot> {
    let catalog = load_catalog(source)?;
    Snapshot::build(Corpus::from(catalog), settings)
}

/// Shared reference to the snapshot currently in service.
///
/// Readers clone the inner `Arc` and keep using it for the whole query, so a
/// swap never changes the corpus or index under them. Rebuilds run outside
/// the read lock and are serialized by `rebuild_lock`.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<Snapshot>>,
    rebuild_lock: Mutex<()>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)), rebuild_lock: Mutex::new(()) }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read())
    }

    /// Runs `build` under the rebuild lock and swaps in its result.
    /// On failure the old snapshot stays in service and the error is returned.
    pub fn rebuild_with<F>(&self, build: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Result<Snapshot>,
    {
        let _guard = self.rebuild_lock.lock();
        match build() {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.current.write() = Arc::clone(&snapshot);
                info!(documents = snapshot.len(), "snapshot swapped");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "rebuild failed; keeping current snapshot");
                Err(e)
            }
        }
    }

    pub fn rebuild(&self, source: &dyn CatalogSource, settings: &IndexSettings) -> Result<Arc<Snapshot>> {
        self.rebuild_with(|| build_snapshot(source, settings))
    }
}
