use crate::error::LoadError;
use crate::loader::{self, Source};
use crate::store::RecordStore;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A record store shared between threads.
///
/// Readers take cheap snapshots; a reload builds a complete new store without
/// holding any lock and then swaps it in under the write lock. A failed reload
/// leaves the current store untouched.
#[derive(Clone)]
pub struct SharedRecordStore {
    current: Arc<RwLock<Arc<RecordStore>>>,
}

impl SharedRecordStore {
    pub fn new(store: RecordStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// Build the initial store from `sources`
    pub fn load<'a, I>(sources: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = &'a Source>,
    {
        Ok(Self::new(loader::load(sources)?))
    }

    /// The store as of now; later reloads do not affect the snapshot
    pub fn snapshot(&self) -> Arc<RecordStore> {
        self.current.read().clone()
    }

    /// Replace the store with one built from `sources`
    pub fn reload<'a, I>(&self, sources: I) -> Result<(), LoadError>
    where
        I: IntoIterator<Item = &'a Source>,
    {
        let store = loader::load(sources)?;
        self.replace(store);
        Ok(())
    }

    /// Replace the store with one built from a zone data directory
    pub fn reload_directory<P: AsRef<Path>>(&self, directory: P) -> Result<(), LoadError> {
        let store = loader::load_directory(directory)?;
        self.replace(store);
        Ok(())
    }

    fn replace(&self, store: RecordStore) {
        let names = store.len();
        *self.current.write() = Arc::new(store);
        info!(names, "Record store replaced");
    }
}
