//! Load-once dataset handle.
//!
//! The dataset is parsed when the handle is opened and released when it is
//! closed. Aggregation requests take [`Arc`] snapshots, so several readers can
//! share one parsed store without re-reading the file.

use super::{load_records, LoadOptions, RecordStore};
use crate::errors::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Dataset {
    source: Option<PathBuf>,
    store: Arc<RecordStore>,
}

impl Dataset {
    /// Parse `path` once and keep the records for the life of the handle.
    pub fn open(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let store = load_records(path, options)?;
        info!(
            path = %path.display(),
            records = store.len(),
            "dataset opened"
        );
        Ok(Self {
            source: Some(path.to_path_buf()),
            store: Arc::new(store),
        })
    }

    /// Wrap a store that was built in memory.
    pub fn from_store(store: RecordStore) -> Self {
        Self {
            source: None,
            store: Arc::new(store),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Shared read-only snapshot of the loaded records.
    pub fn snapshot(&self) -> Arc<RecordStore> {
        Arc::clone(&self.store)
    }

    /// Release the handle. Outstanding snapshots stay valid until dropped.
    pub fn close(self) {
        debug!(
            outstanding = Arc::strong_count(&self.store) - 1,
            "dataset closed"
        );
    }
}
