pub mod backend;
pub mod ledger;
pub mod uploads;

use std::sync::Arc;

pub use backend::{FilesystemBackend, MemoryBackend, StorageBackend, StorageError};
pub use ledger::BlobChanges;

use crate::entities::file::public_url;

/// A blob backend plus the public prefix its paths are served under.
#[derive(Clone)]
pub struct BlobStore {
    backend: Arc<dyn StorageBackend>,
    public_prefix: String,
}

impl BlobStore {
    pub fn new(backend: Arc<dyn StorageBackend>, public_prefix: impl Into<String>) -> Self {
        BlobStore {
            backend,
            public_prefix: public_prefix.into(),
        }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn url(&self, path: &str) -> String {
        public_url(&self.public_prefix, path)
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("public_prefix", &self.public_prefix)
            .finish_non_exhaustive()
    }
}
