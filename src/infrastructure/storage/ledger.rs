use tracing::warn;

use super::StorageBackend;

/// Blob side effects of one database transaction.
///
/// Blobs are written eagerly while the transaction runs; deletions are only
/// queued. After commit the queued deletions run; after rollback the blobs
/// written under the transaction are removed again.
#[derive(Debug, Default)]
pub struct BlobChanges {
    written: Vec<String>,
    doomed: Vec<String>,
}

impl BlobChanges {
    pub fn record_write(&mut self, path: impl Into<String>) {
        self.written.push(path.into());
    }

    pub fn schedule_delete(&mut self, path: impl Into<String>) {
        self.doomed.push(path.into());
    }

    pub async fn apply_committed(self, backend: &dyn StorageBackend) {
        for path in self.doomed {
            if let Err(e) = backend.delete(&path).await {
                warn!(path = %path, error = %e, "Failed to delete released blob");
            }
        }
    }

    pub async fn apply_rolled_back(self, backend: &dyn StorageBackend) {
        for path in self.written {
            if let Err(e) = backend.delete(&path).await {
                warn!(path = %path, error = %e, "Failed to remove blob of rolled back transaction");
            }
        }
    }
}
