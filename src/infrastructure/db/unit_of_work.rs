use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::warn;

use crate::{errors::AppError, storage::{BlobChanges, StorageBackend}};

/// A database transaction paired with the blob changes made under it.
pub struct UnitOfWork {
    pub(crate) tx: Transaction<'static, Postgres>,
    pub(crate) blobs: BlobChanges,
}

impl UnitOfWork {
    pub async fn begin(pool: &PgPool) -> Result<Self, AppError> {
        Ok(UnitOfWork {
            tx: pool.begin().await?,
            blobs: BlobChanges::default(),
        })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Commits on `Ok`, rolls back on `Err`, then settles the blob changes
    /// accordingly. The original error is returned untouched.
    pub async fn finish<T>(
        self,
        backend: &dyn StorageBackend,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        let UnitOfWork { tx, blobs } = self;

        match result {
            Ok(value) => match tx.commit().await {
                Ok(()) => {
                    blobs.apply_committed(backend).await;
                    Ok(value)
                }
                Err(e) => {
                    blobs.apply_rolled_back(backend).await;
                    Err(e.into())
                }
            },
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "Transaction rollback failed");
                }
                blobs.apply_rolled_back(backend).await;
                Err(err)
            }
        }
    }
}
