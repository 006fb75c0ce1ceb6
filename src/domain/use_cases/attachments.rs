use std::collections::HashSet;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    db::unit_of_work::UnitOfWork,
    entities::file::{Attachable, AttachmentMode, FileForeignKey, FileKind, FileRecord, FileRelation, NewFile},
    errors::AppError,
    repositories::file::FileRepository,
    storage::{uploads::UploadedFile, BlobStore, StorageBackend},
};

/// Where one upload of a many-to-many batch lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPlan {
    pub sort_order: i32,
    pub is_featured: bool,
}

/// Sort orders continue from `existing_max`; only the first upload of a batch
/// for an owner without files is featured.
pub fn plan_links(
    existing_max: i32,
    existing_count: i64,
    batch_len: usize,
    track_order: bool,
    track_featured: bool,
) -> Vec<LinkPlan> {
    (0..batch_len)
        .map(|index| LinkPlan {
            sort_order: if track_order { existing_max + index as i32 + 1 } else { 0 },
            is_featured: track_featured && existing_count == 0 && index == 0,
        })
        .collect()
}

/// Contiguous `1..N` orders for ids already in the wanted order.
pub fn compacted_orders(file_ids: &[i64]) -> Vec<(i64, i32)> {
    file_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index as i32 + 1))
        .collect()
}

/// Accepts `requested` only when it is a permutation of `current`.
pub fn plan_reorder(current: &[i64], requested: &[i64]) -> Result<Vec<(i64, i32)>, AppError> {
    let requested_set: HashSet<i64> = requested.iter().copied().collect();
    let current_set: HashSet<i64> = current.iter().copied().collect();

    if requested.is_empty() || requested_set.len() != requested.len() || requested_set != current_set {
        return Err(AppError::invalid_field(
            "file_ids",
            "The image order must list every image of the project exactly once.",
        ));
    }

    Ok(compacted_orders(requested))
}

/// Stores uploaded blobs, records their rows and links them to owners.
///
/// Every method works inside the caller's [`UnitOfWork`]; blob deletions are
/// queued on it and only happen once the transaction commits.
pub struct FileAttachmentService<F>
where
    F: FileRepository,
{
    pub file_repo: F,
    pub store: BlobStore,
}

impl<F> FileAttachmentService<F>
where
    F: FileRepository,
{
    pub fn new(file_repo: F, store: BlobStore) -> Self {
        FileAttachmentService { file_repo, store }
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.store.backend()
    }

    /// Stores `uploads` for `owner` and links them according to `mode`.
    pub async fn upload<O: Attachable>(
        &self,
        uow: &mut UnitOfWork,
        owner: &O,
        uploads: &[UploadedFile],
        kind: FileKind,
        mode: AttachmentMode,
    ) -> Result<Vec<FileRecord>, AppError> {
        let owner_id = owner.owner_id();
        let directory = owner.storage_directory();

        match mode {
            AttachmentMode::OneToOne { foreign_key } => {
                let Some(upload) = uploads.first() else {
                    return Ok(Vec::new());
                };

                let previous = self.file_repo.linked_file(uow.conn(), foreign_key, owner_id).await?;
                let file = self.store_upload(uow, &directory, upload, kind).await?;
                self.file_repo
                    .set_linked_file(uow.conn(), foreign_key, owner_id, Some(file.id))
                    .await?;

                if let Some(old_id) = previous.filter(|id| *id != file.id) {
                    self.release(uow, old_id).await?;
                }

                Ok(vec![file])
            }
            AttachmentMode::ManyToMany { relation, track_order, track_featured } => {
                if uploads.is_empty() {
                    return Ok(Vec::new());
                }

                let existing_max = if track_order {
                    self.file_repo.max_sort_order(uow.conn(), relation, owner_id).await?
                } else {
                    0
                };
                let existing_count = if track_featured {
                    self.file_repo.count_linked(uow.conn(), relation, owner_id).await?
                } else {
                    0
                };
                let plans = plan_links(existing_max, existing_count, uploads.len(), track_order, track_featured);

                let mut files = Vec::with_capacity(uploads.len());
                for (upload, plan) in uploads.iter().zip(plans) {
                    let file = self.store_upload(uow, &directory, upload, kind).await?;
                    self.file_repo
                        .link(uow.conn(), relation, owner_id, file.id, plan.sort_order, plan.is_featured)
                        .await?;
                    files.push(file);
                }

                Ok(files)
            }
        }
    }

    /// Unlinks one file from a many-to-many owner and releases it.
    pub async fn detach<O: Attachable>(
        &self,
        uow: &mut UnitOfWork,
        owner: &O,
        relation: FileRelation,
        file_id: i64,
    ) -> Result<(), AppError> {
        let owner_id = owner.owner_id();

        if !self.file_repo.unlink(uow.conn(), relation, owner_id, file_id).await? {
            return Err(AppError::NotFound(format!(
                "File {} is not attached to {} {}",
                file_id,
                O::TABLE,
                owner_id
            )));
        }

        let remaining = self.file_repo.linked_file_ids(uow.conn(), relation, owner_id).await?;
        self.file_repo
            .set_sort_orders(uow.conn(), relation, owner_id, &compacted_orders(&remaining))
            .await?;

        self.release(uow, file_id).await?;
        Ok(())
    }

    /// Clears a one-to-one link. Returns false when nothing was linked.
    pub async fn clear<O: Attachable>(
        &self,
        uow: &mut UnitOfWork,
        owner: &O,
        foreign_key: FileForeignKey,
    ) -> Result<bool, AppError> {
        let owner_id = owner.owner_id();
        let Some(file_id) = self.file_repo.linked_file(uow.conn(), foreign_key, owner_id).await? else {
            return Ok(false);
        };

        self.file_repo.set_linked_file(uow.conn(), foreign_key, owner_id, None).await?;
        self.release(uow, file_id).await?;
        Ok(true)
    }

    pub async fn reorder<O: Attachable>(
        &self,
        uow: &mut UnitOfWork,
        owner: &O,
        relation: FileRelation,
        requested: &[i64],
    ) -> Result<(), AppError> {
        let owner_id = owner.owner_id();
        let current = self.file_repo.linked_file_ids(uow.conn(), relation, owner_id).await?;
        let orders = plan_reorder(&current, requested)?;

        self.file_repo.set_sort_orders(uow.conn(), relation, owner_id, &orders).await
    }

    pub async fn set_featured<O: Attachable>(
        &self,
        uow: &mut UnitOfWork,
        owner: &O,
        relation: FileRelation,
        file_id: i64,
    ) -> Result<(), AppError> {
        let owner_id = owner.owner_id();

        if !self.file_repo.set_featured(uow.conn(), relation, owner_id, file_id).await? {
            return Err(AppError::NotFound(format!(
                "File {} is not attached to {} {}",
                file_id,
                O::TABLE,
                owner_id
            )));
        }
        Ok(())
    }

    /// Deletes the file row once nothing references it, queuing its blob for
    /// deletion. Returns whether the file was removed.
    pub async fn release(&self, uow: &mut UnitOfWork, file_id: i64) -> Result<bool, AppError> {
        let references = self.file_repo.count_references(uow.conn(), file_id).await?;
        if references > 0 {
            debug!(file_id, references, "File still referenced, keeping it");
            return Ok(false);
        }

        let Some(file) = self.file_repo.find_file(uow.conn(), file_id).await? else {
            return Ok(false);
        };

        self.file_repo.delete_file(uow.conn(), file.id).await?;
        uow.blobs.schedule_delete(file.path);
        info!(file_id, "Orphaned file released");
        Ok(true)
    }

    pub async fn release_all(&self, uow: &mut UnitOfWork, file_ids: &[i64]) -> Result<usize, AppError> {
        let mut released = 0;
        for file_id in file_ids {
            if self.release(uow, *file_id).await? {
                released += 1;
            }
        }
        Ok(released)
    }

    async fn store_upload(
        &self,
        uow: &mut UnitOfWork,
        directory: &str,
        upload: &UploadedFile,
        kind: FileKind,
    ) -> Result<FileRecord, AppError> {
        let filename = format!("{}.{}", Uuid::new_v4(), upload.extension());
        let path = format!("{}/{}", directory, filename);

        self.store.backend().write(&path, &upload.content).await?;
        uow.blobs.record_write(path.clone());

        let new_file = NewFile {
            original_name: upload.original_name.clone(),
            filename,
            path,
            mime_type: upload.mime_type.clone(),
            size: upload.size(),
            kind,
        };
        self.file_repo.insert_file(uow.conn(), &new_file).await
    }
}
