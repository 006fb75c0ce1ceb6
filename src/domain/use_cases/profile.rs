use sqlx::PgPool;
use tracing::{error, info};

use crate::{
    db::unit_of_work::UnitOfWork,
    entities::{
        dev_profile::{DevProfile, DevProfileData, DevProfileInput, DevProfileView},
        file::{AttachmentMode, FileForeignKey, FileRecord},
    },
    errors::AppError,
    repositories::{file::FileRepository, profile::ProfileRepository},
    storage::uploads::{UploadRules, UploadedFile},
    use_cases::attachments::FileAttachmentService,
};

/// A single-file slot on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAsset {
    Avatar,
    Resume,
}

impl ProfileAsset {
    pub fn field(self) -> &'static str {
        match self {
            ProfileAsset::Avatar => "avatar",
            ProfileAsset::Resume => "resume",
        }
    }

    pub fn foreign_key(self) -> FileForeignKey {
        match self {
            ProfileAsset::Avatar => FileForeignKey::ProfileAvatar,
            ProfileAsset::Resume => FileForeignKey::ProfileResume,
        }
    }
}

pub struct ProfileHandler<R, F>
where
    R: ProfileRepository,
    F: FileRepository,
{
    pub pool: PgPool,
    pub profile_repo: R,
    pub attachments: FileAttachmentService<F>,
    pub avatar_rules: UploadRules,
    pub resume_rules: UploadRules,
}

impl<R, F> ProfileHandler<R, F>
where
    R: ProfileRepository,
    F: FileRepository,
{
    pub fn new(
        pool: PgPool,
        profile_repo: R,
        attachments: FileAttachmentService<F>,
        avatar_rules: UploadRules,
        resume_rules: UploadRules,
    ) -> Self {
        ProfileHandler { pool, profile_repo, attachments, avatar_rules, resume_rules }
    }

    pub async fn current(&self) -> Result<DevProfile, AppError> {
        self.profile_repo.current().await
    }

    pub async fn edit_data(&self) -> Result<DevProfileView, AppError> {
        self.profile_repo.view().await
    }

    pub async fn update(&self, input: &DevProfileInput) -> Result<DevProfile, AppError> {
        let data = DevProfileData::try_from(input)?;
        let profile = self.profile_repo.update_profile(&data).await?;

        info!(profile_id = profile.id, "Profile updated");
        Ok(profile)
    }

    fn rules(&self, asset: ProfileAsset) -> &UploadRules {
        match asset {
            ProfileAsset::Avatar => &self.avatar_rules,
            ProfileAsset::Resume => &self.resume_rules,
        }
    }

    /// Stores the upload in the slot and releases whatever it replaced.
    pub async fn upload(&self, asset: ProfileAsset, upload: Option<UploadedFile>) -> Result<FileRecord, AppError> {
        let field = asset.field();
        let upload = upload.ok_or_else(|| AppError::invalid_field(field, format!("The {} field is required.", field)))?;
        let rules = self.rules(asset);
        rules.check(field, std::slice::from_ref(&upload))?;

        let profile = self.profile_repo.current().await?;
        let mode = AttachmentMode::OneToOne { foreign_key: asset.foreign_key() };

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let mut stored = self
                .attachments
                .upload(&mut uow, &profile, std::slice::from_ref(&upload), rules.kind, mode)
                .await?;
            stored
                .pop()
                .ok_or_else(|| AppError::InternalError(format!("No {} was stored", field)))
        }
        .await;

        let file = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(profile_id = profile.id, asset = field, error = %e, "Profile upload failed"))?;

        info!(profile_id = profile.id, asset = field, file_id = file.id, "Profile file uploaded");
        Ok(file)
    }

    /// Empties the slot. Returns false when it was already empty.
    pub async fn remove(&self, asset: ProfileAsset) -> Result<bool, AppError> {
        let profile = self.profile_repo.current().await?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = self.attachments.clear(&mut uow, &profile, asset.foreign_key()).await;

        let cleared = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(profile_id = profile.id, asset = asset.field(), error = %e, "Profile file removal failed"))?;

        info!(profile_id = profile.id, asset = asset.field(), cleared, "Profile file removed");
        Ok(cleared)
    }
}
