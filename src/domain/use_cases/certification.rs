use sqlx::PgPool;
use tracing::{error, info};

use crate::{
    db::unit_of_work::UnitOfWork,
    entities::{
        certification::{
            Certification, CertificationData, CertificationEditData, CertificationIndex, CertificationInput,
            CertificationWithRelations,
        },
        file::{AttachmentMode, FileForeignKey, FileKind},
        pagination::{PageRequest, Paginated},
        technology::{dedupe_ids, TagPivot, Technology},
    },
    errors::AppError,
    filters::FilterParams,
    repositories::{certification::CertificationRepository, file::FileRepository, technology::TechnologyRepository},
    storage::uploads::{UploadRules, UploadedFile},
    use_cases::{attachments::FileAttachmentService, technology::check_technology_ids},
};

pub const CERTIFICATION_IMAGE: AttachmentMode = AttachmentMode::OneToOne {
    foreign_key: FileForeignKey::CertificationImage,
};

/// Multipart field carrying the certificate scan.
pub const IMAGE_FIELD: &str = "certificationImage";

pub struct CertificationHandler<C, T, F>
where
    C: CertificationRepository,
    T: TechnologyRepository,
    F: FileRepository,
{
    pub pool: PgPool,
    pub certification_repo: C,
    pub technology_repo: T,
    pub attachments: FileAttachmentService<F>,
    pub image_rules: UploadRules,
}

impl<C, T, F> CertificationHandler<C, T, F>
where
    C: CertificationRepository,
    T: TechnologyRepository,
    F: FileRepository,
{
    pub fn new(
        pool: PgPool,
        certification_repo: C,
        technology_repo: T,
        attachments: FileAttachmentService<F>,
        image_rules: UploadRules,
    ) -> Self {
        CertificationHandler { pool, certification_repo, technology_repo, attachments, image_rules }
    }

    /// A filtered page plus the technology options for the filter form.
    pub async fn index(
        &self,
        params: &FilterParams,
        page: PageRequest,
    ) -> Result<CertificationIndex<Paginated<CertificationWithRelations>>, AppError> {
        let certifications = self.certification_repo.search_certifications(params, page).await?;
        let technologies = self.technology_repo.get_technology_options().await?;

        Ok(CertificationIndex { certifications, technologies })
    }

    pub async fn create_form(&self) -> Result<Vec<Technology>, AppError> {
        self.technology_repo.get_all_technologies().await
    }

    pub async fn edit_data(&self, id: i64) -> Result<CertificationEditData, AppError> {
        self.certification_repo.get_edit_data(id).await
    }

    async fn validate(&self, input: &CertificationInput, images: &[UploadedFile]) -> Result<CertificationData, AppError> {
        let converted = CertificationData::try_from(input);
        let checks = AppError::combine([
            check_technology_ids(&self.technology_repo, &input.technology_ids).await,
            self.image_rules.check(IMAGE_FIELD, images),
        ]);

        match converted {
            Ok(data) => checks.map(|()| data),
            Err(err) => Err(err.merge(checks)),
        }
    }

    pub async fn create(&self, input: CertificationInput, images: Vec<UploadedFile>) -> Result<Certification, AppError> {
        let data = self.validate(&input, &images).await?;
        let technology_ids = dedupe_ids(&data.technology_ids);

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let certification = self.certification_repo.create_certification(uow.conn(), &data).await?;
            self.technology_repo
                .sync_links(uow.conn(), TagPivot::Certification, certification.id, &technology_ids)
                .await?;
            self.attachments
                .upload(&mut uow, &certification, &images, FileKind::Image, CERTIFICATION_IMAGE)
                .await?;
            Ok::<_, AppError>(certification)
        }
        .await;

        let certification = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(error = %e, name = %data.name, "Certification creation failed"))?;

        info!(certification_id = certification.id, "Certification created");
        Ok(certification)
    }

    /// A new image replaces the current one; without one the image is kept.
    pub async fn update(&self, id: i64, input: CertificationInput, images: Vec<UploadedFile>) -> Result<Certification, AppError> {
        let data = self.validate(&input, &images).await?;
        let technology_ids = dedupe_ids(&data.technology_ids);

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            self.certification_repo.find_certification_for_update(uow.conn(), id).await?;
            let certification = self.certification_repo.update_certification(uow.conn(), id, &data).await?;
            self.technology_repo
                .sync_links(uow.conn(), TagPivot::Certification, id, &technology_ids)
                .await?;
            self.attachments
                .upload(&mut uow, &certification, &images, FileKind::Image, CERTIFICATION_IMAGE)
                .await?;
            Ok::<_, AppError>(certification)
        }
        .await;

        let certification = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(certification_id = id, error = %e, "Certification update failed"))?;

        info!(certification_id = id, "Certification updated");
        Ok(certification)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let certification = self.certification_repo.find_certification_for_update(uow.conn(), id).await?;
            self.certification_repo.delete_certification(uow.conn(), id).await?;

            match certification.certification_image_id {
                Some(file_id) => self.attachments.release(&mut uow, file_id).await,
                None => Ok(false),
            }
        }
        .await;

        let released = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(certification_id = id, error = %e, "Certification deletion failed"))?;

        info!(certification_id = id, image_released = released, "Certification deleted");
        Ok(())
    }
}
