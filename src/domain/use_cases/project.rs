use sqlx::PgPool;
use tracing::{error, info};
use validator::Validate;

use crate::{
    db::unit_of_work::UnitOfWork,
    entities::{
        file::{AttachmentMode, FileKind, FileRelation},
        pagination::{PageRequest, Paginated},
        project::{Project, ProjectEditData, ProjectInput, ProjectWithRelations},
        technology::{dedupe_ids, TagPivot, Technology},
    },
    errors::AppError,
    filters::FilterParams,
    repositories::{file::FileRepository, project::ProjectRepository, technology::TechnologyRepository},
    storage::uploads::{UploadRules, UploadedFile},
    use_cases::{attachments::FileAttachmentService, technology::check_technology_ids},
};

/// Gallery images: ordered, first upload of an empty gallery featured.
pub const PROJECT_IMAGES: AttachmentMode = AttachmentMode::ManyToMany {
    relation: FileRelation::ProjectFiles,
    track_order: true,
    track_featured: true,
};

pub struct ProjectHandler<P, T, F>
where
    P: ProjectRepository,
    T: TechnologyRepository,
    F: FileRepository,
{
    pub pool: PgPool,
    pub project_repo: P,
    pub technology_repo: T,
    pub attachments: FileAttachmentService<F>,
    pub image_rules: UploadRules,
}

impl<P, T, F> ProjectHandler<P, T, F>
where
    P: ProjectRepository,
    T: TechnologyRepository,
    F: FileRepository,
{
    pub fn new(
        pool: PgPool,
        project_repo: P,
        technology_repo: T,
        attachments: FileAttachmentService<F>,
        image_rules: UploadRules,
    ) -> Self {
        ProjectHandler { pool, project_repo, technology_repo, attachments, image_rules }
    }

    pub async fn index(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<ProjectWithRelations>, AppError> {
        self.project_repo.search_projects(params, page).await
    }

    /// Technologies offered on the create form.
    pub async fn create_form(&self) -> Result<Vec<Technology>, AppError> {
        self.technology_repo.get_all_technologies().await
    }

    pub async fn edit_data(&self, id: i64) -> Result<ProjectEditData, AppError> {
        self.project_repo.get_edit_data(id).await
    }

    async fn validate(&self, input: &ProjectInput, images: &[UploadedFile]) -> Result<(), AppError> {
        AppError::combine([
            input.validate().map_err(AppError::from),
            check_technology_ids(&self.technology_repo, &input.technology_ids).await,
            self.image_rules.check("images", images),
        ])
    }

    /// Creates the project, links its technologies in submitted order and
    /// stores its images, all or nothing.
    pub async fn create(&self, input: ProjectInput, images: Vec<UploadedFile>) -> Result<Project, AppError> {
        self.validate(&input, &images).await?;
        let technology_ids = dedupe_ids(&input.technology_ids);

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let project = self.project_repo.create_project(uow.conn(), &input).await?;
            self.technology_repo
                .sync_links(uow.conn(), TagPivot::Project, project.id, &technology_ids)
                .await?;
            self.attachments
                .upload(&mut uow, &project, &images, FileKind::Image, PROJECT_IMAGES)
                .await?;
            Ok::<_, AppError>(project)
        }
        .await;

        let project = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(error = %e, name = %input.name, images = images.len(), "Project creation failed"))?;

        info!(project_id = project.id, technologies = technology_ids.len(), images = images.len(), "Project created");
        Ok(project)
    }

    /// Updates fields, replaces the technology list and appends new images.
    pub async fn update(&self, id: i64, input: ProjectInput, images: Vec<UploadedFile>) -> Result<Project, AppError> {
        self.validate(&input, &images).await?;
        let technology_ids = dedupe_ids(&input.technology_ids);

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            self.project_repo.find_project_for_update(uow.conn(), id).await?;
            let project = self.project_repo.update_project(uow.conn(), id, &input).await?;
            self.technology_repo
                .sync_links(uow.conn(), TagPivot::Project, project.id, &technology_ids)
                .await?;
            self.attachments
                .upload(&mut uow, &project, &images, FileKind::Image, PROJECT_IMAGES)
                .await?;
            Ok::<_, AppError>(project)
        }
        .await;

        let project = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(project_id = id, error = %e, "Project update failed"))?;

        info!(project_id = id, images = images.len(), "Project updated");
        Ok(project)
    }

    /// Deletes the project and releases images nothing else references.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            self.project_repo.find_project_for_update(uow.conn(), id).await?;
            let file_ids = self
                .attachments
                .file_repo
                .linked_file_ids(uow.conn(), FileRelation::ProjectFiles, id)
                .await?;

            self.project_repo.delete_project(uow.conn(), id).await?;
            self.attachments.release_all(&mut uow, &file_ids).await
        }
        .await;

        let released = uow
            .finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(project_id = id, error = %e, "Project deletion failed"))?;

        info!(project_id = id, released_files = released, "Project deleted");
        Ok(())
    }

    pub async fn detach_image(&self, id: i64, file_id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let project = self.project_repo.find_project_for_update(uow.conn(), id).await?;
            self.attachments
                .detach(&mut uow, &project, FileRelation::ProjectFiles, file_id)
                .await
        }
        .await;

        uow.finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(project_id = id, file_id, error = %e, "Image detach failed"))
    }

    pub async fn set_featured_image(&self, id: i64, file_id: i64) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let project = self.project_repo.find_project_for_update(uow.conn(), id).await?;
            self.attachments
                .set_featured(&mut uow, &project, FileRelation::ProjectFiles, file_id)
                .await
        }
        .await;

        uow.finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(project_id = id, file_id, error = %e, "Setting featured image failed"))
    }

    /// `file_ids` must list every image of the project exactly once.
    pub async fn reorder_images(&self, id: i64, file_ids: &[i64]) -> Result<(), AppError> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let result = async {
            let project = self.project_repo.find_project_for_update(uow.conn(), id).await?;
            self.attachments
                .reorder(&mut uow, &project, FileRelation::ProjectFiles, file_ids)
                .await
        }
        .await;

        uow.finish(self.attachments.backend(), result)
            .await
            .inspect_err(|e| error!(project_id = id, ?file_ids, error = %e, "Image reorder failed"))
    }
}
