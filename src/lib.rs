use std::sync::Arc;

use sqlx::PgPool;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod shared_repos;

pub use domain::{entities, filters, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{db, storage, utils};

use repositories::sqlx_repo::{
    SqlxCertificationRepo, SqlxFileRepo, SqlxProfileRepo, SqlxProjectRepo, SqlxTechnologyRepo,
    SqlxWorkExperienceRepo,
};
use settings::AppConfig;
use shared_repos::SharedRepositories;
use storage::{
    uploads::{UploadRules, PROFILE_IMAGE_TYPES, PROJECT_IMAGE_TYPES, RESUME_TYPES},
    BlobStore, StorageBackend,
};
use use_cases::{
    attachments::FileAttachmentService,
    certification::CertificationHandler,
    profile::ProfileHandler,
    project::ProjectHandler,
    technology::TechnologyHandler,
    work_experience::WorkExperienceHandler,
};

pub struct AppState {
    pub config: AppConfig,
    pub pool: PgPool,
    pub storage: BlobStore,
    pub project_handler: AppProjectHandler,
    pub certification_handler: AppCertificationHandler,
    pub technology_handler: AppTechnologyHandler,
    pub work_experience_handler: AppWorkExperienceHandler,
    pub profile_handler: AppProfileHandler,
}

pub type AppProjectHandler = ProjectHandler<SqlxProjectRepo, SqlxTechnologyRepo, SqlxFileRepo>;
pub type AppCertificationHandler = CertificationHandler<SqlxCertificationRepo, SqlxTechnologyRepo, SqlxFileRepo>;
pub type AppTechnologyHandler = TechnologyHandler<SqlxTechnologyRepo>;
pub type AppWorkExperienceHandler = WorkExperienceHandler<SqlxWorkExperienceRepo>;
pub type AppProfileHandler = ProfileHandler<SqlxProfileRepo, SqlxFileRepo>;

impl AppState {
    pub fn new(config: &AppConfig, pool: PgPool, backend: Arc<dyn StorageBackend>) -> Self {
        let storage = BlobStore::new(backend, config.storage_public_url.clone());
        let repos = SharedRepositories::new(pool.clone(), storage.public_prefix());
        let attachments = || FileAttachmentService::new(repos.file_repo.clone(), storage.clone());

        let project_handler = ProjectHandler::new(
            pool.clone(),
            repos.project_repo.clone(),
            repos.technology_repo.clone(),
            attachments(),
            UploadRules::images(PROJECT_IMAGE_TYPES, config.max_image_kb),
        );

        let certification_handler = CertificationHandler::new(
            pool.clone(),
            repos.certification_repo.clone(),
            repos.technology_repo.clone(),
            attachments(),
            UploadRules::images(PROFILE_IMAGE_TYPES, config.max_image_kb).at_most(1),
        );

        let profile_handler = ProfileHandler::new(
            pool.clone(),
            repos.profile_repo.clone(),
            attachments(),
            UploadRules::images(PROFILE_IMAGE_TYPES, config.max_image_kb).at_most(1),
            UploadRules::documents(RESUME_TYPES, config.max_document_kb).at_most(1),
        );

        AppState {
            config: config.clone(),
            technology_handler: TechnologyHandler::new(repos.technology_repo.clone()),
            work_experience_handler: WorkExperienceHandler::new(repos.work_experience_repo.clone()),
            project_handler,
            certification_handler,
            profile_handler,
            storage,
            pool,
        }
    }
}
