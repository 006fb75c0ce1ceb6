use sqlx::PgPool;

use crate::repositories::sqlx_repo::{
    SqlxCertificationRepo, SqlxFileRepo, SqlxProfileRepo, SqlxProjectRepo, SqlxTechnologyRepo,
    SqlxWorkExperienceRepo,
};

/// One of each repository over a shared pool.
#[derive(Clone)]
pub struct SharedRepositories {
    pub file_repo: SqlxFileRepo,
    pub technology_repo: SqlxTechnologyRepo,
    pub project_repo: SqlxProjectRepo,
    pub certification_repo: SqlxCertificationRepo,
    pub work_experience_repo: SqlxWorkExperienceRepo,
    pub profile_repo: SqlxProfileRepo,
}

impl SharedRepositories {
    pub fn new(pool: PgPool, public_url: &str) -> Self {
        SharedRepositories {
            file_repo: SqlxFileRepo::new(pool.clone(), public_url),
            technology_repo: SqlxTechnologyRepo::new(pool.clone()),
            project_repo: SqlxProjectRepo::new(pool.clone(), public_url),
            certification_repo: SqlxCertificationRepo::new(pool.clone(), public_url),
            work_experience_repo: SqlxWorkExperienceRepo::new(pool.clone()),
            profile_repo: SqlxProfileRepo::new(pool, public_url),
        }
    }
}
