use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    entities::dev_profile::{
        DevProfile, DevProfileData, DevProfileView, DEFAULT_EMAIL, DEFAULT_JOB_TITLE, DEFAULT_LONG_DESCRIPTION,
        DEFAULT_SHORT_BIO, PROFILE_ID,
    },
    errors::AppError,
    repositories::{file::load_files_by_id, sqlx_repo::SqlxProfileRepo},
};

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// The singleton profile, created with placeholder values on first use.
    async fn current(&self) -> Result<DevProfile, AppError>;

    async fn update_profile(&self, data: &DevProfileData) -> Result<DevProfile, AppError>;

    /// The profile with its avatar and resume files resolved.
    async fn view(&self) -> Result<DevProfileView, AppError>;
}

impl SqlxProfileRepo {
    pub fn new(pool: PgPool, public_url: impl Into<String>) -> Self {
        SqlxProfileRepo { pool, public_url: public_url.into() }
    }
}

#[async_trait]
impl ProfileRepository for SqlxProfileRepo {
    async fn current(&self) -> Result<DevProfile, AppError> {
        sqlx::query(
            r#"
            INSERT INTO dev_profile (id, job_title, short_bio, long_description, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(PROFILE_ID)
        .bind(DEFAULT_JOB_TITLE)
        .bind(DEFAULT_SHORT_BIO)
        .bind(DEFAULT_LONG_DESCRIPTION)
        .bind(DEFAULT_EMAIL)
        .execute(&self.pool)
        .await?;

        let profile = sqlx::query_as::<_, DevProfile>("SELECT * FROM dev_profile WHERE id = $1")
            .bind(PROFILE_ID)
            .fetch_one(&self.pool)
            .await?;

        Ok(profile)
    }

    async fn update_profile(&self, data: &DevProfileData) -> Result<DevProfile, AppError> {
        self.current().await?;

        let profile = sqlx::query_as::<_, DevProfile>(
            r#"
            UPDATE dev_profile
            SET job_title = $1, short_bio = $2, long_description = $3,
                professional_summary = COALESCE($4, professional_summary),
                email = $5, phone = $6, location = $7,
                github_url = $8, linkedin_url = $9, website_url = $10,
                years_experience = $11, languages = $12,
                university = $13, degree = $14, start_date_uni = $15, end_date_uni = $16,
                degree_url = $17, diploma_thesis_url = $18,
                updated_at = NOW()
            WHERE id = $19
            RETURNING *
            "#,
        )
        .bind(&data.job_title)
        .bind(&data.short_bio)
        .bind(&data.long_description)
        .bind(&data.professional_summary)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.location)
        .bind(&data.github_url)
        .bind(&data.linkedin_url)
        .bind(&data.website_url)
        .bind(data.years_experience)
        .bind(&data.languages)
        .bind(&data.university)
        .bind(&data.degree)
        .bind(data.start_date_uni)
        .bind(data.end_date_uni)
        .bind(&data.degree_url)
        .bind(&data.diploma_thesis_url)
        .bind(PROFILE_ID)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn view(&self) -> Result<DevProfileView, AppError> {
        let profile = self.current().await?;

        let ids: Vec<i64> = [profile.avatar_file_id, profile.resume_file_id].into_iter().flatten().collect();
        let files = load_files_by_id(&self.pool, &self.public_url, &ids).await?;
        let pick = |id: Option<i64>| id.and_then(|id| files.iter().find(|f| f.id == id).cloned());

        Ok(DevProfileView {
            avatar: pick(profile.avatar_file_id),
            resume: pick(profile.resume_file_id),
            profile,
        })
    }
}
