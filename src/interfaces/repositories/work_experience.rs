use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    entities::{
        pagination::{PageRequest, Paginated},
        work_experience::{WorkExperience, WorkExperienceData},
    },
    errors::AppError,
    filters::{work_experience::WORK_EXPERIENCE_FILTERS, FilterParams},
    repositories::sqlx_repo::SqlxWorkExperienceRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkExperienceRepository: Send + Sync {
    async fn create_work_experience(&self, data: &WorkExperienceData) -> Result<WorkExperience, AppError>;
    async fn update_work_experience(&self, id: i64, data: &WorkExperienceData) -> Result<WorkExperience, AppError>;
    async fn delete_work_experience(&self, id: i64) -> Result<(), AppError>;
    async fn get_work_experience_by_id(&self, id: i64) -> Result<WorkExperience, AppError>;
    async fn search_work_experiences(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<WorkExperience>, AppError>;
}

impl SqlxWorkExperienceRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxWorkExperienceRepo { pool }
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Work experience {} not found", id))
}

#[async_trait]
impl WorkExperienceRepository for SqlxWorkExperienceRepo {
    async fn create_work_experience(&self, data: &WorkExperienceData) -> Result<WorkExperience, AppError> {
        let experience = sqlx::query_as::<_, WorkExperience>(
            r#"
            INSERT INTO work_experience (job_title, company_name, company_website, description, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.job_title)
        .bind(&data.company_name)
        .bind(&data.company_website)
        .bind(&data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(experience)
    }

    async fn update_work_experience(&self, id: i64, data: &WorkExperienceData) -> Result<WorkExperience, AppError> {
        sqlx::query_as::<_, WorkExperience>(
            r#"
            UPDATE work_experience
            SET job_title = $1, company_name = $2, company_website = $3, description = $4,
                start_date = $5, end_date = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&data.job_title)
        .bind(&data.company_name)
        .bind(&data.company_website)
        .bind(&data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn delete_work_experience(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM work_experience WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn get_work_experience_by_id(&self, id: i64) -> Result<WorkExperience, AppError> {
        sqlx::query_as::<_, WorkExperience>("SELECT * FROM work_experience WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn search_work_experiences(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<WorkExperience>, AppError> {
        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM work_experience WHERE TRUE");
        WORK_EXPERIENCE_FILTERS.push_predicates(params, &mut count_query);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT work_experience.* FROM work_experience WHERE TRUE");
        WORK_EXPERIENCE_FILTERS.push_predicates(params, &mut query);
        WORK_EXPERIENCE_FILTERS.push_order(params, &mut query);
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let experiences = query.build_query_as::<WorkExperience>().fetch_all(&self.pool).await?;

        Ok(Paginated::new(experiences, page, total))
    }
}
