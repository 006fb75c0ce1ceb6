use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::{
        certification::{Certification, CertificationData, CertificationEditData, CertificationWithRelations},
        pagination::{PageRequest, Paginated},
        technology::{TagPivot, Technology},
    },
    errors::AppError,
    filters::{certification::CERTIFICATION_FILTERS, FilterParams},
    repositories::{
        file::load_files_by_id,
        sqlx_repo::SqlxCertificationRepo,
        technology::load_linked_technologies,
    },
};

#[async_trait]
pub trait CertificationRepository: Send + Sync {
    async fn create_certification(&self, conn: &mut PgConnection, data: &CertificationData) -> Result<Certification, AppError>;
    async fn update_certification(&self, conn: &mut PgConnection, id: i64, data: &CertificationData) -> Result<Certification, AppError>;
    async fn delete_certification(&self, conn: &mut PgConnection, id: i64) -> Result<(), AppError>;
    async fn find_certification_for_update(&self, conn: &mut PgConnection, id: i64) -> Result<Certification, AppError>;

    async fn search_certifications(
        &self,
        params: &FilterParams,
        page: PageRequest,
    ) -> Result<Paginated<CertificationWithRelations>, AppError>;

    async fn get_certification_with_relations(&self, id: i64) -> Result<CertificationWithRelations, AppError>;
    async fn get_edit_data(&self, id: i64) -> Result<CertificationEditData, AppError>;
}

impl SqlxCertificationRepo {
    pub fn new(pool: PgPool, public_url: impl Into<String>) -> Self {
        SqlxCertificationRepo { pool, public_url: public_url.into() }
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Certification {} not found", id))
}

#[async_trait]
impl CertificationRepository for SqlxCertificationRepo {
    async fn create_certification(&self, conn: &mut PgConnection, data: &CertificationData) -> Result<Certification, AppError> {
        let certification = sqlx::query_as::<_, Certification>(
            r#"
            INSERT INTO certifications
                (name, issuing_organization, issue_date, expiration_date, credential_id, credential_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.issuing_organization)
        .bind(data.issue_date)
        .bind(data.expiration_date)
        .bind(&data.credential_id)
        .bind(&data.credential_url)
        .fetch_one(&mut *conn)
        .await?;

        Ok(certification)
    }

    async fn update_certification(&self, conn: &mut PgConnection, id: i64, data: &CertificationData) -> Result<Certification, AppError> {
        sqlx::query_as::<_, Certification>(
            r#"
            UPDATE certifications
            SET name = $1, issuing_organization = $2, issue_date = $3, expiration_date = $4,
                credential_id = $5, credential_url = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.issuing_organization)
        .bind(data.issue_date)
        .bind(data.expiration_date)
        .bind(&data.credential_id)
        .bind(&data.credential_url)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn delete_certification(&self, conn: &mut PgConnection, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM certifications WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_certification_for_update(&self, conn: &mut PgConnection, id: i64) -> Result<Certification, AppError> {
        sqlx::query_as::<_, Certification>("SELECT * FROM certifications WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn search_certifications(
        &self,
        params: &FilterParams,
        page: PageRequest,
    ) -> Result<Paginated<CertificationWithRelations>, AppError> {
        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM certifications WHERE TRUE");
        CERTIFICATION_FILTERS.push_predicates(params, &mut count_query);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT certifications.* FROM certifications WHERE TRUE");
        CERTIFICATION_FILTERS.push_predicates(params, &mut query);
        CERTIFICATION_FILTERS.push_order(params, &mut query);
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let certifications = query.build_query_as::<Certification>().fetch_all(&self.pool).await?;
        let certifications = eager_load(&self.pool, &self.public_url, certifications).await?;

        Ok(Paginated::new(certifications, page, total))
    }

    async fn get_certification_with_relations(&self, id: i64) -> Result<CertificationWithRelations, AppError> {
        let certification = sqlx::query_as::<_, Certification>("SELECT * FROM certifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;

        eager_load(&self.pool, &self.public_url, vec![certification])
            .await?
            .pop()
            .ok_or_else(|| not_found(id))
    }

    async fn get_edit_data(&self, id: i64) -> Result<CertificationEditData, AppError> {
        let certification = self.get_certification_with_relations(id).await?;

        let technologies_all = sqlx::query_as::<_, Technology>("SELECT * FROM technologies ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        let technology_selected_ids = certification.technologies.iter().map(|t| t.id).collect();

        Ok(CertificationEditData { certification, technologies_all, technology_selected_ids })
    }
}

async fn eager_load(
    pool: &PgPool,
    public_url: &str,
    certifications: Vec<Certification>,
) -> Result<Vec<CertificationWithRelations>, AppError> {
    let ids: Vec<i64> = certifications.iter().map(|c| c.id).collect();
    let image_ids: Vec<i64> = certifications.iter().filter_map(|c| c.certification_image_id).collect();

    let mut technologies = load_linked_technologies(pool, TagPivot::Certification, &ids).await?;
    let images: HashMap<i64, _> = load_files_by_id(pool, public_url, &image_ids)
        .await?
        .into_iter()
        .map(|file| (file.id, file))
        .collect();

    Ok(certifications
        .into_iter()
        .map(|certification| {
            let certification_image = certification
                .certification_image_id
                .and_then(|image_id| images.get(&image_id).cloned());
            let technologies = technologies.remove(&certification.id).unwrap_or_default();

            CertificationWithRelations { certification, certification_image, technologies }
        })
        .collect())
}
