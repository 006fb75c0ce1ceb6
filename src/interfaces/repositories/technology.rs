use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::{
        pagination::{PageRequest, Paginated},
        technology::{pivot_rows, LinkedTechnology, TagPivot, Technology, TechnologyCategory, TechnologyOption},
    },
    errors::AppError,
    filters::{technology::TECHNOLOGY_FILTERS, FilterParams},
    repositories::sqlx_repo::SqlxTechnologyRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TechnologyRepository: Send + Sync {
    async fn create_technology(&self, name: &str, slug: &str, category: TechnologyCategory) -> Result<Technology, AppError>;
    async fn update_technology(&self, id: i64, name: &str, slug: &str, category: TechnologyCategory) -> Result<Technology, AppError>;
    async fn delete_technology(&self, id: i64) -> Result<(), AppError>;
    async fn get_technology_by_id(&self, id: i64) -> Result<Technology, AppError>;

    /// Filtered, sorted and paginated list.
    async fn search_technologies(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<Technology>, AppError>;

    /// Every technology ordered by name.
    async fn get_all_technologies(&self) -> Result<Vec<Technology>, AppError>;

    /// `{id, name}` pairs ordered by name.
    async fn get_technology_options(&self) -> Result<Vec<TechnologyOption>, AppError>;

    /// The subset of `ids` that exist.
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError>;

    /// Replaces the owner's links with `ids`, numbered `1..N` in order.
    async fn sync_links(&self, conn: &mut PgConnection, pivot: TagPivot, owner_id: i64, ids: &[i64]) -> Result<(), AppError>;}

impl SqlxTechnologyRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxTechnologyRepo { pool }
    }
}

fn slug_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some("technologies_slug_key") {
            return AppError::Conflict("The slug has already been taken.".into());
        }
    }
    AppError::from(err)
}

#[async_trait]
impl TechnologyRepository for SqlxTechnologyRepo {
    async fn create_technology(&self, name: &str, slug: &str, category: TechnologyCategory) -> Result<Technology, AppError> {
        let technology = sqlx::query_as::<_, Technology>(
            r#"
            INSERT INTO technologies (name, slug, category)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(category)
        .fetch_one(&self.pool)
        .await
        .map_err(slug_conflict)?;

        Ok(technology)
    }

    async fn update_technology(&self, id: i64, name: &str, slug: &str, category: TechnologyCategory) -> Result<Technology, AppError> {
        let technology = sqlx::query_as::<_, Technology>(
            r#"
            UPDATE technologies
            SET name = $1, slug = $2, category = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(category)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(slug_conflict)?
        .ok_or_else(|| AppError::NotFound("Technology not found".into()))?;

        Ok(technology)
    }

    async fn delete_technology(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM technologies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Technology not found".into()));
        }
        Ok(())
    }

    async fn get_technology_by_id(&self, id: i64) -> Result<Technology, AppError> {
        sqlx::query_as::<_, Technology>("SELECT * FROM technologies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Technology not found".into()))
    }

    async fn search_technologies(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<Technology>, AppError> {
        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM technologies WHERE TRUE");
        TECHNOLOGY_FILTERS.push_predicates(params, &mut count_query);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT technologies.* FROM technologies WHERE TRUE");
        TECHNOLOGY_FILTERS.push_predicates(params, &mut query);
        TECHNOLOGY_FILTERS.push_order(params, &mut query);
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let technologies = query.build_query_as::<Technology>().fetch_all(&self.pool).await?;

        Ok(Paginated::new(technologies, page, total))
    }

    async fn get_all_technologies(&self) -> Result<Vec<Technology>, AppError> {
        let technologies = sqlx::query_as::<_, Technology>("SELECT * FROM technologies ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(technologies)
    }

    async fn get_technology_options(&self) -> Result<Vec<TechnologyOption>, AppError> {
        let options = sqlx::query_as::<_, TechnologyOption>("SELECT id, name FROM technologies ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(options)
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM technologies WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found)
    }

    async fn sync_links(&self, conn: &mut PgConnection, pivot: TagPivot, owner_id: i64, ids: &[i64]) -> Result<(), AppError> {
        let delete_sql = format!("DELETE FROM {} WHERE {} = $1", pivot.table(), pivot.owner_column());
        sqlx::query(&delete_sql)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?;

        let rows = pivot_rows(ids);
        if rows.is_empty() {
            return Ok(());
        }

        let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}, technology_id, sort_order) ",
            pivot.table(),
            pivot.owner_column()
        ));
        insert.push_values(rows, |mut row, (technology_id, sort_order)| {
            row.push_bind(owner_id)
                .push_bind(technology_id)
                .push_bind(sort_order);
        });
        insert.build().execute(&mut *conn).await?;

        Ok(())
    }}

/// Eager loads linked technologies for several owners in one query.
pub(crate) async fn load_linked_technologies(
    pool: &PgPool,
    pivot: TagPivot,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<LinkedTechnology>>, AppError> {
    let mut grouped: HashMap<i64, Vec<LinkedTechnology>> = HashMap::new();
    if owner_ids.is_empty() {
        return Ok(grouped);
    }

    let sql = format!(
        r#"
        SELECT t.id, t.name, t.slug, t.category, pivot.sort_order, pivot.{owner} AS owner_id
        FROM {table} pivot
        JOIN technologies t ON t.id = pivot.technology_id
        WHERE pivot.{owner} = ANY($1)
        ORDER BY pivot.{owner}, pivot.sort_order, t.id
        "#,
        table = pivot.table(),
        owner = pivot.owner_column()
    );
    let linked = sqlx::query_as::<_, LinkedTechnology>(&sql)
        .bind(owner_ids)
        .fetch_all(pool)
        .await?;

    for technology in linked {
        grouped.entry(technology.owner_id).or_default().push(technology);
    }
    Ok(grouped)
}
