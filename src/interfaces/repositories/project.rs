use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::{
        file::FileRelation,
        pagination::{PageRequest, Paginated},
        project::{Project, ProjectEditData, ProjectInput, ProjectWithRelations},
        technology::{TagPivot, Technology},
    },
    errors::AppError,
    filters::{project::PROJECT_FILTERS, FilterParams},
    repositories::{
        file::load_attached_files,
        sqlx_repo::SqlxProjectRepo,
        technology::load_linked_technologies,
    },
};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create_project(&self, conn: &mut PgConnection, input: &ProjectInput) -> Result<Project, AppError>;
    async fn update_project(&self, conn: &mut PgConnection, id: i64, input: &ProjectInput) -> Result<Project, AppError>;
    async fn delete_project(&self, conn: &mut PgConnection, id: i64) -> Result<(), AppError>;

    /// Locks the row for the rest of the transaction.
    async fn find_project_for_update(&self, conn: &mut PgConnection, id: i64) -> Result<Project, AppError>;

    /// Filtered page with technologies and files eager loaded.
    async fn search_projects(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<ProjectWithRelations>, AppError>;

    async fn get_project_with_relations(&self, id: i64) -> Result<ProjectWithRelations, AppError>;

    /// The project plus every technology ordered by name and the selected ids.
    async fn get_edit_data(&self, id: i64) -> Result<ProjectEditData, AppError>;
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool, public_url: impl Into<String>) -> Self {
        SqlxProjectRepo { pool, public_url: public_url.into() }
    }

    async fn with_relations(&self, projects: Vec<Project>) -> Result<Vec<ProjectWithRelations>, AppError> {
        eager_load(&self.pool, &self.public_url, projects).await
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Project {} not found", id))
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn create_project(&self, conn: &mut PgConnection, input: &ProjectInput) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, short_description, long_description, link, github)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.name.trim())
        .bind(input.short_description.trim())
        .bind(&input.long_description)
        .bind(&input.link)
        .bind(&input.github)
        .fetch_one(&mut *conn)
        .await?;

        Ok(project)
    }

    async fn update_project(&self, conn: &mut PgConnection, id: i64, input: &ProjectInput) -> Result<Project, AppError> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $1, short_description = $2, long_description = $3,
                link = $4, github = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(input.name.trim())
        .bind(input.short_description.trim())
        .bind(&input.long_description)
        .bind(&input.link)
        .bind(&input.github)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn delete_project(&self, conn: &mut PgConnection, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_project_for_update(&self, conn: &mut PgConnection, id: i64) -> Result<Project, AppError> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn search_projects(&self, params: &FilterParams, page: PageRequest) -> Result<Paginated<ProjectWithRelations>, AppError> {
        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM projects WHERE TRUE");
        PROJECT_FILTERS.push_predicates(params, &mut count_query);
        let total: i64 = count_query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT projects.* FROM projects WHERE TRUE");
        PROJECT_FILTERS.push_predicates(params, &mut query);
        PROJECT_FILTERS.push_order(params, &mut query);
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let projects = query.build_query_as::<Project>().fetch_all(&self.pool).await?;
        let projects = self.with_relations(projects).await?;

        Ok(Paginated::new(projects, page, total))
    }

    async fn get_project_with_relations(&self, id: i64) -> Result<ProjectWithRelations, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))?;

        self.with_relations(vec![project])
            .await?
            .pop()
            .ok_or_else(|| not_found(id))
    }

    async fn get_edit_data(&self, id: i64) -> Result<ProjectEditData, AppError> {
        let project = self.get_project_with_relations(id).await?;

        let technologies_all = sqlx::query_as::<_, Technology>("SELECT * FROM technologies ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        let technology_selected_ids = project.technologies.iter().map(|t| t.id).collect();

        Ok(ProjectEditData { project, technologies_all, technology_selected_ids })
    }
}

/// Attaches technologies and files to each project, preserving input order.
async fn eager_load(pool: &PgPool, public_url: &str, projects: Vec<Project>) -> Result<Vec<ProjectWithRelations>, AppError> {
    let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();

    let mut technologies = load_linked_technologies(pool, TagPivot::Project, &ids).await?;

    let mut files: HashMap<i64, Vec<_>> = HashMap::new();
    for file in load_attached_files(pool, public_url, FileRelation::ProjectFiles, &ids).await? {
        files.entry(file.owner_id).or_default().push(file);
    }

    Ok(projects
        .into_iter()
        .map(|project| {
            let id = project.id;
            ProjectWithRelations::new(
                project,
                technologies.remove(&id).unwrap_or_default(),
                files.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}
