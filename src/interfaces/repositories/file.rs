use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::{
    entities::file::{AttachedFile, FileForeignKey, FileRecord, FileRelation, NewFile},
    errors::AppError,
    repositories::sqlx_repo::SqlxFileRepo,
};

/// Persistence for file rows and the associations that reference them.
///
/// Every method runs inside the caller's transaction. The eager loaders
/// below the impl read straight from the pool.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn insert_file(&self, conn: &mut PgConnection, file: &NewFile) -> Result<FileRecord, AppError>;
    async fn find_file(&self, conn: &mut PgConnection, id: i64) -> Result<Option<FileRecord>, AppError>;
    async fn delete_file(&self, conn: &mut PgConnection, id: i64) -> Result<(), AppError>;

    /// Number of pivot rows and foreign keys still pointing at the file.
    async fn count_references(&self, conn: &mut PgConnection, file_id: i64) -> Result<i64, AppError>;

    async fn link(
        &self,
        conn: &mut PgConnection,
        relation: FileRelation,
        owner_id: i64,
        file_id: i64,
        sort_order: i32,
        is_featured: bool,
    ) -> Result<(), AppError>;

    /// Returns false when the file was not linked to the owner.
    async fn unlink(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64, file_id: i64) -> Result<bool, AppError>;

    /// Linked file ids ordered by sort order.
    async fn linked_file_ids(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64) -> Result<Vec<i64>, AppError>;

    async fn count_linked(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64) -> Result<i64, AppError>;

    async fn max_sort_order(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64) -> Result<i32, AppError>;

    async fn set_sort_orders(
        &self,
        conn: &mut PgConnection,
        relation: FileRelation,
        owner_id: i64,
        orders: &[(i64, i32)],
    ) -> Result<(), AppError>;

    /// Clears the owner's featured flag, then sets it on `file_id`.
    /// Returns false when the file is not linked to the owner.
    async fn set_featured(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64, file_id: i64) -> Result<bool, AppError>;

    async fn linked_file(&self, conn: &mut PgConnection, key: FileForeignKey, owner_id: i64) -> Result<Option<i64>, AppError>;

    async fn set_linked_file(
        &self,
        conn: &mut PgConnection,
        key: FileForeignKey,
        owner_id: i64,
        file_id: Option<i64>,
    ) -> Result<(), AppError>;
}

impl SqlxFileRepo {
    pub fn new(pool: PgPool, public_url: impl Into<String>) -> Self {
        SqlxFileRepo { pool, public_url: public_url.into() }
    }
}

/// Sums every association that can hold a file.
pub(crate) fn reference_count_sql() -> String {
    let pivots = FileRelation::ALL
        .iter()
        .map(|r| format!("(SELECT COUNT(*) FROM {} WHERE file_id = $1)", r.table()));
    let keys = FileForeignKey::ALL
        .iter()
        .map(|k| format!("(SELECT COUNT(*) FROM {} WHERE {} = $1)", k.table(), k.column()));

    format!("SELECT {}", pivots.chain(keys).collect::<Vec<_>>().join(" + "))
}

#[async_trait]
impl FileRepository for SqlxFileRepo {
    async fn insert_file(&self, conn: &mut PgConnection, file: &NewFile) -> Result<FileRecord, AppError> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO files (original_name, filename, path, mime_type, size, "type")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&file.original_name)
        .bind(&file.filename)
        .bind(&file.path)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(file.kind)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record.with_url(&self.public_url))
    }

    async fn find_file(&self, conn: &mut PgConnection, id: i64) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(record.map(|r| r.with_url(&self.public_url)))
    }

    async fn delete_file(&self, conn: &mut PgConnection, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn count_references(&self, conn: &mut PgConnection, file_id: i64) -> Result<i64, AppError> {
        let sql = reference_count_sql();
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(file_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn link(
        &self,
        conn: &mut PgConnection,
        relation: FileRelation,
        owner_id: i64,
        file_id: i64,
        sort_order: i32,
        is_featured: bool,
    ) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {} ({}, file_id, sort_order, is_featured) VALUES ($1, $2, $3, $4)",
            relation.table(),
            relation.owner_column()
        );
        sqlx::query(&sql)
            .bind(owner_id)
            .bind(file_id)
            .bind(sort_order)
            .bind(is_featured)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn unlink(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64, file_id: i64) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND file_id = $2",
            relation.table(),
            relation.owner_column()
        );
        let result = sqlx::query(&sql)
            .bind(owner_id)
            .bind(file_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn linked_file_ids(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64) -> Result<Vec<i64>, AppError> {
        let sql = format!(
            "SELECT file_id FROM {} WHERE {} = $1 ORDER BY sort_order, id",
            relation.table(),
            relation.owner_column()
        );
        let ids = sqlx::query_scalar::<_, i64>(&sql)
            .bind(owner_id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(ids)
    }

    async fn count_linked(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", relation.table(), relation.owner_column());
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(owner_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn max_sort_order(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64) -> Result<i32, AppError> {
        let sql = format!(
            "SELECT COALESCE(MAX(sort_order), 0) FROM {} WHERE {} = $1",
            relation.table(),
            relation.owner_column()
        );
        let max: i32 = sqlx::query_scalar(&sql)
            .bind(owner_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(max)
    }

    async fn set_sort_orders(
        &self,
        conn: &mut PgConnection,
        relation: FileRelation,
        owner_id: i64,
        orders: &[(i64, i32)],
    ) -> Result<(), AppError> {
        if orders.is_empty() {
            return Ok(());
        }
        let (file_ids, sort_orders): (Vec<i64>, Vec<i32>) = orders.iter().copied().unzip();

        let sql = format!(
            r#"
            UPDATE {table} AS pivot
            SET sort_order = v.sort_order, updated_at = NOW()
            FROM UNNEST($1::BIGINT[], $2::INTEGER[]) AS v(file_id, sort_order)
            WHERE pivot.{owner} = $3 AND pivot.file_id = v.file_id
            "#,
            table = relation.table(),
            owner = relation.owner_column()
        );
        sqlx::query(&sql)
            .bind(file_ids)
            .bind(sort_orders)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn set_featured(&self, conn: &mut PgConnection, relation: FileRelation, owner_id: i64, file_id: i64) -> Result<bool, AppError> {
        let exists_sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1 AND file_id = $2)",
            relation.table(),
            relation.owner_column()
        );
        let linked: bool = sqlx::query_scalar(&exists_sql)
            .bind(owner_id)
            .bind(file_id)
            .fetch_one(&mut *conn)
            .await?;
        if !linked {
            return Ok(false);
        }

        // Clear first; the partial unique index allows one featured row per owner.
        let clear_sql = format!(
            "UPDATE {} SET is_featured = FALSE, updated_at = NOW() WHERE {} = $1 AND is_featured",
            relation.table(),
            relation.owner_column()
        );
        sqlx::query(&clear_sql)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?;

        let set_sql = format!(
            "UPDATE {} SET is_featured = TRUE, updated_at = NOW() WHERE {} = $1 AND file_id = $2",
            relation.table(),
            relation.owner_column()
        );
        sqlx::query(&set_sql)
            .bind(owner_id)
            .bind(file_id)
            .execute(&mut *conn)
            .await?;

        Ok(true)
    }

    async fn linked_file(&self, conn: &mut PgConnection, key: FileForeignKey, owner_id: i64) -> Result<Option<i64>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", key.column(), key.table());
        let file_id: Option<Option<i64>> = sqlx::query_scalar(&sql)
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(file_id.flatten())
    }

    async fn set_linked_file(
        &self,
        conn: &mut PgConnection,
        key: FileForeignKey,
        owner_id: i64,
        file_id: Option<i64>,
    ) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET {} = $1, updated_at = NOW() WHERE id = $2",
            key.table(),
            key.column()
        );
        let result = sqlx::query(&sql)
            .bind(file_id)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No {} row with id {}", key.table(), owner_id)));
        }
        Ok(())
    }
}

/// Eager loads pivot-linked files for several owners, in pivot order.
pub(crate) async fn load_attached_files(
    pool: &PgPool,
    public_url: &str,
    relation: FileRelation,
    owner_ids: &[i64],
) -> Result<Vec<AttachedFile>, AppError> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"
        SELECT f.*, pivot.{owner} AS owner_id, pivot.sort_order, pivot.is_featured
        FROM {table} pivot
        JOIN files f ON f.id = pivot.file_id
        WHERE pivot.{owner} = ANY($1)
        ORDER BY pivot.{owner}, pivot.sort_order, pivot.id
        "#,
        table = relation.table(),
        owner = relation.owner_column()
    );
    let files = sqlx::query_as::<_, AttachedFile>(&sql)
        .bind(owner_ids)
        .fetch_all(pool)
        .await?;

    Ok(files.into_iter().map(|f| f.with_url(public_url)).collect())
}

pub(crate) async fn load_files_by_id(pool: &PgPool, public_url: &str, ids: &[i64]) -> Result<Vec<FileRecord>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let files = sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ANY($1) ORDER BY id")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(files.into_iter().map(|f| f.with_url(public_url)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_count_covers_pivots_and_foreign_keys() {
        let sql = reference_count_sql();

        assert!(sql.starts_with("SELECT (SELECT COUNT(*) FROM project_files WHERE file_id = $1)"));
        assert!(sql.contains("FROM certifications WHERE certification_image_id = $1"));
        assert!(sql.contains("FROM dev_profile WHERE avatar_file_id = $1"));
        assert!(sql.contains("FROM dev_profile WHERE resume_file_id = $1"));
        assert_eq!(sql.matches(" + ").count(), 3);
    }
}
