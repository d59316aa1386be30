//! Soft-delete policy shared by every repository.
//!
//! Deletes are rewritten into `deleted_at` updates and default reads
//! exclude stamped rows. Callers opt out with [`Visibility::All`]; an
//! explicit visibility always wins over the default. Tenant scoping is
//! deliberately NOT part of this policy — repositories take `tenant_id`
//! parameters and apply it themselves.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A soft-deletable table: has `id`, `tenant_id` and `deleted_at` columns.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Exclude soft-deleted rows. The default for every read.
    Live,
    /// Include soft-deleted rows. Explicit caller override.
    All,
}

impl Visibility {
    /// Fragment appended to a WHERE clause that already has a condition.
    pub fn clause(self) -> &'static str {
        match self {
            Visibility::Live => " AND deleted_at IS NULL",
            Visibility::All => "",
        }
    }
}

pub async fn find_by_id<E: Record>(
    pool: &PgPool,
    id: Uuid,
    vis: Visibility,
) -> Result<Option<E>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = $1{}",
        E::TABLE,
        vis.clause()
    );
    sqlx::query_as::<_, E>(&sql).bind(id).fetch_optional(pool).await
}

pub async fn find_in_tenant<E: Record>(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    vis: Visibility,
) -> Result<Option<E>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE id = $1 AND tenant_id = $2{}",
        E::TABLE,
        vis.clause()
    );
    sqlx::query_as::<_, E>(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

/// `order_by` must be a full `ORDER BY ...` clause built from literals.
pub async fn list_in_tenant<E: Record>(
    pool: &PgPool,
    tenant_id: Uuid,
    vis: Visibility,
    order_by: &str,
) -> Result<Vec<E>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM {} WHERE tenant_id = $1{} {}",
        E::TABLE,
        vis.clause(),
        order_by
    );
    sqlx::query_as::<_, E>(&sql).bind(tenant_id).fetch_all(pool).await
}

/// Delete-one, rewritten: stamps `deleted_at` and touches nothing else.
/// Returns false when no live row matched.
pub async fn soft_delete_in_tenant<E: Record>(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET deleted_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        E::TABLE
    );
    let result = sqlx::query(&sql).bind(id).bind(tenant_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Delete-many, rewritten: stamps `deleted_at` on every live row whose
/// `column` matches. `column` must be a literal identifier, never input.
pub async fn soft_delete_by<E: Record>(
    pool: &PgPool,
    column: &str,
    value: Uuid,
) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET deleted_at = now() WHERE {column} = $1 AND deleted_at IS NULL",
        E::TABLE
    );
    let result = sqlx::query(&sql).bind(value).execute(pool).await?;
    Ok(result.rows_affected())
}
