use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::Tenant;

impl Record for Tenant {
    const TABLE: &'static str = "tenants";
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    slug: &str,
) -> Result<Tenant, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(
        "INSERT INTO tenants (name, slug, is_active, plan)
         VALUES ($1, $2, true, 'basic') RETURNING *",
    )
    .bind(name)
    .bind(slug)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    vis: Visibility,
) -> Result<Option<Tenant>, sqlx::Error> {
    scope::find_by_id::<Tenant>(pool, id, vis).await
}

pub async fn find_by_slug<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    slug: &str,
    vis: Visibility,
) -> Result<Option<Tenant>, sqlx::Error> {
    let sql = format!("SELECT * FROM tenants WHERE slug = $1{}", vis.clause());
    sqlx::query_as::<_, Tenant>(&sql)
        .bind(slug)
        .fetch_optional(executor)
        .await
}

/// Partial update of the tenant profile. `None` leaves a field unchanged.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    logo: Option<&str>,
    primary_color: Option<&str>,
    secondary_color: Option<&str>,
) -> Result<Tenant, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(
        "UPDATE tenants SET
            name = COALESCE($2, name),
            logo = COALESCE($3, logo),
            primary_color = COALESCE($4, primary_color),
            secondary_color = COALESCE($5, secondary_color),
            updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(logo)
    .bind(primary_color)
    .bind(secondary_color)
    .fetch_one(pool)
    .await
}
