use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::Service;

impl Record for Service {
    const TABLE: &'static str = "services";
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    name: &str,
    description: Option<&str>,
    duration_minutes: i32,
    price_cents: i64,
) -> Result<Service, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "INSERT INTO services (tenant_id, name, description, duration_minutes, price_cents)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(tenant_id)
    .bind(name)
    .bind(description)
    .bind(duration_minutes)
    .bind(price_cents)
    .fetch_one(pool)
    .await
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Service>, sqlx::Error> {
    scope::find_in_tenant::<Service>(pool, id, tenant_id, Visibility::Live).await
}

/// Live services matching the given ids, tenant-scoped. The caller
/// compares lengths to detect unknown or foreign ids.
pub async fn find_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
    tenant_id: Uuid,
) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "SELECT * FROM services
         WHERE id = ANY($1) AND tenant_id = $2 AND deleted_at IS NULL",
    )
    .bind(ids)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Service>, sqlx::Error> {
    scope::list_in_tenant::<Service>(pool, tenant_id, Visibility::Live, "ORDER BY name").await
}

/// Partial update. `None` leaves a field unchanged.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    duration_minutes: Option<i32>,
    price_cents: Option<i64>,
) -> Result<Service, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "UPDATE services SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            duration_minutes = COALESCE($5, duration_minutes),
            price_cents = COALESCE($6, price_cents),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(description)
    .bind(duration_minutes)
    .bind(price_cents)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    scope::soft_delete_in_tenant::<Service>(pool, id, tenant_id).await
}
