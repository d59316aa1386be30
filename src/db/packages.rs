use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::{ClientPackage, Package, Service};

impl Record for Package {
    const TABLE: &'static str = "packages";
}

impl Record for ClientPackage {
    const TABLE: &'static str = "client_packages";
}

/// Creates the package and its service links in one transaction. Service
/// ids must already be validated against the tenant by the caller.
pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    name: &str,
    session_count: i32,
    total_price_cents: i64,
    service_ids: &[Uuid],
) -> Result<Package, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let package = sqlx::query_as::<_, Package>(
        "INSERT INTO packages (tenant_id, name, session_count, total_price_cents)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(tenant_id)
    .bind(name)
    .bind(session_count)
    .bind(total_price_cents)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO package_services (package_id, service_id)
         SELECT $1, unnest($2::uuid[])",
    )
    .bind(package.id)
    .bind(service_ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(package)
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Package>, sqlx::Error> {
    scope::find_in_tenant::<Package>(pool, id, tenant_id, Visibility::Live).await
}

pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Package>, sqlx::Error> {
    scope::list_in_tenant::<Package>(pool, tenant_id, Visibility::Live, "ORDER BY name").await
}

/// Live services linked to a package.
pub async fn services_for(pool: &PgPool, package_id: Uuid) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(
        "SELECT s.* FROM services s
         JOIN package_services ps ON ps.service_id = s.id
         WHERE ps.package_id = $1 AND s.deleted_at IS NULL
         ORDER BY s.name",
    )
    .bind(package_id)
    .fetch_all(pool)
    .await
}

/// Partial update; `service_ids` of `Some` replaces the service links.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    session_count: Option<i32>,
    total_price_cents: Option<i64>,
    service_ids: Option<&[Uuid]>,
) -> Result<Package, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let package = sqlx::query_as::<_, Package>(
        "UPDATE packages SET
            name = COALESCE($3, name),
            session_count = COALESCE($4, session_count),
            total_price_cents = COALESCE($5, total_price_cents),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(session_count)
    .bind(total_price_cents)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(ids) = service_ids {
        sqlx::query("DELETE FROM package_services WHERE package_id = $1")
            .bind(package.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO package_services (package_id, service_id)
             SELECT $1, unnest($2::uuid[])",
        )
        .bind(package.id)
        .bind(ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(package)
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    scope::soft_delete_in_tenant::<Package>(pool, id, tenant_id).await
}

pub async fn purchase(
    pool: &PgPool,
    tenant_id: Uuid,
    client_id: Uuid,
    package_id: Uuid,
    total_sessions: i32,
    expires_at: Option<DateTime<Utc>>,
) -> Result<ClientPackage, sqlx::Error> {
    sqlx::query_as::<_, ClientPackage>(
        "INSERT INTO client_packages
            (tenant_id, client_id, package_id, remaining_sessions, total_sessions, expires_at)
         VALUES ($1, $2, $3, $4, $4, $5) RETURNING *",
    )
    .bind(tenant_id)
    .bind(client_id)
    .bind(package_id)
    .bind(total_sessions)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn list_for_client(
    pool: &PgPool,
    client_id: Uuid,
    tenant_id: Uuid,
) -> Result<Vec<ClientPackage>, sqlx::Error> {
    sqlx::query_as::<_, ClientPackage>(
        "SELECT * FROM client_packages
         WHERE client_id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         ORDER BY purchased_at DESC",
    )
    .bind(client_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}
