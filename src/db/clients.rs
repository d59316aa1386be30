use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::{AnamnesisRecord, Client, ClientPackage};

impl Record for Client {
    const TABLE: &'static str = "clients";
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    name: &str,
    cpf: Option<&str>,
    phone: &str,
    email: Option<&str>,
    birth_date: Option<NaiveDate>,
    address: Option<&str>,
    notes: Option<&str>,
) -> Result<Client, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "INSERT INTO clients (tenant_id, name, cpf, phone, email, birth_date, address, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(tenant_id)
    .bind(name)
    .bind(cpf)
    .bind(phone)
    .bind(email)
    .bind(birth_date)
    .bind(address)
    .bind(notes)
    .fetch_one(pool)
    .await
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Client>, sqlx::Error> {
    scope::find_in_tenant::<Client>(pool, id, tenant_id, Visibility::Live).await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    search: Option<&str>,
) -> Result<Vec<Client>, sqlx::Error> {
    match search {
        Some(term) => {
            sqlx::query_as::<_, Client>(
                "SELECT * FROM clients
                 WHERE tenant_id = $1 AND deleted_at IS NULL
                   AND (name ILIKE $2 OR phone ILIKE $2)
                 ORDER BY name",
            )
            .bind(tenant_id)
            .bind(format!("%{term}%"))
            .fetch_all(pool)
            .await
        }
        None => {
            scope::list_in_tenant::<Client>(pool, tenant_id, Visibility::Live, "ORDER BY name")
                .await
        }
    }
}

/// Partial update. `None` leaves a field unchanged.
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    cpf: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    birth_date: Option<NaiveDate>,
    address: Option<&str>,
    notes: Option<&str>,
) -> Result<Client, sqlx::Error> {
    sqlx::query_as::<_, Client>(
        "UPDATE clients SET
            name = COALESCE($3, name),
            cpf = COALESCE($4, cpf),
            phone = COALESCE($5, phone),
            email = COALESCE($6, email),
            birth_date = COALESCE($7, birth_date),
            address = COALESCE($8, address),
            notes = COALESCE($9, notes),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(cpf)
    .bind(phone)
    .bind(email)
    .bind(birth_date)
    .bind(address)
    .bind(notes)
    .fetch_one(pool)
    .await
}

/// Soft-deletes the client and everything hanging off it (package
/// purchases, anamnesis records). Appointments keep their history.
pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    let deleted = scope::soft_delete_in_tenant::<Client>(pool, id, tenant_id).await?;
    if deleted {
        scope::soft_delete_by::<ClientPackage>(pool, "client_id", id).await?;
        scope::soft_delete_by::<AnamnesisRecord>(pool, "client_id", id).await?;
    }
    Ok(deleted)
}
