use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::AnamnesisRecord;

impl Record for AnamnesisRecord {
    const TABLE: &'static str = "anamnesis_records";
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    client_id: Uuid,
    appointment_id: Option<Uuid>,
    questions: &serde_json::Value,
    answers: &serde_json::Value,
) -> Result<AnamnesisRecord, sqlx::Error> {
    sqlx::query_as::<_, AnamnesisRecord>(
        "INSERT INTO anamnesis_records (tenant_id, client_id, appointment_id, questions, answers)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(tenant_id)
    .bind(client_id)
    .bind(appointment_id)
    .bind(questions)
    .bind(answers)
    .fetch_one(pool)
    .await
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<AnamnesisRecord>, sqlx::Error> {
    scope::find_in_tenant::<AnamnesisRecord>(pool, id, tenant_id, Visibility::Live).await
}

pub async fn list_for_client(
    pool: &PgPool,
    client_id: Uuid,
    tenant_id: Uuid,
) -> Result<Vec<AnamnesisRecord>, sqlx::Error> {
    sqlx::query_as::<_, AnamnesisRecord>(
        "SELECT * FROM anamnesis_records
         WHERE client_id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         ORDER BY created_at DESC",
    )
    .bind(client_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Stamps the signature fields. Fails with `RowNotFound` when the record
/// is missing or already signed.
pub async fn sign(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    signed_by: &str,
) -> Result<AnamnesisRecord, sqlx::Error> {
    sqlx::query_as::<_, AnamnesisRecord>(
        "UPDATE anamnesis_records SET signed_by = $3, signed_at = now(), updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL AND signed_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(signed_by)
    .fetch_one(pool)
    .await
}
