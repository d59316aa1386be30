use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::{FinancialEntry, PaymentMethod, PaymentStatus};

impl Record for FinancialEntry {
    const TABLE: &'static str = "financial_entries";
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    client_id: Uuid,
    appointment_id: Option<Uuid>,
    amount_cents: i64,
    payment_method: PaymentMethod,
    status: PaymentStatus,
    entry_date: NaiveDate,
) -> Result<FinancialEntry, sqlx::Error> {
    sqlx::query_as::<_, FinancialEntry>(
        "INSERT INTO financial_entries
            (tenant_id, client_id, appointment_id, amount_cents, payment_method, status, entry_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(tenant_id)
    .bind(client_id)
    .bind(appointment_id)
    .bind(amount_cents)
    .bind(payment_method)
    .bind(status)
    .bind(entry_date)
    .fetch_one(pool)
    .await
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<FinancialEntry>, sqlx::Error> {
    scope::find_in_tenant::<FinancialEntry>(pool, id, tenant_id, Visibility::Live).await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    status: Option<PaymentStatus>,
) -> Result<Vec<FinancialEntry>, sqlx::Error> {
    sqlx::query_as::<_, FinancialEntry>(
        "SELECT * FROM financial_entries
         WHERE tenant_id = $1 AND deleted_at IS NULL
           AND ($2::date IS NULL OR entry_date >= $2)
           AND ($3::date IS NULL OR entry_date <= $3)
           AND ($4::payment_status IS NULL OR status = $4)
         ORDER BY entry_date DESC, created_at DESC",
    )
    .bind(tenant_id)
    .bind(from)
    .bind(to)
    .bind(status)
    .fetch_all(pool)
    .await
}

/// Partial update. `None` leaves a field unchanged.
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    amount_cents: Option<i64>,
    payment_method: Option<PaymentMethod>,
    status: Option<PaymentStatus>,
    entry_date: Option<NaiveDate>,
) -> Result<FinancialEntry, sqlx::Error> {
    sqlx::query_as::<_, FinancialEntry>(
        "UPDATE financial_entries SET
            amount_cents = COALESCE($3, amount_cents),
            payment_method = COALESCE($4, payment_method),
            status = COALESCE($5, status),
            entry_date = COALESCE($6, entry_date),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(amount_cents)
    .bind(payment_method)
    .bind(status)
    .bind(entry_date)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    scope::soft_delete_in_tenant::<FinancialEntry>(pool, id, tenant_id).await
}
