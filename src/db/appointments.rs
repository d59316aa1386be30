use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::{Appointment, AppointmentService, AppointmentStatus, Service};

impl Record for Appointment {
    const TABLE: &'static str = "appointments";
}

/// Creates the appointment and snapshots the booked services in one
/// transaction. Services must already be validated against the tenant.
#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    client_id: Uuid,
    professional_id: Option<Uuid>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    notes: Option<&str>,
    services: &[Service],
) -> Result<(Appointment, Vec<AppointmentService>), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let appointment = sqlx::query_as::<_, Appointment>(
        "INSERT INTO appointments (tenant_id, client_id, professional_id, starts_at, ends_at, notes)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(tenant_id)
    .bind(client_id)
    .bind(professional_id)
    .bind(starts_at)
    .bind(ends_at)
    .bind(notes)
    .fetch_one(&mut *tx)
    .await?;

    let mut snapshots = Vec::with_capacity(services.len());
    for service in services {
        let snapshot = sqlx::query_as::<_, AppointmentService>(
            "INSERT INTO appointment_services
                (appointment_id, service_id, name, duration_minutes, price_cents)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(appointment.id)
        .bind(service.id)
        .bind(&service.name)
        .bind(service.duration_minutes)
        .bind(service.price_cents)
        .fetch_one(&mut *tx)
        .await?;
        snapshots.push(snapshot);
    }

    tx.commit().await?;
    Ok((appointment, snapshots))
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Appointment>, sqlx::Error> {
    scope::find_in_tenant::<Appointment>(pool, id, tenant_id, Visibility::Live).await
}

pub async fn services_for(
    pool: &PgPool,
    appointment_id: Uuid,
) -> Result<Vec<AppointmentService>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentService>(
        "SELECT * FROM appointment_services WHERE appointment_id = $1",
    )
    .bind(appointment_id)
    .fetch_all(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    professional_id: Option<Uuid>,
) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "SELECT * FROM appointments
         WHERE tenant_id = $1 AND deleted_at IS NULL
           AND ($2::timestamptz IS NULL OR starts_at >= $2)
           AND ($3::timestamptz IS NULL OR starts_at <= $3)
           AND ($4::uuid IS NULL OR professional_id = $4)
         ORDER BY starts_at",
    )
    .bind(tenant_id)
    .bind(from)
    .bind(to)
    .bind(professional_id)
    .fetch_all(pool)
    .await
}

/// Full update of the mutable fields; the handler merges before calling.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    professional_id: Option<Uuid>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    notes: Option<&str>,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "UPDATE appointments SET
            professional_id = $3,
            starts_at = $4,
            ends_at = $5,
            notes = $6,
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(professional_id)
    .bind(starts_at)
    .bind(ends_at)
    .bind(notes)
    .fetch_one(pool)
    .await
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    status: AppointmentStatus,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "UPDATE appointments SET status = $3, updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(status)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    scope::soft_delete_in_tenant::<Appointment>(pool, id, tenant_id).await
}
