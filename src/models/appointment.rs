use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a service at booking time. Name, duration and price are
/// copied so later edits to the service don't rewrite history.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AppointmentService {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub service_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
}
