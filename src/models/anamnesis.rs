use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AnamnesisRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub questions: serde_json::Value,
    pub answers: serde_json::Value,
    pub signed_by: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
