use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub session_count: i32,
    pub total_price_cents: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A client's purchase of a package. Session counts are tracked here so the
/// package itself can change without rewriting past purchases.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ClientPackage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub package_id: Uuid,
    pub remaining_sessions: i32,
    pub total_sessions: i32,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
