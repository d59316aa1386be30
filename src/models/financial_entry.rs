use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Pix,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Installment,
}

/// Amounts are stored as integer cents.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub entry_date: NaiveDate,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
