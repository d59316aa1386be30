use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::{FinancialEntry, PaymentMethod, PaymentStatus};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListEntries {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
}

#[derive(Deserialize)]
pub struct CreateEntry {
    pub client_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub entry_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct UpdateEntry {
    pub amount_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub entry_date: Option<NaiveDate>,
}

pub async fn list(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<ListEntries>,
) -> Result<Json<Vec<FinancialEntry>>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ViewFinancials).await?;

    let entries = db::financials::list(
        &state.pool,
        auth.tenant_id,
        params.from,
        params.to,
        params.status,
    )
    .await?;
    Ok(Json(entries))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateEntry>,
) -> Result<Json<FinancialEntry>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageFinancials).await?;

    if req.amount_cents <= 0 {
        return Err(AppError::BadRequest(
            "Amount must be positive".to_string(),
        ));
    }

    db::clients::find_in_tenant(&state.pool, req.client_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    if let Some(appointment_id) = req.appointment_id {
        db::appointments::find_in_tenant(&state.pool, appointment_id, auth.tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
    }

    let entry = db::financials::create(
        &state.pool,
        auth.tenant_id,
        req.client_id,
        req.appointment_id,
        req.amount_cents,
        req.payment_method,
        req.status,
        req.entry_date,
    )
    .await?;

    Ok(Json(entry))
}

pub async fn update(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntry>,
) -> Result<Json<FinancialEntry>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageFinancials).await?;

    if matches!(req.amount_cents, Some(a) if a <= 0) {
        return Err(AppError::BadRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let entry = db::financials::update(
        &state.pool,
        id,
        auth.tenant_id,
        req.amount_cents,
        req.payment_method,
        req.status,
        req.entry_date,
    )
    .await
    .map_err(|e| AppError::from_db(e, "Conflicting financial data"))?;

    Ok(Json(entry))
}

pub async fn delete(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageFinancials).await?;

    let deleted = db::financials::delete(&state.pool, id, auth.tenant_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Financial entry not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
