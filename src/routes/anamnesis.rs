use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::AnamnesisRecord;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateRecord {
    pub appointment_id: Option<Uuid>,
    pub questions: serde_json::Value,
    pub answers: serde_json::Value,
}

#[derive(Deserialize)]
pub struct SignRecord {
    pub signed_by: String,
}

pub async fn list_for_client(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<AnamnesisRecord>>, AppError> {
    db::clients::find_in_tenant(&state.pool, client_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    let records = db::anamnesis::list_for_client(&state.pool, client_id, auth.tenant_id).await?;
    Ok(Json(records))
}

pub async fn get(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnamnesisRecord>, AppError> {
    let record = db::anamnesis::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Anamnesis record not found".to_string()))?;
    Ok(Json(record))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(client_id): Path<Uuid>,
    Json(req): Json<CreateRecord>,
) -> Result<Json<AnamnesisRecord>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageClients).await?;

    if !req.questions.is_array() || !req.answers.is_array() {
        return Err(AppError::BadRequest(
            "Questions and answers must be arrays".to_string(),
        ));
    }

    db::clients::find_in_tenant(&state.pool, client_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    if let Some(appointment_id) = req.appointment_id {
        db::appointments::find_in_tenant(&state.pool, appointment_id, auth.tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
    }

    let record = db::anamnesis::create(
        &state.pool,
        auth.tenant_id,
        client_id,
        req.appointment_id,
        &req.questions,
        &req.answers,
    )
    .await?;

    Ok(Json(record))
}

pub async fn sign(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SignRecord>,
) -> Result<Json<AnamnesisRecord>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageClients).await?;

    if req.signed_by.trim().is_empty() {
        return Err(AppError::BadRequest("Signer name is required".to_string()));
    }

    // Verify the record exists before signing so an already-signed record
    // reports a conflict instead of a 404.
    let existing = db::anamnesis::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Anamnesis record not found".to_string()))?;
    if existing.signed_at.is_some() {
        return Err(AppError::Conflict(
            "Anamnesis record is already signed".to_string(),
        ));
    }

    let record = db::anamnesis::sign(&state.pool, id, auth.tenant_id, &req.signed_by)
        .await
        .map_err(|e| AppError::from_db(e, "Anamnesis record is already signed"))?;

    Ok(Json(record))
}
