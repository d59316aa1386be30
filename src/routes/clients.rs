use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::Client;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListClients {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub cpf: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

pub async fn list(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<ListClients>,
) -> Result<Json<Vec<Client>>, AppError> {
    let clients = db::clients::list(&state.pool, auth.tenant_id, params.search.as_deref()).await?;
    Ok(Json(clients))
}

pub async fn get(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    let client = db::clients::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
    Ok(Json(client))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateClient>,
) -> Result<Json<Client>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageClients).await?;

    if req.name.trim().is_empty() || req.phone.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name and phone are required".to_string(),
        ));
    }

    let client = db::clients::create(
        &state.pool,
        auth.tenant_id,
        &req.name,
        req.cpf.as_deref(),
        &req.phone,
        req.email.as_deref(),
        req.birth_date,
        req.address.as_deref(),
        req.notes.as_deref(),
    )
    .await?;

    Ok(Json(client))
}

pub async fn update(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClient>,
) -> Result<Json<Client>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageClients).await?;

    let client = db::clients::update(
        &state.pool,
        id,
        auth.tenant_id,
        req.name.as_deref(),
        req.cpf.as_deref(),
        req.phone.as_deref(),
        req.email.as_deref(),
        req.birth_date,
        req.address.as_deref(),
        req.notes.as_deref(),
    )
    .await
    .map_err(|e| AppError::from_db(e, "Conflicting client data"))?;

    Ok(Json(client))
}

pub async fn delete(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageClients).await?;

    let deleted = db::clients::delete(&state.pool, id, auth.tenant_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Client not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
