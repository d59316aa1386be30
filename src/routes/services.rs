use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::Service;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateService {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price_cents: i64,
}

#[derive(Deserialize)]
pub struct UpdateService {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub price_cents: Option<i64>,
}

pub async fn list(
    auth: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = db::services::list(&state.pool, auth.tenant_id).await?;
    Ok(Json(services))
}

pub async fn get(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Service>, AppError> {
    let service = db::services::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;
    Ok(Json(service))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateService>,
) -> Result<Json<Service>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;
    validate_service(&req.name, req.duration_minutes, req.price_cents)?;

    let service = db::services::create(
        &state.pool,
        auth.tenant_id,
        &req.name,
        req.description.as_deref(),
        req.duration_minutes,
        req.price_cents,
    )
    .await?;

    Ok(Json(service))
}

pub async fn update(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateService>,
) -> Result<Json<Service>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
    }
    if matches!(req.duration_minutes, Some(d) if d <= 0) {
        return Err(AppError::BadRequest(
            "Duration must be positive".to_string(),
        ));
    }
    if matches!(req.price_cents, Some(p) if p < 0) {
        return Err(AppError::BadRequest(
            "Price cannot be negative".to_string(),
        ));
    }

    let service = db::services::update(
        &state.pool,
        id,
        auth.tenant_id,
        req.name.as_deref(),
        req.description.as_deref(),
        req.duration_minutes,
        req.price_cents,
    )
    .await
    .map_err(|e| AppError::from_db(e, "Conflicting service data"))?;

    Ok(Json(service))
}

pub async fn delete(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;

    let deleted = db::services::delete(&state.pool, id, auth.tenant_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Service not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

fn validate_service(name: &str, duration_minutes: i32, price_cents: i64) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if duration_minutes <= 0 {
        return Err(AppError::BadRequest(
            "Duration must be positive".to_string(),
        ));
    }
    if price_cents < 0 {
        return Err(AppError::BadRequest(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}
