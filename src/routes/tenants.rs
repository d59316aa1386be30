use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::auth::extractor::CurrentUser;
use crate::db;
use crate::db::scope::Visibility;
use crate::error::AppError;
use crate::models::Tenant;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

pub async fn current(
    auth: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Json<Tenant>, AppError> {
    let tenant = db::tenants::find_by_id(&state.pool, auth.tenant_id, Visibility::Live)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))?;
    Ok(Json(tenant))
}

pub async fn update_current(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateTenant>,
) -> Result<Json<Tenant>, AppError> {
    auth.require_admin()?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
    }

    let tenant = db::tenants::update_profile(
        &state.pool,
        auth.tenant_id,
        req.name.as_deref(),
        req.logo.as_deref(),
        req.primary_color.as_deref(),
        req.secondary_color.as_deref(),
    )
    .await
    .map_err(|e| AppError::from_db(e, "A tenant with this slug already exists"))?;

    Ok(Json(tenant))
}
