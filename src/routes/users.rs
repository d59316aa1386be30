use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::password;
use crate::auth::permissions::Permission;
use crate::db;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<HashMap<Permission, bool>>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub permissions: Option<HashMap<Permission, bool>>,
}

fn to_stored(permissions: &HashMap<Permission, bool>) -> HashMap<String, bool> {
    permissions
        .iter()
        .map(|(p, granted)| (p.key().to_string(), *granted))
        .collect()
}

pub async fn list(
    auth: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = db::users::list_by_tenant(&state.pool, auth.tenant_id).await?;
    Ok(Json(users))
}

pub async fn get(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Name and email are required".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.len() < state.config.password_min_len {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            state.config.password_min_len
        )));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let role = req.role.unwrap_or(Role::Professional);
    let permissions = req.permissions.as_ref().map(to_stored).unwrap_or_default();

    let user = db::users::create(
        &state.pool,
        auth.tenant_id,
        &req.name,
        &req.email,
        &pw_hash,
        req.phone.as_deref(),
        role,
        &permissions,
    )
    .await
    .map_err(|e| AppError::from_db(e, "This email is already registered"))?;

    Ok(Json(user))
}

pub async fn update(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    let target = db::users::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // A tenant must always keep one active admin, otherwise nobody can
    // manage it again.
    let demotes = matches!(req.role, Some(r) if r != Role::Admin);
    let deactivates = req.is_active == Some(false);
    if target.role == Role::Admin && (demotes || deactivates) {
        let admins = db::users::count_active_admins(&state.pool, auth.tenant_id).await?;
        if admins <= 1 {
            return Err(AppError::BadRequest(
                "Cannot demote or deactivate the only admin of this clinic".to_string(),
            ));
        }
    }

    let permissions = req.permissions.as_ref().map(to_stored);

    let user = db::users::update(
        &state.pool,
        id,
        auth.tenant_id,
        req.name.as_deref(),
        req.phone.as_deref(),
        req.avatar.as_deref(),
        req.role,
        req.is_active,
        permissions.as_ref(),
    )
    .await
    .map_err(|e| AppError::from_db(e, "This email is already registered"))?;

    Ok(Json(user))
}

pub async fn delete(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let target = db::users::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if target.role == Role::Admin {
        let admins = db::users::count_active_admins(&state.pool, auth.tenant_id).await?;
        if admins <= 1 {
            return Err(AppError::BadRequest(
                "Cannot delete the only admin of this clinic".to_string(),
            ));
        }
    }

    let deleted = db::users::delete(&state.pool, id, auth.tenant_id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
