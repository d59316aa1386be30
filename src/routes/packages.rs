use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::{ClientPackage, Package, Service};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreatePackage {
    pub name: String,
    pub session_count: i32,
    pub total_price_cents: i64,
    pub service_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdatePackage {
    pub name: Option<String>,
    pub session_count: Option<i32>,
    pub total_price_cents: Option<i64>,
    pub service_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct PurchasePackage {
    pub package_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct PackageWithServices {
    #[serde(flatten)]
    pub package: Package,
    pub services: Vec<Service>,
}

async fn with_services(
    state: &SharedState,
    package: Package,
) -> Result<PackageWithServices, AppError> {
    let services = db::packages::services_for(&state.pool, package.id).await?;
    Ok(PackageWithServices { package, services })
}

/// Resolves the requested service ids within the tenant, rejecting unknown
/// or foreign ones.
async fn resolve_services(
    state: &SharedState,
    tenant_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<Service>, AppError> {
    let services = db::services::find_by_ids(&state.pool, ids, tenant_id).await?;
    if services.len() != ids.len() {
        return Err(AppError::BadRequest(
            "One or more services do not exist".to_string(),
        ));
    }
    Ok(services)
}

pub async fn list(
    auth: CurrentUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<PackageWithServices>>, AppError> {
    let packages = db::packages::list(&state.pool, auth.tenant_id).await?;

    let mut out = Vec::with_capacity(packages.len());
    for package in packages {
        out.push(with_services(&state, package).await?);
    }
    Ok(Json(out))
}

pub async fn get(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PackageWithServices>, AppError> {
    let package = db::packages::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".to_string()))?;
    Ok(Json(with_services(&state, package).await?))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<CreatePackage>,
) -> Result<Json<PackageWithServices>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;

    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if req.session_count <= 0 {
        return Err(AppError::BadRequest(
            "Session count must be positive".to_string(),
        ));
    }
    if req.service_ids.is_empty() {
        return Err(AppError::BadRequest(
            "A package needs at least one service".to_string(),
        ));
    }

    resolve_services(&state, auth.tenant_id, &req.service_ids).await?;

    let package = db::packages::create(
        &state.pool,
        auth.tenant_id,
        &req.name,
        req.session_count,
        req.total_price_cents,
        &req.service_ids,
    )
    .await?;

    Ok(Json(with_services(&state, package).await?))
}

pub async fn update(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePackage>,
) -> Result<Json<PackageWithServices>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;

    if let Some(ids) = &req.service_ids {
        if ids.is_empty() {
            return Err(AppError::BadRequest(
                "A package needs at least one service".to_string(),
            ));
        }
        resolve_services(&state, auth.tenant_id, ids).await?;
    }

    let package = db::packages::update(
        &state.pool,
        id,
        auth.tenant_id,
        req.name.as_deref(),
        req.session_count,
        req.total_price_cents,
        req.service_ids.as_deref(),
    )
    .await
    .map_err(|e| AppError::from_db(e, "Conflicting package data"))?;

    Ok(Json(with_services(&state, package).await?))
}

pub async fn delete(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;

    let deleted = db::packages::delete(&state.pool, id, auth.tenant_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Package not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn list_for_client(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<ClientPackage>>, AppError> {
    db::clients::find_in_tenant(&state.pool, client_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    let purchases = db::packages::list_for_client(&state.pool, client_id, auth.tenant_id).await?;
    Ok(Json(purchases))
}

pub async fn purchase(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(client_id): Path<Uuid>,
    Json(req): Json<PurchasePackage>,
) -> Result<Json<ClientPackage>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageServices).await?;

    db::clients::find_in_tenant(&state.pool, client_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    let package = db::packages::find_in_tenant(&state.pool, req.package_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".to_string()))?;

    let purchase = db::packages::purchase(
        &state.pool,
        auth.tenant_id,
        client_id,
        package.id,
        package.session_count,
        req.expires_at,
    )
    .await?;

    Ok(Json(purchase))
}
