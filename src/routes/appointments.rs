use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::auth::permissions::{self, Permission};
use crate::db;
use crate::error::AppError;
use crate::models::{Appointment, AppointmentService, AppointmentStatus};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListAppointments {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub professional_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CreateAppointment {
    pub client_id: Uuid,
    pub professional_id: Option<Uuid>,
    pub service_ids: Vec<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateAppointment {
    pub professional_id: Option<Uuid>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatus {
    pub status: AppointmentStatus,
}

#[derive(Serialize)]
pub struct AppointmentWithServices {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub services: Vec<AppointmentService>,
}

async fn with_services(
    state: &SharedState,
    appointment: Appointment,
) -> Result<AppointmentWithServices, AppError> {
    let services = db::appointments::services_for(&state.pool, appointment.id).await?;
    Ok(AppointmentWithServices {
        appointment,
        services,
    })
}

/// A professional must be a live, active user of the same tenant.
async fn check_professional(
    state: &SharedState,
    tenant_id: Uuid,
    professional_id: Uuid,
) -> Result<(), AppError> {
    db::users::find_in_tenant(&state.pool, professional_id, tenant_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::NotFound("Professional not found".to_string()))?;
    Ok(())
}

pub async fn list(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Query(params): Query<ListAppointments>,
) -> Result<Json<Vec<AppointmentWithServices>>, AppError> {
    let appointments = db::appointments::list(
        &state.pool,
        auth.tenant_id,
        params.from,
        params.to,
        params.professional_id,
    )
    .await?;

    let mut out = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        out.push(with_services(&state, appointment).await?);
    }
    Ok(Json(out))
}

pub async fn get(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentWithServices>, AppError> {
    let appointment = db::appointments::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
    Ok(Json(with_services(&state, appointment).await?))
}

pub async fn create(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateAppointment>,
) -> Result<Json<AppointmentWithServices>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageAppointments).await?;

    if req.ends_at <= req.starts_at {
        return Err(AppError::BadRequest(
            "Appointment must end after it starts".to_string(),
        ));
    }
    if req.service_ids.is_empty() {
        return Err(AppError::BadRequest(
            "An appointment needs at least one service".to_string(),
        ));
    }

    db::clients::find_in_tenant(&state.pool, req.client_id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    if let Some(professional_id) = req.professional_id {
        check_professional(&state, auth.tenant_id, professional_id).await?;
    }

    let services = db::services::find_by_ids(&state.pool, &req.service_ids, auth.tenant_id).await?;
    if services.len() != req.service_ids.len() {
        return Err(AppError::BadRequest(
            "One or more services do not exist".to_string(),
        ));
    }

    let (appointment, snapshots) = db::appointments::create(
        &state.pool,
        auth.tenant_id,
        req.client_id,
        req.professional_id,
        req.starts_at,
        req.ends_at,
        req.notes.as_deref(),
        &services,
    )
    .await?;

    Ok(Json(AppointmentWithServices {
        appointment,
        services: snapshots,
    }))
}

pub async fn update(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAppointment>,
) -> Result<Json<AppointmentWithServices>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageAppointments).await?;

    let existing = db::appointments::find_in_tenant(&state.pool, id, auth.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    let professional_id = req.professional_id.or(existing.professional_id);
    let starts_at = req.starts_at.unwrap_or(existing.starts_at);
    let ends_at = req.ends_at.unwrap_or(existing.ends_at);
    let notes = req.notes.or(existing.notes);

    if ends_at <= starts_at {
        return Err(AppError::BadRequest(
            "Appointment must end after it starts".to_string(),
        ));
    }
    if let Some(pid) = req.professional_id {
        check_professional(&state, auth.tenant_id, pid).await?;
    }

    let appointment = db::appointments::update(
        &state.pool,
        id,
        auth.tenant_id,
        professional_id,
        starts_at,
        ends_at,
        notes.as_deref(),
    )
    .await?;

    Ok(Json(with_services(&state, appointment).await?))
}

pub async fn update_status(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatus>,
) -> Result<Json<AppointmentWithServices>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageAppointments).await?;

    let appointment = db::appointments::update_status(&state.pool, id, auth.tenant_id, req.status)
        .await
        .map_err(|e| AppError::from_db(e, "Conflicting appointment data"))?;

    Ok(Json(with_services(&state, appointment).await?))
}

pub async fn delete(
    auth: CurrentUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    permissions::require(&state.pool, &auth, Permission::ManageAppointments).await?;

    let deleted = db::appointments::delete(&state.pool, id, auth.tenant_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Appointment not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
