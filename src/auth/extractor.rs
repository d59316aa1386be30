use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::jwt::{self, TokenError};
use crate::db;
use crate::db::scope::Visibility;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// Minimal tenant summary carried on the verified identity.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

/// Verified request identity. Built fresh per request: the token's claims
/// are only a hint, liveness always comes from storage.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    pub email: String,
    pub tenant: TenantContext,
}

impl CurrentUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to access this resource".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin])
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Authentication token not provided".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    // Exactly "Bearer <token>", nothing else.
    let mut words = value.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        )),
    }
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = jwt::decode_token(token, &state.config.jwt_secret).map_err(|e| {
            match e {
                TokenError::Expired => tracing::debug!("rejected expired token"),
                TokenError::Invalid => tracing::debug!("rejected malformed or forged token"),
            }
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let user = db::users::find_by_id(&state.pool, claims.sub, Visibility::Live)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User is invalid or inactive".to_string()))?;

        let tenant = db::tenants::find_by_id(&state.pool, user.tenant_id, Visibility::Live)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| AppError::Unauthorized("Clinic is inactive or blocked".to_string()))?;

        Ok(CurrentUser {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
            email: user.email,
            tenant: TenantContext {
                id: tenant.id,
                slug: tenant.slug,
                name: tenant.name,
            },
        })
    }
}
