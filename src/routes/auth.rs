use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::db;
use crate::db::scope::Visibility;
use crate::error::AppError;
use crate::models::{Role, Tenant, User};
use crate::state::SharedState;

/// One message for both unknown email and wrong password, so responses
/// never reveal which one it was.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

const FORGOT_PASSWORD_ACK: &str =
    "If the email exists, you will receive instructions to reset your password";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub tenant_name: String,
    pub tenant_slug: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: RegisteredUser,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub tenant: TenantSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: LoggedInUser,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedInUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub tenant: TenantBranding,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantBranding {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
}

impl TenantBranding {
    fn from_tenant(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            logo: tenant.logo.clone(),
            primary_color: tenant.primary_color.clone(),
            secondary_color: tenant.secondary_color.clone(),
        }
    }
}

fn issue_token(state: &SharedState, user: &User) -> Result<String, AppError> {
    let claims = Claims::new(
        user.id,
        user.tenant_id,
        user.role,
        user.email.clone(),
        state.config.jwt_expires_days,
    );
    encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)
}

fn validate_password(state: &SharedState, password: &str) -> Result<(), AppError> {
    let min = state.config.password_min_len;
    if password.len() < min {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {min} characters"
        )));
    }
    Ok(())
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if req.tenant_name.trim().is_empty()
        || req.tenant_slug.trim().is_empty()
        || req.name.trim().is_empty()
        || req.email.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "All required fields must be provided".to_string(),
        ));
    }
    validate_slug(&req.tenant_slug)?;
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    validate_password(&state, &req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Tenant and admin user are created all-or-nothing; the pre-checks run
    // inside the same transaction, with the partial unique indexes as the
    // race backstop.
    let mut tx = state.pool.begin().await?;

    if db::tenants::find_by_slug(&mut *tx, &req.tenant_slug, Visibility::Live)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("This slug is already in use".to_string()));
    }

    if db::users::find_by_email(&mut *tx, &req.email, Visibility::Live)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "This email is already registered".to_string(),
        ));
    }

    let tenant = db::tenants::create(&mut *tx, &req.tenant_name, &req.tenant_slug)
        .await
        .map_err(|e| AppError::from_db(e, "This slug is already in use"))?;

    let user = db::users::create(
        &mut *tx,
        tenant.id,
        &req.name,
        &req.email,
        &pw_hash,
        req.phone.as_deref(),
        Role::Admin,
        &HashMap::new(),
    )
    .await
    .map_err(|e| AppError::from_db(e, "This email is already registered"))?;

    tx.commit().await?;

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Clinic registered successfully".to_string(),
            token,
            user: RegisteredUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
                tenant: TenantSummary {
                    id: tenant.id,
                    name: tenant.name,
                    slug: tenant.slug,
                },
            },
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = db::users::find_by_email(&state.pool, &req.email, Visibility::Live)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let tenant = db::tenants::find_by_id(&state.pool, user.tenant_id, Visibility::Live)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::Unauthorized("Clinic is inactive or blocked".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    // Best effort: a failed stamp must not block the login.
    if let Err(e) = db::users::touch_last_login(&state.pool, user.id).await {
        tracing::warn!("Failed to record last login for {}: {e}", user.id);
    }

    let token = issue_token(&state, &user)?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: LoggedInUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            avatar: user.avatar,
            tenant: TenantBranding::from_tenant(&tenant),
        },
    }))
}

fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // Identical ack whether or not the account exists; the lookup and
    // delivery run detached so response timing gives nothing away either.
    let response = Json(MessageResponse {
        message: FORGOT_PASSWORD_ACK.to_string(),
    });

    let pool = state.pool.clone();
    let mailer = state.mailer.clone();
    let base_url = state.config.base_url.clone();

    tokio::spawn(async move {
        let user = match db::users::find_by_email(&pool, &req.email, Visibility::Live).await {
            Ok(Some(user)) if user.is_active => user,
            _ => return,
        };

        let token = generate_reset_token();
        let token_hash = hash_token(&token);

        if db::password_reset_tokens::create(&pool, user.id, &token_hash, Utc::now() + Duration::hours(1))
            .await
            .is_err()
        {
            return;
        }

        if let Some(mailer) = mailer {
            let reset_url = format!("{base_url}/reset-password?token={token}");
            if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                tracing::error!("Failed to send password reset email: {e}");
            }
        } else {
            tracing::warn!(
                "SMTP not configured. Password reset token for {}: {token}",
                user.email
            );
        }
    });

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_password(&state, &req.password)?;

    let token_hash = hash_token(&req.token);

    let reset_token = db::password_reset_tokens::find_valid_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    // Single use: burn it before touching the password.
    db::password_reset_tokens::mark_used(&state.pool, reset_token.id).await?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, reset_token.user_id, &pw_hash).await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 100 {
        return Err(AppError::BadRequest(
            "Slug must be between 1 and 100 characters".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::BadRequest(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    Ok(())
}
