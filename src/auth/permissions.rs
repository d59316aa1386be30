use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::extractor::CurrentUser;
use crate::db;
use crate::error::AppError;
use crate::models::Role;

/// The closed set of grantable permission keys. Stored in the user's
/// permission map under the snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageClients,
    ManageServices,
    ManageAppointments,
    ManageFinancials,
    ViewFinancials,
}

impl Permission {
    pub fn key(&self) -> &'static str {
        match self {
            Permission::ManageClients => "manage_clients",
            Permission::ManageServices => "manage_services",
            Permission::ManageAppointments => "manage_appointments",
            Permission::ManageFinancials => "manage_financials",
            Permission::ViewFinancials => "view_financials",
        }
    }
}

/// Admins bypass the permission map entirely. Everyone else is checked
/// against the map as currently stored, never against token claims, so a
/// revocation takes effect on the next request.
pub async fn require(
    pool: &PgPool,
    auth: &CurrentUser,
    permission: Permission,
) -> Result<(), AppError> {
    if auth.role == Role::Admin {
        return Ok(());
    }

    let permissions = db::users::find_permissions(pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if permissions.get(permission.key()).copied().unwrap_or(false) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You do not have permission to: {}",
            permission.key()
        )))
    }
}
