use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::scope::{self, Record, Visibility};
use crate::models::{Role, User};

impl Record for User {
    const TABLE: &'static str = "users";
}

#[allow(clippy::too_many_arguments)]
pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    tenant_id: Uuid,
    name: &str,
    email: &str,
    password_hash: &str,
    phone: Option<&str>,
    role: Role,
    permissions: &HashMap<String, bool>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (tenant_id, name, email, password_hash, phone, role, permissions)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(tenant_id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(phone)
    .bind(role)
    .bind(Json(permissions))
    .fetch_one(executor)
    .await
}

/// Email lookup is global, not tenant-scoped: live emails are unique
/// across the whole system.
pub async fn find_by_email<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
    vis: Visibility,
) -> Result<Option<User>, sqlx::Error> {
    let sql = format!(
        "SELECT * FROM users WHERE lower(email) = lower($1){}",
        vis.clause()
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    vis: Visibility,
) -> Result<Option<User>, sqlx::Error> {
    scope::find_by_id::<User>(pool, id, vis).await
}

pub async fn find_in_tenant(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
    scope::find_in_tenant::<User>(pool, id, tenant_id, Visibility::Live).await
}

pub async fn list_by_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
    scope::list_in_tenant::<User>(pool, tenant_id, Visibility::Live, "ORDER BY created_at DESC")
        .await
}

/// Partial update. `None` leaves a field unchanged.
#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    phone: Option<&str>,
    avatar: Option<&str>,
    role: Option<Role>,
    is_active: Option<bool>,
    permissions: Option<&HashMap<String, bool>>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            name = COALESCE($3, name),
            phone = COALESCE($4, phone),
            avatar = COALESCE($5, avatar),
            role = COALESCE($6, role),
            is_active = COALESCE($7, is_active),
            permissions = COALESCE($8, permissions),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(phone)
    .bind(avatar)
    .bind(role)
    .bind(is_active)
    .bind(permissions.map(Json))
    .fetch_one(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Current permission map of a live, active user. `None` when the user is
/// gone, deactivated or soft-deleted.
pub async fn find_permissions(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<HashMap<String, bool>>, sqlx::Error> {
    let row = sqlx::query_scalar::<_, Json<HashMap<String, bool>>>(
        "SELECT permissions FROM users
         WHERE id = $1 AND is_active = true AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|json| json.0))
}

pub async fn count_active_admins(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users
         WHERE tenant_id = $1 AND role = 'admin' AND is_active = true AND deleted_at IS NULL",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    scope::soft_delete_in_tenant::<User>(pool, id, tenant_id).await
}
