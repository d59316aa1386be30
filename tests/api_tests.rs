mod common;

use std::collections::HashMap;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use estetica::auth::jwt::{self, Claims, TokenError};
use estetica::db::scope::{self, Visibility};
use estetica::models::{Client, Role};

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "test");

    common::cleanup(app).await;
}

// ── Session tokens ──────────────────────────────────────────────

#[test]
fn token_round_trip_preserves_claims() {
    let user_id = Uuid::now_v7();
    let tenant_id = Uuid::now_v7();
    let claims = Claims::new(user_id, tenant_id, Role::Admin, "ana@x.com".to_string(), 7);

    let token = jwt::encode_token(&claims, "secret").unwrap();
    let parsed = jwt::decode_token(&token, "secret").unwrap();

    assert_eq!(parsed.sub, user_id);
    assert_eq!(parsed.tid, tenant_id);
    assert_eq!(parsed.role, Role::Admin);
    assert_eq!(parsed.email, "ana@x.com");
    assert!(parsed.exp > parsed.iat);
}

#[test]
fn expired_token_is_distinguished_from_forged() {
    let claims = Claims::new(
        Uuid::now_v7(),
        Uuid::now_v7(),
        Role::Professional,
        "x@y.z".to_string(),
        -1,
    );
    let token = jwt::encode_token(&claims, "secret").unwrap();

    assert_eq!(jwt::decode_token(&token, "secret"), Err(TokenError::Expired));
    assert_eq!(
        jwt::decode_token(&token, "wrong-secret"),
        Err(TokenError::Invalid)
    );
    assert_eq!(
        jwt::decode_token("not-a-token", "secret"),
        Err(TokenError::Invalid)
    );
}

// ── Registration ────────────────────────────────────────────────

#[tokio::test]
async fn register_creates_tenant_and_admin() {
    let app = common::spawn_app().await;

    let (body, status) = app
        .register("Bella Clinic", "bella-clinic", "Ana", "ana@x.com", "secret1")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["tenant"]["slug"], "bella-clinic");
    assert!(body["user"].get("password_hash").is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_taken_slug() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app
        .register("Other Clinic", "bella-clinic", "Bia", "bia@test.com", "secret1")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("slug"));

    // No partial rows behind the conflict
    let tenants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(tenants, 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_taken_email() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app
        .register("Other Clinic", "other-clinic", "Ana", "ana@test.com", "secret1")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("email"));

    let tenants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE slug = 'other-clinic'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(tenants, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .register("Bella Clinic", "bella-clinic", "Ana", "ana@x.com", "short")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_bad_slug() {
    let app = common::spawn_app().await;

    let (_, status) = app
        .register("Bella Clinic", "Bella Clinic!", "Ana", "ana@x.com", "secret1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn tenant_without_admin_never_persists() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    // Drive the same repository calls the handler makes, forcing the user
    // insert to fail after the tenant insert succeeded.
    let mut tx = app.pool.begin().await.unwrap();
    let tenant = estetica::db::tenants::create(&mut *tx, "Atomic Clinic", "atomic-clinic")
        .await
        .unwrap();
    let dup = estetica::db::users::create(
        &mut *tx,
        tenant.id,
        "Dup",
        "ana@test.com", // already taken by the bootstrap admin
        "not-a-real-hash",
        None,
        Role::Admin,
        &HashMap::new(),
    )
    .await;
    assert!(dup.is_err());
    tx.rollback().await.unwrap();

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE slug = 'atomic-clinic'")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(count, 0);

    common::cleanup(app).await;
}

// ── Login ───────────────────────────────────────────────────────

#[tokio::test]
async fn login_returns_token_and_branding() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.login("ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["tenant"]["slug"], "bella-clinic");
    assert!(body["user"]["tenant"].get("logo").is_some());
    assert!(body["user"]["tenant"].get("primaryColor").is_some());

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (wrong_pw_body, wrong_pw_status) = app.login("ana@test.com", "wrongpass").await;
    let (no_user_body, no_user_status) = app.login("nobody@test.com", "password123").await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_rejects_inactive_tenant() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    sqlx::query("UPDATE tenants SET is_active = false WHERE slug = 'bella-clinic'")
        .execute(&app.pool)
        .await
        .unwrap();

    let (_, status) = app.login("ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_rejects_deactivated_user() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    sqlx::query("UPDATE users SET is_active = false WHERE email = 'ana@test.com'")
        .execute(&app.pool)
        .await
        .unwrap();

    let (_, status) = app.login("ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_records_last_login() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    app.login("ana@test.com", "password123").await;

    let last_login: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT last_login_at FROM users WHERE email = 'ana@test.com'")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(last_login.is_some());

    common::cleanup(app).await;
}

// ── Request gatekeeper ──────────────────────────────────────────

#[tokio::test]
async fn protected_route_requires_token() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let resp = app
        .client
        .get(app.url("/api/v1/clients"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn malformed_authorization_headers_are_rejected() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    for header in [
        "Token abc".to_string(),
        "Bearer".to_string(),
        format!("Bearer {token} extra"),
        "garbage".to_string(),
    ] {
        let resp = app
            .client
            .get(app.url("/api/v1/clients"))
            .header("authorization", &header)
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status(),
            StatusCode::UNAUTHORIZED,
            "header {header:?} should be rejected"
        );
    }

    common::cleanup(app).await;
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let claims = Claims::new(
        Uuid::now_v7(),
        Uuid::now_v7(),
        Role::Admin,
        "ana@test.com".to_string(),
        7,
    );
    let forged = jwt::encode_token(&claims, "some-other-secret").unwrap();

    let (_, status) = app.get_auth("/api/v1/clients", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn valid_token_is_rejected_after_user_deactivation() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (_, status) = app.get_auth("/api/v1/clients", &token).await;
    assert_eq!(status, StatusCode::OK);

    sqlx::query("UPDATE users SET is_active = false WHERE email = 'ana@test.com'")
        .execute(&app.pool)
        .await
        .unwrap();

    // Token is still validly signed and unexpired, but liveness comes from
    // storage.
    let (_, status) = app.get_auth("/api/v1/clients", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn valid_token_is_rejected_after_user_soft_delete() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    sqlx::query("UPDATE users SET deleted_at = now() WHERE email = 'ana@test.com'")
        .execute(&app.pool)
        .await
        .unwrap();

    let (_, status) = app.get_auth("/api/v1/clients", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn valid_token_is_rejected_after_tenant_deactivation() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    sqlx::query("UPDATE tenants SET is_active = false WHERE slug = 'bella-clinic'")
        .execute(&app.pool)
        .await
        .unwrap();

    let (_, status) = app.get_auth("/api/v1/clients", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn valid_token_is_rejected_after_tenant_soft_delete() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    sqlx::query("UPDATE tenants SET deleted_at = now() WHERE slug = 'bella-clinic'")
        .execute(&app.pool)
        .await
        .unwrap();

    let (_, status) = app.get_auth("/api/v1/clients", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Roles & permissions ─────────────────────────────────────────

/// Creates a receptionist with the given permissions, returns their token.
async fn add_receptionist(
    app: &common::TestApp,
    admin_token: &str,
    email: &str,
    permissions: serde_json::Value,
) -> String {
    let (body, status) = app
        .post_auth(
            "/api/v1/users",
            admin_token,
            &json!({
                "name": "Rec",
                "email": email,
                "password": "password123",
                "role": "receptionist",
                "permissions": permissions,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create receptionist failed: {body}");

    let (login_body, status) = app.login(email, "password123").await;
    assert_eq!(status, StatusCode::OK);
    login_body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn non_admin_without_permission_is_forbidden() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let rec = add_receptionist(&app, &admin, "rec@test.com", json!({})).await;

    let (_, status) = app
        .post_auth(
            "/api/v1/clients",
            &rec,
            &json!({ "name": "Maria", "phone": "1199999" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn permission_grant_applies_without_new_token() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let rec = add_receptionist(&app, &admin, "rec@test.com", json!({})).await;

    let (_, status) = app
        .post_auth(
            "/api/v1/clients",
            &rec,
            &json!({ "name": "Maria", "phone": "1199999" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Grant the permission; the receptionist keeps using the same token.
    let rec_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'rec@test.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let (_, status) = app
        .patch_auth(
            &format!("/api/v1/users/{rec_id}"),
            &admin,
            &json!({ "permissions": { "manage_clients": true } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .post_auth(
            "/api/v1/clients",
            &rec,
            &json!({ "name": "Maria", "phone": "1199999" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_bypasses_permission_checks() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    // The admin has an empty permission map and still passes every check.
    let (_, status) = app
        .post_auth(
            "/api/v1/clients",
            &admin,
            &json!({ "name": "Maria", "phone": "1199999" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app.get_auth("/api/v1/financials", &admin).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn non_admin_cannot_update_tenant_or_manage_users() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let rec = add_receptionist(&app, &admin, "rec@test.com", json!({})).await;

    let (_, status) = app
        .patch_auth("/api/v1/tenants/current", &rec, &json!({ "name": "Mine now" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app
        .post_auth(
            "/api/v1/users",
            &rec,
            &json!({ "name": "X", "email": "x@test.com", "password": "password123" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn view_financials_is_separate_from_manage() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let rec = add_receptionist(
        &app,
        &admin,
        "rec@test.com",
        json!({ "view_financials": true }),
    )
    .await;

    let (_, status) = app.get_auth("/api/v1/financials", &rec).await;
    assert_eq!(status, StatusCode::OK);

    let client = app.create_client(&admin, "Maria", "1199999").await;
    let (_, status) = app
        .post_auth(
            "/api/v1/financials",
            &rec,
            &json!({
                "client_id": client["id"],
                "amount_cents": 10000,
                "payment_method": "pix",
                "status": "paid",
                "entry_date": "2026-08-07",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

// ── Clients & soft delete ───────────────────────────────────────

#[tokio::test]
async fn client_crud_round_trip() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria Silva", "11988887777").await;
    let id = client["id"].as_str().unwrap().to_string();

    let (list, status) = app.get_auth("/api/v1/clients", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (found, status) = app
        .get_auth("/api/v1/clients?search=maria", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (updated, status) = app
        .patch_auth(
            &format!("/api/v1/clients/{id}"),
            &token,
            &json!({ "notes": "prefers mornings" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "prefers mornings");
    assert_eq!(updated["name"], "Maria Silva");

    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Default reads exclude the soft-deleted row
    let (list, _) = app.get_auth("/api/v1/clients", &token).await;
    assert!(list.as_array().unwrap().is_empty());
    let (_, status) = app.get_auth(&format!("/api/v1/clients/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn soft_delete_stamps_instead_of_removing() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let id: Uuid = client["id"].as_str().unwrap().parse().unwrap();

    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Default visibility hides the row; the explicit override sees it,
    // stamped rather than removed.
    let live = scope::find_by_id::<Client>(&app.pool, id, Visibility::Live)
        .await
        .unwrap();
    assert!(live.is_none());

    let all = scope::find_by_id::<Client>(&app.pool, id, Visibility::All)
        .await
        .unwrap()
        .expect("row must still exist physically");
    assert!(all.deleted_at.is_some());

    common::cleanup(app).await;
}

#[tokio::test]
async fn deleting_twice_reports_not_found() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let id = client["id"].as_str().unwrap();

    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{id}"), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn client_delete_cascades_to_dependents() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (record, status) = app
        .post_auth(
            &format!("/api/v1/clients/{client_id}/anamnesis"),
            &token,
            &json!({
                "questions": [{ "id": "q1", "text": "Allergies?", "type": "text" }],
                "answers": [{ "question_id": "q1", "value": "none" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let record_id = record["id"].as_str().unwrap();

    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{client_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    // The delete-many rewrite stamped the dependent rows too
    let (_, status) = app
        .get_auth(&format!("/api/v1/anamnesis/{record_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let deleted_at: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT deleted_at FROM anamnesis_records WHERE id = $1::uuid")
            .bind(record_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert!(deleted_at.is_some());

    common::cleanup(app).await;
}

// ── Tenant isolation ────────────────────────────────────────────

#[tokio::test]
async fn tenants_cannot_see_each_other() {
    let app = common::spawn_app().await;
    let token_a = app.bootstrap().await;

    let (body, status) = app
        .register("Other Clinic", "other-clinic", "Bia", "bia@test.com", "password123")
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token_b = body["token"].as_str().unwrap().to_string();

    let client = app.create_client(&token_a, "Maria", "1199999").await;
    let id = client["id"].as_str().unwrap();

    let (list, status) = app.get_auth("/api/v1/clients", &token_b).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let (_, status) = app.get_auth(&format!("/api/v1/clients/{id}"), &token_b).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, status) = app
        .delete_auth(&format!("/api/v1/clients/{id}"), &token_b)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Tenant A still sees its client untouched
    let (_, status) = app.get_auth(&format!("/api/v1/clients/{id}"), &token_a).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

// ── Services & packages ─────────────────────────────────────────

#[tokio::test]
async fn service_and_package_lifecycle() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let service = app.create_service(&token, "Limpeza de Pele", 15000).await;
    let service_id = service["id"].as_str().unwrap().to_string();

    let (package, status) = app
        .post_auth(
            "/api/v1/packages",
            &token,
            &json!({
                "name": "Pacote Facial",
                "session_count": 5,
                "total_price_cents": 60000,
                "service_ids": [service_id],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create package failed: {package}");
    assert_eq!(package["services"].as_array().unwrap().len(), 1);
    let package_id = package["id"].as_str().unwrap().to_string();

    // Unknown service ids are rejected
    let (_, status) = app
        .post_auth(
            "/api/v1/packages",
            &token,
            &json!({
                "name": "Broken",
                "session_count": 1,
                "total_price_cents": 1000,
                "service_ids": [Uuid::now_v7()],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Purchase for a client
    let client = app.create_client(&token, "Maria", "1199999").await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (purchase, status) = app
        .post_auth(
            &format!("/api/v1/clients/{client_id}/packages"),
            &token,
            &json!({ "package_id": package_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purchase["remaining_sessions"], 5);
    assert_eq!(purchase["total_sessions"], 5);

    let (purchases, status) = app
        .get_auth(&format!("/api/v1/clients/{client_id}/packages"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(purchases.as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

// ── Appointments ────────────────────────────────────────────────

#[tokio::test]
async fn appointment_snapshots_services_at_booking_time() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let service = app.create_service(&token, "Massagem", 20000).await;
    let service_id = service["id"].as_str().unwrap().to_string();

    let (appointment, status) = app
        .post_auth(
            "/api/v1/appointments",
            &token,
            &json!({
                "client_id": client["id"],
                "service_ids": [service_id],
                "starts_at": "2030-05-20T13:00:00Z",
                "ends_at": "2030-05-20T14:00:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create appointment failed: {appointment}");
    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["services"][0]["price_cents"], 20000);
    let appointment_id = appointment["id"].as_str().unwrap().to_string();

    // Raising the service price must not rewrite the booked snapshot
    let (_, status) = app
        .patch_auth(
            &format!("/api/v1/services/{service_id}"),
            &token,
            &json!({ "price_cents": 99000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (fetched, status) = app
        .get_auth(&format!("/api/v1/appointments/{appointment_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["services"][0]["price_cents"], 20000);

    common::cleanup(app).await;
}

#[tokio::test]
async fn appointment_rejects_inverted_times() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let service = app.create_service(&token, "Massagem", 20000).await;

    let (_, status) = app
        .post_auth(
            "/api/v1/appointments",
            &token,
            &json!({
                "client_id": client["id"],
                "service_ids": [service["id"]],
                "starts_at": "2030-05-20T14:00:00Z",
                "ends_at": "2030-05-20T13:00:00Z",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn appointment_status_and_date_filters() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let service = app.create_service(&token, "Massagem", 20000).await;

    let (appointment, _) = app
        .post_auth(
            "/api/v1/appointments",
            &token,
            &json!({
                "client_id": client["id"],
                "service_ids": [service["id"]],
                "starts_at": "2030-05-20T13:00:00Z",
                "ends_at": "2030-05-20T14:00:00Z",
            }),
        )
        .await;
    let id = appointment["id"].as_str().unwrap().to_string();

    let (updated, status) = app
        .patch_auth(
            &format!("/api/v1/appointments/{id}/status"),
            &token,
            &json!({ "status": "confirmed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "confirmed");

    let (inside, status) = app
        .get_auth(
            "/api/v1/appointments?from=2030-05-20T00:00:00Z&to=2030-05-21T00:00:00Z",
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inside.as_array().unwrap().len(), 1);

    let (outside, status) = app
        .get_auth(
            "/api/v1/appointments?from=2030-06-01T00:00:00Z",
            &token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(outside.as_array().unwrap().is_empty());

    common::cleanup(app).await;
}

// ── Financials ──────────────────────────────────────────────────

#[tokio::test]
async fn financial_entries_filter_by_status() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;

    for (amount, status_name) in [(10000, "paid"), (5000, "pending")] {
        let (_, status) = app
            .post_auth(
                "/api/v1/financials",
                &token,
                &json!({
                    "client_id": client["id"],
                    "amount_cents": amount,
                    "payment_method": "pix",
                    "status": status_name,
                    "entry_date": "2026-08-07",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (all, _) = app.get_auth("/api/v1/financials", &token).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (paid, _) = app.get_auth("/api/v1/financials?status=paid", &token).await;
    assert_eq!(paid.as_array().unwrap().len(), 1);
    assert_eq!(paid[0]["amount_cents"], 10000);

    common::cleanup(app).await;
}

#[tokio::test]
async fn financial_entry_rejects_foreign_client() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (_, status) = app
        .post_auth(
            "/api/v1/financials",
            &token,
            &json!({
                "client_id": Uuid::now_v7(),
                "amount_cents": 10000,
                "payment_method": "cash",
                "status": "paid",
                "entry_date": "2026-08-07",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

// ── Password reset ──────────────────────────────────────────────

#[tokio::test]
async fn forgot_password_acks_uniformly() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let mut bodies = Vec::new();
    for email in ["ana@test.com", "ana@test.com", "nobody@test.com"] {
        let resp = app
            .client
            .post(app.url("/api/v1/auth/forgot-password"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        bodies.push(resp.json::<serde_json::Value>().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0], bodies[2]);

    common::cleanup(app).await;
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let user_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'ana@test.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    // Seed a reset token the way the forgot-password task would
    let token = "a-known-test-reset-token";
    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
         VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(sha256_hex(token))
    .bind(Utc::now() + Duration::hours(1))
    .execute(&app.pool)
    .await
    .unwrap();

    let resp = app
        .client
        .post(app.url("/api/v1/auth/reset-password"))
        .json(&json!({ "token": token, "password": "newpassword1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Old password is gone, new one works
    let (_, status) = app.login("ana@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, status) = app.login("ana@test.com", "newpassword1").await;
    assert_eq!(status, StatusCode::OK);

    // Second use of the same token fails
    let resp = app
        .client
        .post(app.url("/api/v1/auth/reset-password"))
        .json(&json!({ "token": token, "password": "anotherpass1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let user_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'ana@test.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let token = "an-expired-test-reset-token";
    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
         VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(sha256_hex(token))
    .bind(Utc::now() - Duration::hours(1))
    .execute(&app.pool)
    .await
    .unwrap();

    let resp = app
        .client
        .post(app.url("/api/v1/auth/reset-password"))
        .json(&json!({ "token": token, "password": "newpassword1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

// ── Tenant users ────────────────────────────────────────────────

#[tokio::test]
async fn admin_cannot_delete_self_or_last_admin() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let admin_id: Uuid = sqlx::query_scalar("SELECT id FROM users WHERE email = 'ana@test.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let (_, status) = app
        .delete_auth(&format!("/api/v1/users/{admin_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = app
        .patch_auth(
            &format!("/api/v1/users/{admin_id}"),
            &admin,
            &json!({ "role": "professional" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn admin_manages_tenant_users() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (user, status) = app
        .post_auth(
            "/api/v1/users",
            &admin,
            &json!({
                "name": "Paula",
                "email": "paula@test.com",
                "password": "password123",
                "role": "professional",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "professional");
    assert!(user.get("password_hash").is_none());
    let user_id = user["id"].as_str().unwrap().to_string();

    let (list, _) = app.get_auth("/api/v1/users", &admin).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (_, status) = app
        .delete_auth(&format!("/api/v1/users/{user_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Soft-deleted professionals can no longer log in
    let (_, status) = app.login("paula@test.com", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Tenant profile ──────────────────────────────────────────────

#[tokio::test]
async fn tenant_branding_update() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;

    let (tenant, status) = app.get_auth("/api/v1/tenants/current", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["slug"], "bella-clinic");
    assert_eq!(tenant["plan"], "basic");

    let (updated, status) = app
        .patch_auth(
            "/api/v1/tenants/current",
            &admin,
            &json!({ "primary_color": "#b76e79" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["primary_color"], "#b76e79");
    assert_eq!(updated["name"], "Bella Clinic");

    common::cleanup(app).await;
}

// ── Anamnesis ───────────────────────────────────────────────────

#[tokio::test]
async fn anamnesis_sign_is_write_once() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let client = app.create_client(&token, "Maria", "1199999").await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (record, status) = app
        .post_auth(
            &format!("/api/v1/clients/{client_id}/anamnesis"),
            &token,
            &json!({
                "questions": [{ "id": "q1", "text": "Allergies?", "type": "text" }],
                "answers": [{ "question_id": "q1", "value": "none" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let record_id = record["id"].as_str().unwrap().to_string();

    let (signed, status) = app
        .post_auth(
            &format!("/api/v1/anamnesis/{record_id}/sign"),
            &token,
            &json!({ "signed_by": "Maria Silva" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(signed["signed_at"].is_string());

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/anamnesis/{record_id}/sign"),
            &token,
            &json!({ "signed_by": "Someone Else" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::cleanup(app).await;
}
