pub mod anamnesis;
pub mod appointments;
pub mod auth;
pub mod clients;
pub mod financials;
pub mod packages;
pub mod services;
pub mod tenants;
pub mod users;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        // Tenant
        .route(
            "/api/v1/tenants/current",
            get(tenants::current).patch(tenants::update_current),
        )
        // Users
        .route("/api/v1/users", get(users::list).post(users::create))
        .route(
            "/api/v1/users/{id}",
            get(users::get).patch(users::update).delete(users::delete),
        )
        // Clients
        .route("/api/v1/clients", get(clients::list).post(clients::create))
        .route(
            "/api/v1/clients/{id}",
            get(clients::get)
                .patch(clients::update)
                .delete(clients::delete),
        )
        .route(
            "/api/v1/clients/{id}/packages",
            get(packages::list_for_client).post(packages::purchase),
        )
        .route(
            "/api/v1/clients/{id}/anamnesis",
            get(anamnesis::list_for_client).post(anamnesis::create),
        )
        // Anamnesis
        .route("/api/v1/anamnesis/{id}", get(anamnesis::get))
        .route("/api/v1/anamnesis/{id}/sign", post(anamnesis::sign))
        // Services
        .route(
            "/api/v1/services",
            get(services::list).post(services::create),
        )
        .route(
            "/api/v1/services/{id}",
            get(services::get)
                .patch(services::update)
                .delete(services::delete),
        )
        // Packages
        .route(
            "/api/v1/packages",
            get(packages::list).post(packages::create),
        )
        .route(
            "/api/v1/packages/{id}",
            get(packages::get)
                .patch(packages::update)
                .delete(packages::delete),
        )
        // Appointments
        .route(
            "/api/v1/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/api/v1/appointments/{id}",
            get(appointments::get)
                .patch(appointments::update)
                .delete(appointments::delete),
        )
        .route(
            "/api/v1/appointments/{id}/status",
            patch(appointments::update_status),
        )
        // Financials
        .route(
            "/api/v1/financials",
            get(financials::list).post(financials::create),
        )
        .route(
            "/api/v1/financials/{id}",
            patch(financials::update).delete(financials::delete),
        )
}
