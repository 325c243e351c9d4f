pub mod admin;
pub mod anketas;
pub mod auth;
pub mod catalog;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::AppState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (axum::http::StatusCode, String) {
    common::metrics::encode_metrics()
}

/// Build the full application router: public reads, session-guarded
/// mutations, admin panels, docs and operational endpoints.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/anketas", get(anketas::list).post(anketas::create))
        .route("/api/anketas/:id", get(anketas::get))
        .route("/api/anketas/:id/active", post(anketas::set_active))
        .route("/api/anketas/:id/reviews", post(anketas::add_review))
        .route("/api/categories", get(catalog::categories))
        .route("/api/cities", get(catalog::cities));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    // every admin handler runs require_admin before touching the store
    let admin_routes = Router::new()
        .route("/admin/users", get(admin::users))
        .route("/admin/anketas", get(admin::anketas))
        .route("/admin/anketas/:id", delete(admin::delete_anketa))
        .route("/admin/categories", get(admin::categories).post(admin::create_category))
        .route("/admin/cities", get(admin::cities).post(admin::create_city));

    public
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
