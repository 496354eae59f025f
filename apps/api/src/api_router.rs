use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, put};
use staffline_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;


pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/me", get(handlers::me::me_handler))
        .route(
            "/api/activity",
            get(handlers::activity::list_activity_handler),
        )
        .route(
            "/api/activity/export",
            get(handlers::activity::export_activity_handler),
        )
        .route(
            "/api/admin/summary",
            get(handlers::admin::admin_summary_handler),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users_handler).post(handlers::users::provision_user_handler),
        )
        .route(
            "/api/users/{user_id}/role",
            put(handlers::users::change_role_handler),
        )
        .route(
            "/api/users/{user_id}/status",
            put(handlers::users::change_status_handler),
        )
        .route_layer(from_fn(middleware::require_identity));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
