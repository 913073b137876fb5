use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::middleware::{admin_middleware, auth_middleware};
use crate::services::AppState;

pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/teachers", get(handlers::admin_list_teachers))
        .route("/admin/teachers/stats", get(handlers::admin_teacher_stats))
        .route(
            "/admin/teachers/:account_id/approve",
            post(handlers::approve_teacher),
        )
        .route(
            "/admin/teachers/:account_id/reject",
            post(handlers::reject_teacher),
        )
        .route_layer(from_fn_with_state(state.clone(), admin_middleware));

    let authenticated_routes = Router::new()
        .route("/profile/role", post(handlers::select_role))
        .route("/teachers/register", post(handlers::register_teacher))
        .route("/teachers/me", get(handlers::my_teacher_record))
        .route("/session-requests", post(handlers::create_session_request))
        .route(
            "/session-requests/incoming",
            get(handlers::incoming_session_requests),
        )
        .route("/session-requests/mine", get(handlers::my_session_requests))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Liveness and health
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Authentication
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/admin-login", post(handlers::admin_login))
        // Public browsing
        .route("/teachers", get(handlers::browse_teachers))
        .route("/catalog/categories", get(handlers::list_categories))
        .route("/catalog/fields", get(handlers::list_fields))
        .merge(authenticated_routes)
        .merge(admin_routes)
        .fallback(handlers::not_found)
        .with_state(state)
}
