use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};

use hyperskill_auth::Claims;
use hyperskill_common::ApiResponse;
use hyperskill_database::{AdminRepository, Store};

use crate::services::AppState;

type MiddlewareError = (StatusCode, Json<ApiResponse<()>>);

// Authentication middleware: validates the bearer token and stashes the
// claims in request extensions for handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, MiddlewareError> {
    let claims = authenticate(&state, &headers)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// Admin middleware: authentication plus allow-list membership. Runs before
// any admin query is issued and fails closed on every path.
pub async fn admin_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, MiddlewareError> {
    let claims = authenticate(&state, &headers)?;

    let account_id = claims.account_id().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid or expired token".to_string())),
        )
    })?;

    let is_admin = state
        .store
        .admins()
        .is_admin(account_id)
        .await
        .map_err(|err| {
            tracing::error!("Admin membership check failed: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error".to_string())),
            )
        })?;

    if !is_admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Not authorized as admin".to_string())),
        ));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Claims, MiddlewareError> {
    let token = headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error(
                "Missing or invalid authorization header".to_string(),
            )),
        ));
    };

    state.jwt_service.validate_token(token).map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid or expired token".to_string())),
        )
    })
}
