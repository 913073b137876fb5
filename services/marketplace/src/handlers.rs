use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use hyperskill_auth::Claims;
use hyperskill_common::{ApiResponse, AppError};
use hyperskill_database::{LearningCategory, LearningField, VerificationStats};

use crate::models::*;
use crate::services::{
    AccountService, AdminService, AppState, BookingService, CatalogService, TeacherService,
};

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn error_response(err: AppError) -> HandlerError {
    match err {
        AppError::Validation(msg) => (StatusCode::BAD_REQUEST, Json(ApiResponse::error(msg))),
        AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, Json(ApiResponse::error(msg))),
        AppError::Authorization(msg) => (StatusCode::FORBIDDEN, Json(ApiResponse::error(msg))),
        AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(ApiResponse::error(msg))),
        AppError::Conflict(msg) => (StatusCode::CONFLICT, Json(ApiResponse::error(msg))),
        err => {
            tracing::error!("Request failed: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error".to_string())),
            )
        }
    }
}

fn validation_error(errors: validator::ValidationErrors) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(format!("Validation error: {:?}", errors))),
    )
}

// Liveness
pub async fn root() -> &'static str {
    "HyperSkill backend running"
}

// Health check
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("Marketplace service is healthy".to_string()))
}

pub async fn not_found() -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found".to_string())),
    )
}

// Account registration
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    request.validate().map_err(validation_error)?;

    let service = AccountService::new(&state);
    service
        .register(request)
        .await
        .map(|message| Json(ApiResponse::success(message)))
        .map_err(error_response)
}

// Login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, HandlerError> {
    request.validate().map_err(validation_error)?;

    let service = AccountService::new(&state);
    service
        .login(request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

// Admin login
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, HandlerError> {
    request.validate().map_err(validation_error)?;

    let service = AccountService::new(&state);
    service
        .admin_login(request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

// Role selection
pub async fn select_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RoleSelectRequest>,
) -> Result<Json<ApiResponse<String>>, HandlerError> {
    let account_id = claims.account_id().map_err(error_response)?;

    let service = AccountService::new(&state);
    service
        .select_role(account_id, request.role)
        .await
        .map(|message| Json(ApiResponse::success(message)))
        .map_err(error_response)
}

// Teacher registration
pub async fn register_teacher(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<TeacherRegisterRequest>,
) -> Result<Json<ApiResponse<TeacherResponse>>, HandlerError> {
    request.validate().map_err(validation_error)?;

    let service = TeacherService::new(&state);
    service
        .register_teacher(&claims, request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

// Teacher self-view
pub async fn my_teacher_record(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<TeacherResponse>>, HandlerError> {
    let service = TeacherService::new(&state);
    service
        .own_record(&claims)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

// Public browse of verified teachers in a field
pub async fn browse_teachers(
    State(state): State<AppState>,
    Query(params): Query<BrowseTeachersParams>,
) -> Result<Json<ApiResponse<Vec<TeacherResponse>>>, HandlerError> {
    let service = TeacherService::new(&state);
    service
        .browse_by_field(params.field.as_deref())
        .await
        .map(|teachers| Json(ApiResponse::success(teachers)))
        .map_err(error_response)
}

// Catalog
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LearningCategory>>>, HandlerError> {
    let service = CatalogService::new(&state);
    service
        .categories()
        .await
        .map(|categories| Json(ApiResponse::success(categories)))
        .map_err(error_response)
}

pub async fn list_fields(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LearningField>>>, HandlerError> {
    let service = CatalogService::new(&state);
    service
        .fields()
        .await
        .map(|fields| Json(ApiResponse::success(fields)))
        .map_err(error_response)
}

// Session booking
pub async fn create_session_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<BookSessionRequest>,
) -> Result<Json<ApiResponse<SessionRequestResponse>>, HandlerError> {
    request.validate().map_err(validation_error)?;

    let service = BookingService::new(&state);
    service
        .create_request(&claims, request)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

pub async fn incoming_session_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<SessionRequestResponse>>>, HandlerError> {
    let service = BookingService::new(&state);
    service
        .incoming(&claims)
        .await
        .map(|requests| Json(ApiResponse::success(requests)))
        .map_err(error_response)
}

pub async fn my_session_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<SessionRequestResponse>>>, HandlerError> {
    let service = BookingService::new(&state);
    service
        .mine(&claims)
        .await
        .map(|requests| Json(ApiResponse::success(requests)))
        .map_err(error_response)
}

// Admin: paginated, filtered, sorted, searched teacher listing
pub async fn admin_list_teachers(
    State(state): State<AppState>,
    Query(params): Query<AdminTeachersParams>,
) -> Result<Json<ApiResponse<TeacherPageResponse>>, HandlerError> {
    let service = AdminService::new(&state);
    service
        .list_teachers(params.into_query())
        .await
        .map(|page| Json(ApiResponse::success(page)))
        .map_err(error_response)
}

// Admin: global verification counts
pub async fn admin_teacher_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VerificationStats>>, HandlerError> {
    let service = AdminService::new(&state);
    service
        .stats()
        .await
        .map(|stats| Json(ApiResponse::success(stats)))
        .map_err(error_response)
}

// Admin: verification state transitions
pub async fn approve_teacher(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TeacherResponse>>, HandlerError> {
    let service = AdminService::new(&state);
    service
        .approve(account_id)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}

pub async fn reject_teacher(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TeacherResponse>>, HandlerError> {
    let service = AdminService::new(&state);
    service
        .reject(account_id)
        .await
        .map(|response| Json(ApiResponse::success(response)))
        .map_err(error_response)
}
