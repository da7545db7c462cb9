//! Authentication endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use worklog_common::AppResult;
use worklog_core::{RegisterInput, UpdateProfileInput};
use worklog_db::entities::user;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public view of a user account.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub department: String,
    pub role: user::Role,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            department: user.department,
            role: user.role,
        }
    }
}

/// Register a new account. New accounts always start as employees.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.register(req).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Sign in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let authed = state.user_service.login(&req.email, &req.password).await?;

    Ok(ApiResponse::ok(LoginResponse {
        token: authed.token,
        user: authed.user.into(),
    }))
}

/// Logout response.
#[derive(Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Revoke the current token.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<LogoutResponse>> {
    state.user_service.logout(user).await?;
    Ok(ApiResponse::ok(LogoutResponse { ok: true }))
}

/// The authenticated caller's own account.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

/// Update the caller's own profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update_profile(user, req).await?;
    Ok(ApiResponse::ok(updated.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).patch(update_me))
}
