//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use fabula_common::AppResult;
use fabula_core::{AuthSession, LoginInput, RegisterInput};
use serde::Serialize;

use crate::{extractors::AuthMember, middleware::AppState, response::ApiResponse};

/// Register a new member account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.member_service.register(input).await?;

    Ok(ApiResponse::ok(session))
}

/// Log in to an existing account.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<AuthSession>> {
    let session = state.member_service.login(input).await?;

    Ok(ApiResponse::ok(session))
}

/// Logout response.
#[derive(Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Log out by rotating the token, which invalidates the current one.
async fn logout(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<LogoutResponse>> {
    state.member_service.regenerate_token(&member.id).await?;

    Ok(ApiResponse::ok(LogoutResponse { ok: true }))
}

/// Regenerate token response.
#[derive(Serialize)]
pub struct RegenerateTokenResponse {
    pub token: String,
}

/// Regenerate the authentication token.
async fn regenerate_token(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RegenerateTokenResponse>> {
    let token = state.member_service.regenerate_token(&member.id).await?;

    Ok(ApiResponse::ok(RegenerateTokenResponse { token }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/regenerate-token", post(regenerate_token))
}
