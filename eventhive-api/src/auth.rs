use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use eventhive_core::Registration;
use eventhive_shared::User;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    middleware::auth::{issue_token, SessionClaims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/signup", post(signup))
}

fn session_for(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let claims = SessionClaims::for_user(&user, &state.auth);
    let token = issue_token(&claims, &state.auth)
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;
    Ok(AuthResponse { token, user })
}

/// POST /v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .identity
        .resolve(&req.email)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid email or user does not exist.".to_string()))?;

    tracing::info!("User {} signed in", user.id);
    Ok(Json(session_for(&state, user)?))
}

/// POST /v1/auth/signup
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<Registration>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = state.identity.register(req).await?;
    Ok((StatusCode::CREATED, Json(session_for(&state, user)?)))
}
