/// Authentication endpoints
///
/// - `POST /auth/register` - Register a new user and get tokens
/// - `POST /auth/login` - Login and get tokens
/// - `POST /auth/refresh` - Exchange a refresh token for an access token

use crate::{app::AppState, error::ApiResult};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use teamboard_shared::ledger::users::{self, LoginUser, RefreshedToken, RegisterUser, Session};

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecurePass123",
///   "name": "Jane Doe"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the session:
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_in": 86400,
///   "user": { "id": "uuid", "email": "user@example.com", "name": "Jane Doe", ... }
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let Json(req) = body?;
    let session = users::register(state.store(), state.jwt_secret(), req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginUser>, JsonRejection>,
) -> ApiResult<Json<Session>> {
    let Json(req) = body?;
    let session = users::login(state.store(), state.jwt_secret(), req).await?;
    Ok(Json(session))
}

/// Token refresh endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or the account
///   was deleted
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshedToken>> {
    let Json(req) = body?;
    let token = users::refresh(state.store(), state.jwt_secret(), &req.refresh_token).await?;
    Ok(Json(token))
}
