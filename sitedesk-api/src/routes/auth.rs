/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Login with username or email, get a token
/// - `POST /v1/auth/register` - Create an account (admin only; handled by
///   [`crate::routes::users::create_user`], wired in the router)
/// - `GET /v1/auth/me` - Current authenticated user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use sitedesk_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::User,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub username_or_email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token, valid for 7 days
    pub token: String,

    /// The authenticated user (public fields only)
    pub user: User,
}

/// Current-user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

/// Login endpoint
///
/// Authenticates with username or email plus password and returns a
/// 7-day bearer token.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "username_or_email": "foreman",
///   "password": "secret"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown user or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_username_or_email(&state.db, &req.username_or_email)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid credentials".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthenticated("Invalid credentials".to_string()));
    }

    let claims = jwt::Claims::new(user.id, user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse { token, user }))
}

/// Current-user endpoint
///
/// # Endpoint
///
/// ```text
/// GET /v1/auth/me
/// Authorization: Bearer <token>
/// ```
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Unknown user".to_string()))?;

    Ok(Json(MeResponse { user }))
}
