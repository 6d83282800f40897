/// User management endpoints
///
/// Listing is open to any authenticated user; creating, updating, and
/// deleting accounts is admin-only. Every mutation writes an activity row.
///
/// # Endpoints
///
/// - `GET    /v1/users` - List users
/// - `POST   /v1/users` - Create user (admin)
/// - `PUT    /v1/users/:id` - Update user (admin)
/// - `DELETE /v1/users/:id` - Delete user (admin, not yourself)
/// - `POST   /v1/users/profile-image` - Upload own avatar

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    storage::AvatarStorage,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use sitedesk_shared::{
    audit,
    auth::{authorization::require_admin, middleware::AuthContext, password},
    models::{
        activity_log::{ActivityAction, ChangeSet, EntityKind},
        user::{CreateUser, Role, User, UserPatch},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Role,
}

/// Update user request
///
/// All fields optional; a password, when present, is re-hashed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    pub role: Option<Role>,
}

/// Single-user response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// User list response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<User>,
}

/// Deletion response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Avatar upload response
#[derive(Debug, Serialize)]
pub struct ProfileImageResponse {
    pub profile_image: String,
    pub user: User,
}

/// List users
///
/// # Endpoint
///
/// ```text
/// GET /v1/users
/// Authorization: Bearer <token>
/// ```
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<ListUsersResponse>> {
    let users = User::list(&state.db).await?;

    Ok(Json(ListUsersResponse { users }))
}

/// Create user (admin only)
///
/// Also serves `POST /v1/auth/register`.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or username/email taken
/// - `403 Forbidden`: Caller is not an admin
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    require_admin(&auth)?;
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::User,
        user.id,
        ActivityAction::Created,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Update user (admin only)
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or username/email taken
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User does not exist
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&auth)?;
    req.validate()?;

    let old = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let password_hash = match req.password {
        Some(ref plaintext) => Some(password::hash_password(plaintext)?),
        None => None,
    };

    let patch = UserPatch {
        username: req.username,
        email: req.email,
        password_hash,
        role: req.role,
        profile_image: None,
    };

    let user = User::update(&state.db, id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::User,
        user.id,
        ActivityAction::Updated,
        Some(ChangeSet::new(audit::snapshot(&old), audit::snapshot(&user))),
    )
    .await;

    Ok(Json(UserResponse { user }))
}

/// Delete user (admin only)
///
/// Self-deletion is rejected. The activity row is written before the row
/// is removed.
///
/// # Errors
///
/// - `400 Bad Request`: Attempted self-deletion
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User does not exist
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    require_admin(&auth)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(ref filename) = user.profile_image {
        AvatarStorage::new(&state.config.uploads.dir)
            .delete(filename)
            .await;
    }

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::User,
        user.id,
        ActivityAction::Deleted,
        None,
    )
    .await;

    User::delete(&state.db, id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Upload own avatar
///
/// Accepts a multipart form with one image field, stores it on disk, and
/// replaces (and removes) any previous avatar.
///
/// # Endpoint
///
/// ```text
/// POST /v1/users/profile-image
/// Authorization: Bearer <token>
/// Content-Type: multipart/form-data
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: No file, not an image, or over the 2 MiB limit
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProfileImageResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No image uploaded".to_string()))?;

    let old = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Unknown user".to_string()))?;

    let storage = AvatarStorage::new(&state.config.uploads.dir);
    let stored_name = storage.save(auth.user_id, &filename, &bytes).await?;

    if let Some(ref previous) = old.profile_image {
        storage.delete(previous).await;
    }

    let user = User::update(
        &state.db,
        auth.user_id,
        UserPatch {
            profile_image: Some(Some(stored_name.clone())),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::Unauthenticated("Unknown user".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::User,
        user.id,
        ActivityAction::Updated,
        Some(ChangeSet::new(audit::snapshot(&old), audit::snapshot(&user))),
    )
    .await;

    Ok(Json(ProfileImageResponse {
        profile_image: stored_name,
        user,
    }))
}
