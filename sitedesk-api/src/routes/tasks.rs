/// Task board endpoints
///
/// Any authenticated user can create, edit, take, and complete tasks;
/// deleting and reassigning are admin-only. Every mutation writes one
/// activity row: `created` and `deleted` without a diff, everything else
/// with full before/after snapshots.
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List tasks (optional status/assignee filters)
/// - `GET    /v1/tasks/:id` - Task with its activity trail
/// - `POST   /v1/tasks` - Create task
/// - `PUT    /v1/tasks/:id` - Update task
/// - `DELETE /v1/tasks/:id` - Delete task (admin)
/// - `POST   /v1/tasks/:id/assign` - Reassign (admin)
/// - `POST   /v1/tasks/:id/take` - Claim: in_progress + assigned to caller
/// - `POST   /v1/tasks/:id/complete` - Mark completed

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use sitedesk_shared::{
    audit,
    auth::{authorization::require_admin, middleware::AuthContext},
    models::{
        activity_log::{ActivityAction, ActivityFilter, ActivityLog, ActivityView, ChangeSet, EntityKind},
        task::{CreateTask, Task, TaskFilter, TaskPatch, TaskStatus, TaskView},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Task list query parameters
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Filter by status
    pub status: Option<TaskStatus>,

    /// Filter by assignee: "me" or a user id
    pub assigned_to: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    /// Optional initial assignee
    pub assigned_to: Option<Uuid>,
}

/// Update task request
///
/// Absent fields are left unchanged; an explicit null clears a nullable
/// field (hence the nested Options).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

/// Assign task request
#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    /// Target user
    pub assigned_to: Uuid,
}

/// Single-task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: TaskView,
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskView>,
}

/// Task with its audit trail
#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    pub task: TaskView,
    pub activity: Vec<ActivityView>,
}

/// Deletion response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Resolves the `assigned_to` query value ("me" or a user id)
fn parse_assignee(raw: &str, auth: &AuthContext) -> Result<Uuid, ApiError> {
    if raw == "me" {
        return Ok(auth.user_id);
    }
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::BadRequest("assigned_to must be \"me\" or a user id".to_string()))
}

/// Fetches the resolved view of a task that is known to exist
async fn task_view(state: &AppState, id: Uuid) -> ApiResult<TaskView> {
    Task::find_view_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// List tasks
///
/// # Endpoint
///
/// ```text
/// GET /v1/tasks?status=open&assigned_to=me
/// Authorization: Bearer <token>
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let assigned_to = match query.assigned_to {
        Some(ref raw) => Some(parse_assignee(raw, &auth)?),
        None => None,
    };

    let tasks = Task::list(
        &state.db,
        TaskFilter {
            status: query.status,
            assigned_to,
        },
    )
    .await?;

    Ok(Json(ListTasksResponse { tasks }))
}

/// Get a single task with its activity trail
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist
pub async fn get_task(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetailResponse>> {
    let task = task_view(&state, id).await?;

    let activity = ActivityLog::list(
        &state.db,
        ActivityFilter {
            entity_type: Some(EntityKind::Task),
            entity_id: Some(id),
        },
    )
    .await?;

    Ok(Json(TaskDetailResponse { task, activity }))
}

/// Create task
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
            created_by: auth.user_id,
        },
    )
    .await?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Task,
        task.id,
        ActivityAction::Created,
        None,
    )
    .await;

    let task = task_view(&state, task.id).await?;

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// Update task
///
/// A status write carries its side effects: entering `completed` stamps
/// the caller and the current time, leaving it clears both.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Task does not exist
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;

    let old = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let patch = TaskPatch {
        title: req.title,
        description: req.description,
        status: req.status,
        due_date: req.due_date,
        assigned_to: req.assigned_to,
    };

    let updated = Task::update(&state.db, id, patch, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Task,
        id,
        ActivityAction::Updated,
        Some(ChangeSet::new(
            audit::snapshot(&old),
            audit::snapshot(&updated),
        )),
    )
    .await;

    let task = task_view(&state, id).await?;

    Ok(Json(TaskResponse { task }))
}

/// Delete task (admin only)
///
/// The activity row is written before the row is removed.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Task does not exist
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse>> {
    require_admin(&auth)?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Task,
        task.id,
        ActivityAction::Deleted,
        None,
    )
    .await;

    Task::delete(&state.db, id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Reassign task (admin only)
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: Task or target user does not exist
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    require_admin(&auth)?;

    let old = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    User::find_by_id(&state.db, req.assigned_to)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let updated = Task::assign(&state.db, id, req.assigned_to)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Task,
        id,
        ActivityAction::Assigned,
        Some(ChangeSet::new(
            audit::snapshot(&old),
            audit::snapshot(&updated),
        )),
    )
    .await;

    let task = task_view(&state, id).await?;

    Ok(Json(TaskResponse { task }))
}

/// Take task: status = in_progress, assigned to the caller
///
/// Succeeds regardless of the prior status, including completed.
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist
pub async fn take_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let old = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let updated = Task::take(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Task,
        id,
        ActivityAction::StatusChanged,
        Some(ChangeSet::new(
            audit::snapshot(&old),
            audit::snapshot(&updated),
        )),
    )
    .await;

    let task = task_view(&state, id).await?;

    Ok(Json(TaskResponse { task }))
}

/// Complete task: status = completed, stamped with caller and time
///
/// # Errors
///
/// - `404 Not Found`: Task does not exist
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let old = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let updated = Task::complete(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    audit::record(
        &state.db,
        auth.user_id,
        EntityKind::Task,
        id,
        ActivityAction::StatusChanged,
        Some(ChangeSet::new(
            audit::snapshot(&old),
            audit::snapshot(&updated),
        )),
    )
    .await;

    let task = task_view(&state, id).await?;

    Ok(Json(TaskResponse { task }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitedesk_shared::models::user::Role;

    fn context() -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "crew1".to_string(),
            role: Role::Helper,
        }
    }

    #[test]
    fn test_parse_assignee_me() {
        let auth = context();
        assert_eq!(parse_assignee("me", &auth).unwrap(), auth.user_id);
    }

    #[test]
    fn test_parse_assignee_uuid() {
        let auth = context();
        let other = Uuid::new_v4();
        assert_eq!(parse_assignee(&other.to_string(), &auth).unwrap(), other);
    }

    #[test]
    fn test_parse_assignee_garbage() {
        let auth = context();
        assert!(matches!(
            parse_assignee("everyone", &auth),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_update_request_distinguishes_absent_and_null() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert!(absent.assigned_to.is_none());

        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        assert_eq!(cleared.assigned_to, Some(None));
    }
}
