/// Task model and database operations
///
/// Tasks move through a kanban-style flow. Transitions are permissive:
/// any status can be written over any other. The one hard invariant is
/// that `completed_at` and `completed_by` are set exactly while a task is
/// in `completed`: every write that enters that status stamps them and
/// every write that leaves it clears them.
///
/// # State machine
///
/// ```text
/// open ⇄ in_progress ⇄ completed
///   ⇽-----------------⇾   (no transition is rejected)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('open', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'open',
///     due_date DATE,
///     completed_at TIMESTAMPTZ,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     completed_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRef;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet picked up by anyone
    Open,

    /// A crew member is working on it
    InProgress,

    /// Done; completed_by/completed_at record who and when
    Completed,
}

impl TaskStatus {
    /// Converts status to string for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Task model representing a work item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title (1-200 characters)
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Optional due date (calendar date, no time component)
    pub due_date: Option<NaiveDate>,

    /// When the task was completed (set iff status = completed)
    pub completed_at: Option<DateTime<Utc>>,

    /// User who created the task
    pub created_by: Uuid,

    /// User currently assigned (None = unassigned)
    pub assigned_to: Option<Uuid>,

    /// User who completed the task (set iff status = completed)
    pub completed_by: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Task projection with user references resolved to public identities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: UserRef,
    pub assigned_to: Option<UserRef>,
    pub completed_by: Option<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat join row backing [`TaskView`]
///
/// Three LEFT JOINs against users produce one wide row; the conversion
/// below folds the aliased columns into nested references.
#[derive(Debug, sqlx::FromRow)]
struct TaskViewRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: Uuid,
    creator_username: String,
    creator_profile_image: Option<String>,
    assignee_id: Option<Uuid>,
    assignee_username: Option<String>,
    assignee_profile_image: Option<String>,
    completer_id: Option<Uuid>,
    completer_username: Option<String>,
    completer_profile_image: Option<String>,
}

impl From<TaskViewRow> for TaskView {
    fn from(row: TaskViewRow) -> Self {
        let assigned_to = match (row.assignee_id, row.assignee_username) {
            (Some(id), Some(username)) => Some(UserRef {
                id,
                username,
                profile_image: row.assignee_profile_image,
            }),
            _ => None,
        };
        let completed_by = match (row.completer_id, row.completer_username) {
            (Some(id), Some(username)) => Some(UserRef {
                id,
                username,
                profile_image: row.completer_profile_image,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            due_date: row.due_date,
            completed_at: row.completed_at,
            created_by: UserRef {
                id: row.creator_id,
                username: row.creator_username,
                profile_image: row.creator_profile_image,
            },
            assigned_to,
            completed_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const VIEW_COLUMNS: &str = r#"
    t.id, t.title, t.description, t.status, t.due_date, t.completed_at,
    t.created_at, t.updated_at,
    creator.id AS creator_id,
    creator.username AS creator_username,
    creator.profile_image AS creator_profile_image,
    assignee.id AS assignee_id,
    assignee.username AS assignee_username,
    assignee.profile_image AS assignee_profile_image,
    completer.id AS completer_id,
    completer.username AS completer_username,
    completer.profile_image AS completer_profile_image
"#;

const VIEW_JOINS: &str = r#"
    FROM tasks t
    JOIN users creator ON creator.id = t.created_by
    LEFT JOIN users assignee ON assignee.id = t.assigned_to
    LEFT JOIN users completer ON completer.id = t.completed_by
"#;

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    /// Optional initial assignee
    pub assigned_to: Option<Uuid>,

    /// User creating the task
    pub created_by: Uuid,
}

/// Explicit partial update for a task
///
/// Nested Options distinguish "leave unchanged" (outer None) from "set to
/// NULL" (Some(None)).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,

    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    pub due_date: Option<Option<NaiveDate>>,

    pub assigned_to: Option<Option<Uuid>>,
}

impl TaskPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }
}

/// Filter for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,

    pub assigned_to: Option<Uuid>,
}

impl Task {
    /// Creates a new task in open status
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, due_date, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, status, due_date, completed_at,
                      created_by, assigned_to, completed_by, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, due_date, completed_at,
                   created_by, assigned_to, completed_by, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID with user references resolved
    pub async fn find_view_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskView>, sqlx::Error> {
        let query = format!("SELECT {} {} WHERE t.id = $1", VIEW_COLUMNS, VIEW_JOINS);

        let row = sqlx::query_as::<_, TaskViewRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TaskView::from))
    }

    /// Lists tasks newest-first with optional status/assignee filters
    pub async fn list(pool: &PgPool, filter: TaskFilter) -> Result<Vec<TaskView>, sqlx::Error> {
        let mut query = format!("SELECT {} {}", VIEW_COLUMNS, VIEW_JOINS);
        let mut clauses: Vec<String> = Vec::new();
        let mut bind_count = 0;

        if filter.status.is_some() {
            bind_count += 1;
            clauses.push(format!("t.status = ${}", bind_count));
        }
        if filter.assigned_to.is_some() {
            bind_count += 1;
            clauses.push(format!("t.assigned_to = ${}", bind_count));
        }

        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY t.created_at DESC");

        let mut q = sqlx::query_as::<_, TaskViewRow>(&query);

        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(assigned_to) = filter.assigned_to {
            q = q.bind(assigned_to);
        }

        let rows = q.fetch_all(pool).await?;

        Ok(rows.into_iter().map(TaskView::from).collect())
    }

    /// Applies an explicit partial update
    ///
    /// Status writes carry their side effects: entering `completed` stamps
    /// `completed_by` with the actor and `completed_at` with the current
    /// time; leaving it clears both so the completion invariant holds.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: TaskPatch,
        actor: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if let Some(status) = patch.status {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
            if status.is_completed() {
                bind_count += 1;
                query.push_str(&format!(
                    ", completed_by = ${}, completed_at = NOW()",
                    bind_count
                ));
            } else {
                query.push_str(", completed_by = NULL, completed_at = NULL");
            }
        }
        if patch.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if patch.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, due_date, \
             completed_at, created_by, assigned_to, completed_by, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = patch.title {
            q = q.bind(title);
        }
        if let Some(description) = patch.description {
            q = q.bind(description);
        }
        if let Some(status) = patch.status {
            q = q.bind(status);
            if status.is_completed() {
                q = q.bind(actor);
            }
        }
        if let Some(due_date) = patch.due_date {
            q = q.bind(due_date);
        }
        if let Some(assigned_to) = patch.assigned_to {
            q = q.bind(assigned_to);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Takes a task: status = in_progress, assigned to the actor
    ///
    /// Succeeds regardless of the prior status. If the task was completed,
    /// the completion fields are cleared.
    pub async fn take(pool: &PgPool, id: Uuid, actor: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'in_progress',
                assigned_to = $2,
                completed_by = NULL,
                completed_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, due_date, completed_at,
                      created_by, assigned_to, completed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Completes a task: status = completed, stamped with actor and time
    pub async fn complete(
        pool: &PgPool,
        id: Uuid,
        actor: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'completed',
                completed_by = $2,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, due_date, completed_at,
                      created_by, assigned_to, completed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Reassigns a task to another user
    ///
    /// The caller is responsible for verifying the target user exists.
    pub async fn assign(
        pool: &PgPool,
        id: Uuid,
        assigned_to: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET assigned_to = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, due_date, completed_at,
                      created_by, assigned_to, completed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(assigned_to)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Open.as_str(), "open");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_status_is_completed() {
        assert!(!TaskStatus::Open.is_completed());
        assert!(!TaskStatus::InProgress.is_completed());
        assert!(TaskStatus::Completed.is_completed());
    }

    #[test]
    fn test_task_status_serde() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"open\"").unwrap(),
            TaskStatus::Open
        );
    }

    #[test]
    fn test_task_patch_default_is_empty() {
        let patch = TaskPatch::default();
        assert!(patch.is_empty());

        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_task_patch_clear_fields() {
        // Some(None) clears a nullable column, outer None leaves it alone.
        let patch = TaskPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.assigned_to, Some(None));
        assert!(patch.due_date.is_none());
    }

    #[test]
    fn test_task_view_row_conversion() {
        let creator_id = Uuid::new_v4();
        let assignee_id = Uuid::new_v4();
        let now = Utc::now();

        let row = TaskViewRow {
            id: Uuid::new_v4(),
            title: "Install wiring".to_string(),
            description: None,
            status: TaskStatus::InProgress,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            creator_id,
            creator_username: "foreman".to_string(),
            creator_profile_image: None,
            assignee_id: Some(assignee_id),
            assignee_username: Some("crew1".to_string()),
            assignee_profile_image: None,
            completer_id: None,
            completer_username: None,
            completer_profile_image: None,
        };

        let view = TaskView::from(row);
        assert_eq!(view.created_by.id, creator_id);
        assert_eq!(view.created_by.username, "foreman");
        assert_eq!(view.assigned_to.as_ref().unwrap().id, assignee_id);
        assert!(view.completed_by.is_none());
    }
}
