/// Activity log model
///
/// The audit trail: one append-only row per mutating action, recording who
/// did what to which entity. Rows are never updated or deleted through the
/// application; the writing contract (best-effort, failures swallowed)
/// lives in [`crate::audit`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE entity_kind AS ENUM ('user', 'task', 'material');
/// CREATE TYPE activity_action AS ENUM (
///     'created', 'updated', 'deleted', 'status_changed', 'assigned'
/// );
///
/// CREATE TABLE activity_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     entity_type entity_kind NOT NULL,
///     entity_id UUID NOT NULL,
///     action activity_action NOT NULL,
///     changes JSONB,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRef;

/// Kind of entity an activity row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Task,
    Material,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Task => "task",
            EntityKind::Material => "material",
        }
    }
}

/// Action recorded by an activity row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Assigned,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
            ActivityAction::Deleted => "deleted",
            ActivityAction::StatusChanged => "status_changed",
            ActivityAction::Assigned => "assigned",
        }
    }
}

/// Before/after snapshot pair carried by update-like actions
///
/// `created` and `deleted` rows carry no diff; everything else records the
/// full entity state on both sides of the mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub old: JsonValue,
    pub new: JsonValue,
}

impl ChangeSet {
    pub fn new(old: JsonValue, new: JsonValue) -> Self {
        Self { old, new }
    }
}

/// Activity log row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: Uuid,

    /// Actor who performed the action
    pub user_id: Uuid,

    pub entity_type: EntityKind,

    pub entity_id: Uuid,

    pub action: ActivityAction,

    /// `{old, new}` snapshot pair, when the action carries one
    pub changes: Option<JsonValue>,

    pub created_at: DateTime<Utc>,
}

/// Activity row with the actor resolved to a public identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityView {
    pub id: Uuid,
    pub user: UserRef,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub action: ActivityAction,
    pub changes: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityViewRow {
    id: Uuid,
    entity_type: EntityKind,
    entity_id: Uuid,
    action: ActivityAction,
    changes: Option<JsonValue>,
    created_at: DateTime<Utc>,
    actor_id: Uuid,
    actor_username: String,
    actor_profile_image: Option<String>,
}

impl From<ActivityViewRow> for ActivityView {
    fn from(row: ActivityViewRow) -> Self {
        Self {
            id: row.id,
            user: UserRef {
                id: row.actor_id,
                username: row.actor_username,
                profile_image: row.actor_profile_image,
            },
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            action: row.action,
            changes: row.changes,
            created_at: row.created_at,
        }
    }
}

/// Input for appending an activity row
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub action: ActivityAction,
    pub changes: Option<ChangeSet>,
}

/// Filter for listing activity rows
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<Uuid>,
}

/// Maximum number of rows returned by a single activity listing
pub const ACTIVITY_LIST_LIMIT: i64 = 100;

impl ActivityLog {
    /// Appends an activity row
    ///
    /// Callers should not use this directly from request handlers; go
    /// through [`crate::audit::record`], which applies the best-effort
    /// contract.
    pub async fn create(pool: &PgPool, data: NewActivity) -> Result<Self, sqlx::Error> {
        let changes = match data.changes {
            Some(ref c) => Some(
                serde_json::to_value(c)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            ),
            None => None,
        };

        let log = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (user_id, entity_type, entity_id, action, changes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, entity_type, entity_id, action, changes, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.entity_type)
        .bind(data.entity_id)
        .bind(data.action)
        .bind(changes)
        .fetch_one(pool)
        .await?;

        Ok(log)
    }

    /// Lists activity rows newest-first, up to [`ACTIVITY_LIST_LIMIT`]
    ///
    /// Each row is returned with the acting user's public identity resolved.
    pub async fn list(
        pool: &PgPool,
        filter: ActivityFilter,
    ) -> Result<Vec<ActivityView>, sqlx::Error> {
        let mut query = String::from(
            r#"
            SELECT a.id, a.entity_type, a.entity_id, a.action, a.changes,
                   a.created_at,
                   actor.id AS actor_id,
                   actor.username AS actor_username,
                   actor.profile_image AS actor_profile_image
            FROM activity_logs a
            JOIN users actor ON actor.id = a.user_id
            "#,
        );

        let mut clauses: Vec<String> = Vec::new();
        let mut bind_count = 0;

        if filter.entity_type.is_some() {
            bind_count += 1;
            clauses.push(format!("a.entity_type = ${}", bind_count));
        }
        if filter.entity_id.is_some() {
            bind_count += 1;
            clauses.push(format!("a.entity_id = ${}", bind_count));
        }

        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(&format!(
            " ORDER BY a.created_at DESC LIMIT {}",
            ACTIVITY_LIST_LIMIT
        ));

        let mut q = sqlx::query_as::<_, ActivityViewRow>(&query);

        if let Some(entity_type) = filter.entity_type {
            q = q.bind(entity_type);
        }
        if let Some(entity_id) = filter.entity_id {
            q = q.bind(entity_id);
        }

        let rows = q.fetch_all(pool).await?;

        Ok(rows.into_iter().map(ActivityView::from).collect())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_kind_as_str() {
        assert_eq!(EntityKind::User.as_str(), "user");
        assert_eq!(EntityKind::Task.as_str(), "task");
        assert_eq!(EntityKind::Material.as_str(), "material");
    }

    #[test]
    fn test_activity_action_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ActivityAction::StatusChanged).unwrap(),
            "\"status_changed\""
        );
        assert_eq!(
            serde_json::from_str::<ActivityAction>("\"assigned\"").unwrap(),
            ActivityAction::Assigned
        );
    }

    #[test]
    fn test_change_set_serialization() {
        let changes = ChangeSet::new(
            json!({"status": "open"}),
            json!({"status": "in_progress"}),
        );

        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value["old"]["status"], "open");
        assert_eq!(value["new"]["status"], "in_progress");
    }

    #[test]
    fn test_change_set_snapshots_differ() {
        let old = json!({"title": "Install wiring", "status": "open"});
        let new = json!({"title": "Install wiring", "status": "completed"});
        let changes = ChangeSet::new(old.clone(), new.clone());

        assert_ne!(changes.old, changes.new);
    }
}
