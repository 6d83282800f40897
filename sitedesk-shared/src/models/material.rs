/// Material model and database operations
///
/// Materials track procurement: a crew member records what the site needs,
/// the status advances from `needed` through `ordered` to `arrived`. Status
/// writes are plain field assignments with no transition guards.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE material_status AS ENUM ('needed', 'ordered', 'arrived');
///
/// CREATE TABLE materials (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     quantity DOUBLE PRECISION NOT NULL DEFAULT 1,
///     unit VARCHAR(50) NOT NULL DEFAULT 'piece',
///     notes TEXT,
///     status material_status NOT NULL DEFAULT 'needed',
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRef;

/// Material procurement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "material_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    /// Needed on site, not yet ordered
    Needed,

    /// Ordered from the supplier
    Ordered,

    /// Delivered to the site
    Arrived,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::Needed => "needed",
            MaterialStatus::Ordered => "ordered",
            MaterialStatus::Arrived => "arrived",
        }
    }
}

/// Material model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Material {
    pub id: Uuid,

    /// Material name (1-200 characters)
    pub name: String,

    /// Quantity in `unit` units, non-negative
    pub quantity: f64,

    /// Unit of measure (free text, defaults to "piece")
    pub unit: String,

    pub notes: Option<String>,

    pub status: MaterialStatus,

    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Material projection with the creator resolved to a public identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialView {
    pub id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
    pub status: MaterialStatus,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct MaterialViewRow {
    id: Uuid,
    name: String,
    quantity: f64,
    unit: String,
    notes: Option<String>,
    status: MaterialStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_id: Uuid,
    creator_username: String,
    creator_profile_image: Option<String>,
}

impl From<MaterialViewRow> for MaterialView {
    fn from(row: MaterialViewRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            quantity: row.quantity,
            unit: row.unit,
            notes: row.notes,
            status: row.status,
            created_by: UserRef {
                id: row.creator_id,
                username: row.creator_username,
                profile_image: row.creator_profile_image,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const VIEW_QUERY: &str = r#"
    SELECT m.id, m.name, m.quantity, m.unit, m.notes, m.status,
           m.created_at, m.updated_at,
           creator.id AS creator_id,
           creator.username AS creator_username,
           creator.profile_image AS creator_profile_image
    FROM materials m
    JOIN users creator ON creator.id = m.created_by
"#;

/// Input for creating a new material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMaterial {
    pub name: String,

    pub quantity: f64,

    /// Unit of measure; None falls back to the schema default "piece"
    pub unit: Option<String>,

    pub notes: Option<String>,

    pub created_by: Uuid,
}

/// Explicit partial update for a material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialPatch {
    pub name: Option<String>,

    pub quantity: Option<f64>,

    pub unit: Option<String>,

    pub notes: Option<Option<String>>,

    pub status: Option<MaterialStatus>,
}

impl MaterialPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }
}

impl Material {
    /// Creates a new material in needed status
    pub async fn create(pool: &PgPool, data: CreateMaterial) -> Result<Self, sqlx::Error> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (name, quantity, unit, notes, created_by)
            VALUES ($1, $2, COALESCE($3, 'piece'), $4, $5)
            RETURNING id, name, quantity, unit, notes, status, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.quantity)
        .bind(data.unit)
        .bind(data.notes)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(material)
    }

    /// Finds a material by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, name, quantity, unit, notes, status, created_by,
                   created_at, updated_at
            FROM materials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(material)
    }

    /// Finds a material by ID with the creator resolved
    pub async fn find_view_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<MaterialView>, sqlx::Error> {
        let query = format!("{} WHERE m.id = $1", VIEW_QUERY);

        let row = sqlx::query_as::<_, MaterialViewRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(MaterialView::from))
    }

    /// Lists materials newest-first with an optional status filter
    pub async fn list(
        pool: &PgPool,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<MaterialView>, sqlx::Error> {
        let mut query = String::from(VIEW_QUERY);
        if status.is_some() {
            query.push_str(" WHERE m.status = $1");
        }
        query.push_str(" ORDER BY m.created_at DESC");

        let mut q = sqlx::query_as::<_, MaterialViewRow>(&query);
        if let Some(status) = status {
            q = q.bind(status);
        }

        let rows = q.fetch_all(pool).await?;

        Ok(rows.into_iter().map(MaterialView::from).collect())
    }

    /// Applies an explicit partial update
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: MaterialPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE materials SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if patch.quantity.is_some() {
            bind_count += 1;
            query.push_str(&format!(", quantity = ${}", bind_count));
        }
        if patch.unit.is_some() {
            bind_count += 1;
            query.push_str(&format!(", unit = ${}", bind_count));
        }
        if patch.notes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", notes = ${}", bind_count));
        }
        if patch.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, quantity, unit, notes, status, \
             created_by, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Material>(&query).bind(id);

        if let Some(name) = patch.name {
            q = q.bind(name);
        }
        if let Some(quantity) = patch.quantity {
            q = q.bind(quantity);
        }
        if let Some(unit) = patch.unit {
            q = q.bind(unit);
        }
        if let Some(notes) = patch.notes {
            q = q.bind(notes);
        }
        if let Some(status) = patch.status {
            q = q.bind(status);
        }

        let material = q.fetch_optional(pool).await?;

        Ok(material)
    }

    /// Deletes a material by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
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
    fn test_material_status_as_str() {
        assert_eq!(MaterialStatus::Needed.as_str(), "needed");
        assert_eq!(MaterialStatus::Ordered.as_str(), "ordered");
        assert_eq!(MaterialStatus::Arrived.as_str(), "arrived");
    }

    #[test]
    fn test_material_status_serde() {
        assert_eq!(
            serde_json::to_string(&MaterialStatus::Ordered).unwrap(),
            "\"ordered\""
        );
        assert_eq!(
            serde_json::from_str::<MaterialStatus>("\"arrived\"").unwrap(),
            MaterialStatus::Arrived
        );
    }

    #[test]
    fn test_material_patch_default_is_empty() {
        let patch = MaterialPatch::default();
        assert!(patch.is_empty());

        let patch = MaterialPatch {
            status: Some(MaterialStatus::Ordered),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
