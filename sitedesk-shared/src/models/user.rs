/// User model and database operations
///
/// Users are the site crew: admins manage accounts and can delete or assign
/// work, helpers handle everything else. Passwords are stored as Argon2id
/// hashes and never serialized into responses.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'helper');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(50) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'helper',
///     profile_image VARCHAR(255),
///     last_seen TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User role
///
/// Admins have full privileges; helpers are restricted to non-administrative
/// operations (they cannot delete entities, assign tasks, or manage users).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full privileges
    Admin,

    /// Restricted to non-administrative operations
    Helper,
}

impl Role {
    /// Converts role to string for logging and display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Helper => "helper",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// User model representing a crew account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique login name (3-50 characters)
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash
    ///
    /// Excluded from serialized output; the secret never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Role (admin or helper)
    pub role: Role,

    /// Stored avatar filename (managed by the upload handler)
    pub profile_image: Option<String>,

    /// When the user last made an authenticated request
    pub last_seen: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public identity projection used when resolving foreign keys
///
/// This is what task/activity responses embed for creator, assignee,
/// completer, and actor references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,

    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub role: Role,
}

/// Explicit partial update for a user
///
/// Only fields that are `Some` are written; everything else is left
/// untouched. `profile_image` uses a nested Option so the avatar can be
/// cleared with `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,

    pub email: Option<String>,

    pub password_hash: Option<String>,

    pub role: Option<Role>,

    pub profile_image: Option<Option<String>>,
}

impl UserPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.profile_image.is_none()
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email already exists (unique
    /// constraint violation) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, profile_image,
                      last_seen, created_at, updated_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, profile_image,
                   last_seen, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username or email
    ///
    /// Login accepts either identifier; a single query covers both.
    pub async fn find_by_username_or_email(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, profile_image,
                   last_seen, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies an explicit partial update
    ///
    /// Builds the UPDATE statement from the fields present in the patch;
    /// `updated_at` is always stamped.
    ///
    /// # Returns
    ///
    /// The updated user, or None if the user does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if patch.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if patch.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if patch.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if patch.profile_image.is_some() {
            bind_count += 1;
            query.push_str(&format!(", profile_image = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, username, email, password_hash, role, \
             profile_image, last_seen, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = patch.username {
            q = q.bind(username);
        }
        if let Some(email) = patch.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = patch.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(role) = patch.role {
            q = q.bind(role);
        }
        if let Some(profile_image) = patch.profile_image {
            q = q.bind(profile_image);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Returns true if a row was deleted. Cascades to created tasks,
    /// materials, and activity rows per the schema.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stamps `last_seen` with the current time
    ///
    /// Called from the authentication path as a detached side effect;
    /// deliberately does not touch `updated_at`.
    pub async fn touch_last_seen(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, profile_image,
                   last_seen, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Helper.as_str(), "helper");
        assert!(Role::Admin.is_admin());
        assert!(!Role::Helper.is_admin());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"helper\"").unwrap(),
            Role::Helper
        );
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "foreman".to_string(),
            email: "foreman@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Helper,
            profile_image: None,
            last_seen: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "foreman");
    }

    #[test]
    fn test_user_ref_from_user() {
        let user = User {
            id: Uuid::new_v4(),
            username: "crew1".to_string(),
            email: "crew1@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Helper,
            profile_image: Some("profile-1.png".to_string()),
            last_seen: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let user_ref = UserRef::from(&user);
        assert_eq!(user_ref.id, user.id);
        assert_eq!(user_ref.username, "crew1");
        assert_eq!(user_ref.profile_image.as_deref(), Some("profile-1.png"));
    }

    #[test]
    fn test_user_patch_default_is_empty() {
        let patch = UserPatch::default();
        assert!(patch.is_empty());

        let patch = UserPatch {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    // Integration tests for database operations are in the API crate's
    // tests/ directory.
}
