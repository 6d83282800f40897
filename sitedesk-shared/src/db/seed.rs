/// Bootstrap seeding
///
/// A fresh deployment has no accounts and only admins can create accounts,
/// so the first admin has to come from somewhere: on startup, if the users
/// table is empty and a seed password is configured, the initial admin is
/// created. Skipped silently (with a log line) in every other case.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::password::{hash_password, PasswordError};
use crate::models::user::{CreateUser, Role, User};

/// Configuration for the bootstrap admin account
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub username: String,

    pub email: String,

    /// Plaintext password for the bootstrap admin; when None, seeding is
    /// skipped entirely
    pub password: Option<String>,
}

impl SeedConfig {
    /// Loads seed configuration from environment variables
    ///
    /// - `SEED_ADMIN_USERNAME` (default "admin")
    /// - `SEED_ADMIN_EMAIL` (default "admin@example.com")
    /// - `SEED_ADMIN_PASSWORD` (no default; absent disables seeding)
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("SEED_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            email: std::env::var("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            password: std::env::var("SEED_ADMIN_PASSWORD").ok(),
        }
    }
}

/// Error type for bootstrap seeding
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Creates the initial admin account if the users table is empty
///
/// Returns the created user, or None when seeding was skipped (users
/// already exist, or no seed password configured).
pub async fn ensure_default_admin(
    pool: &PgPool,
    config: &SeedConfig,
) -> Result<Option<User>, SeedError> {
    if User::count(pool).await? > 0 {
        return Ok(None);
    }

    let Some(ref password) = config.password else {
        warn!("Users table is empty and SEED_ADMIN_PASSWORD is not set; skipping bootstrap admin");
        return Ok(None);
    };

    let password_hash = hash_password(password)?;

    let user = User::create(
        pool,
        CreateUser {
            username: config.username.clone(),
            email: config.email.clone(),
            password_hash,
            role: Role::Admin,
        },
    )
    .await?;

    info!(username = %user.username, "Created bootstrap admin account");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_config_defaults() {
        // Only assert the hardcoded fallbacks; env vars may or may not be
        // set in the test environment.
        let config = SeedConfig {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: None,
        };

        assert_eq!(config.username, "admin");
        assert!(config.password.is_none());
    }
}
