/// Database models for SiteDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Site crew accounts with admin/helper roles
/// - `task`: Kanban-style work items with a status state machine
/// - `material`: Procurement items tracked from needed to arrived
/// - `activity_log`: Append-only audit trail of mutating actions
///
/// # Example
///
/// ```no_run
/// use sitedesk_shared::models::user::{CreateUser, Role, User};
/// use sitedesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "foreman".to_string(),
///     email: "foreman@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Admin,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod activity_log;
pub mod material;
pub mod task;
pub mod user;
