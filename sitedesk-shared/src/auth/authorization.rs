/// Role gate for admin-only operations
///
/// SiteDesk has a flat two-role model: admins may do everything, helpers
/// may not delete entities, manage users, or reassign tasks. The check is
/// resolved entirely from the [`AuthContext`] — no database round-trip.

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Authenticated but lacking the admin role
    #[error("Admin privileges required")]
    AdminRequired,
}

/// Fails with [`AuthzError::AdminRequired`] unless the caller is an admin
///
/// # Example
///
/// ```
/// use sitedesk_shared::auth::authorization::require_admin;
/// use sitedesk_shared::auth::middleware::AuthContext;
/// use sitedesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let auth = AuthContext {
///     user_id: Uuid::new_v4(),
///     username: "foreman".to_string(),
///     role: Role::Admin,
/// };
/// assert!(require_admin(&auth).is_ok());
/// ```
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.role.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use uuid::Uuid;

    fn context(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn test_admin_passes() {
        assert!(require_admin(&context(Role::Admin)).is_ok());
    }

    #[test]
    fn test_helper_is_rejected() {
        let result = require_admin(&context(Role::Helper));
        assert!(matches!(result, Err(AuthzError::AdminRequired)));
    }
}
