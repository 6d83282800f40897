/// API route handlers
///
/// Handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login and current-user endpoints
/// - `users`: Account management and avatar upload
/// - `tasks`: Task board operations
/// - `materials`: Procurement list operations
/// - `activity`: Audit trail listing

pub mod activity;
pub mod auth;
pub mod health;
pub mod materials;
pub mod tasks;
pub mod users;

/// Deserializer for patch fields where present-null and absent differ
///
/// Plain `Option<Option<T>>` folds an explicit JSON null into the outer
/// None; wrapping the inner deserialization keeps the distinction:
/// absent → None, null → Some(None), value → Some(Some(value)).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
