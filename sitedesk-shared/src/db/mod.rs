/// Database layer for SiteDesk
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Database migration runner
/// - `seed`: Bootstrap seeding of the initial admin account

pub mod migrations;
pub mod pool;
pub mod seed;
