use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // An in-memory SQLite database exists per connection, so it must not be pooled wider
    // than one.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 20 };

    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Resolve the `--database` argument into a connection URL.
///
/// Full `postgres://` or `sqlite:` URLs pass through untouched; anything else is treated
/// as a SQLite file path.
pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(url)
            if url.starts_with("postgres://")
                || url.starts_with("postgresql://")
                || url.starts_with("sqlite:") =>
        {
            url.to_string()
        }
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => "sqlite://range_plan.db?mode=rwc".to_string(),
    }
}
