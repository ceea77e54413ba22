use std::path::Path;
use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::clue;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // SQLite fails a deferred transaction that upgrades to a write lock with
    // SQLITE_BUSY instead of waiting, so all access shares one connection.
    let max_connections = if is_sqlite(db_url) { 1 } else { 16 };

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("hunt_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Create the parent directory of a file-backed SQLite database.
///
/// `mode=rwc` creates the file but not missing directories. Other backends
/// and in-memory databases are left alone.
pub async fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = sqlite_file_path(db_url) else {
        return Ok(());
    };
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir).await,
        _ => Ok(()),
    }
}

fn is_sqlite(db_url: &str) -> bool {
    db_url.starts_with("sqlite:")
}

fn sqlite_file_path(db_url: &str) -> Option<&str> {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty() && path != ":memory:").then_some(path)
}

/// Create secondary indexes the schema sync does not manage.
///
/// Failures are logged and ignored; the indexes only speed up queries.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Clue listing: SELECT ... FROM clue WHERE hunt_id = ? ORDER BY position
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_clue_hunt_position")
        .table(clue::Entity)
        .col(clue::Column::HuntId)
        .col(clue::Column::Position)
        .to_owned();

    let backend = db.get_database_backend();

    match db.execute_raw(backend.build(&stmt)).await {
        Ok(_) => info!("Ensured index idx_clue_hunt_position exists"),
        Err(e) => warn!("Failed to create index idx_clue_hunt_position: {}", e),
    }

    Ok(())
}
