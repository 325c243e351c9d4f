#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, database_config};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Live database for repository tests, or `None` when no `DATABASE_URL` is set
/// or the database cannot be migrated.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            let mut cfg = database_config();
            cfg.min_connections = cfg.min_connections.min(1);
            let Ok(db) = connect_with_config(&cfg).await else { return false };
            migration::Migrator::up(&db, None).await.is_ok()
        })
        .await;
    if !migrated {
        return Ok(None);
    }

    // Return a fresh connection for the current test's runtime
    let mut cfg = database_config();
    cfg.max_connections = cfg.max_connections.max(20);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    Ok(Some(connect_with_config(&cfg).await?))
}
