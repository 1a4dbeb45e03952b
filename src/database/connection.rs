use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::info;

/// Owns the connection pool. Cloning shares the pool; every handler
/// invocation takes its own transaction where it needs one.
#[derive(Clone)]
pub struct DatabaseManager {
    /// Shared sqlite pool.
    pub pool: SqlitePool,
}

impl DatabaseManager {
    /// Connects to `database_url`, creating the database file if missing.
    pub async fn new(database_url: &str) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        Ok(Self { pool })
    }

    /// Applies pending migrations from `./migrations`.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
