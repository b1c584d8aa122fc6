use std::time::Duration;

use async_trait::async_trait;
use campground_services::ports::StoreHealth;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Creates a connection pool to the PostgreSQL database.
pub async fn create_connection_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Applies the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

/// Live connectivity check for the health endpoint
#[derive(Clone)]
pub struct PgHealth {
    pool: PgPool,
}

impl PgHealth {
    /// Creates a checker over `pool`
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for PgHealth {
    async fn ping(&self) -> bool {
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Database ping failed: {}", e);
                false
            }
        }
    }
}
