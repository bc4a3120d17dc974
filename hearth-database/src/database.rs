use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, migrate::Migrator};
use tracing::info;

use crate::cache::CacheService;
use crate::store::BackendOptions;

/// Migrations under `hearth-database/migrations`, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres pool plus the cache used for leaderboard reads.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
}

impl Database {
    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    /// Open a pool against `url` and, unless disabled, bring the schema up to date.
    pub async fn connect(
        url: &str,
        options: &BackendOptions,
        cache: CacheService,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(url)
            .await?;
        info!("PostgreSQL connection established.");

        if options.run_migrations {
            MIGRATOR.run(&pool).await?;
            info!("Database migrations applied.");
        } else {
            info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
        }

        Ok(Self::with_cache(pool, cache))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Wait for in-flight queries, then close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
