use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use super::{
    pool_options,
    registry::{DbProvider, DbProviderId},
};
use crate::config::DatabaseConfig;

pub struct PostgresDbProvider;

#[async_trait]
impl DbProvider for PostgresDbProvider {
    fn id(&self) -> DbProviderId {
        DbProviderId::Postgres
    }

    fn supports_url(&self, url: &str) -> bool {
        let normalized = url.trim().to_ascii_lowercase();
        normalized.starts_with("postgres://") || normalized.starts_with("postgresql://")
    }

    async fn connect(&self, cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
        let options = pool_options(&cfg.url, cfg.max_connections, cfg.min_idle);
        Ok(Database::connect(options).await?)
    }

    // Due dates keep their offset; session time zone only affects NOW().
    async fn post_connect(&self, db: &DatabaseConnection, _cfg: &DatabaseConfig) -> Result<()> {
        db.execute_unprepared("SET TIME ZONE 'UTC'").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PostgresDbProvider;
    use crate::db::providers::DbProvider;

    #[test]
    fn accepts_both_postgres_schemes() {
        assert!(PostgresDbProvider.supports_url("postgres://localhost/tasks"));
        assert!(PostgresDbProvider.supports_url(" PostgreSQL://localhost/tasks"));
        assert!(!PostgresDbProvider.supports_url("sqlite::memory:"));
    }
}
