use std::sync::Arc;

use axum::{Router, middleware};

use crate::{
    config::{AppConfig, AuthConfig, DatabaseConfig, TasksConfig},
    db::connection,
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Fresh in-memory sqlite database with the schema synced.
pub async fn test_state() -> anyhow::Result<Arc<AppState>> {
    test_state_with(TasksConfig::default()).await
}

/// Like [`test_state`] with custom task limits.
pub async fn test_state_with(tasks: TasksConfig) -> anyhow::Result<Arc<AppState>> {
    let cfg = AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        },
        tasks,
        ..AppConfig::default()
    };
    let auth = AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        access_ttl_secs: 3600,
    };
    let db = connection::connect(&cfg.database).await?;
    Ok(AppState::new(cfg, auth, db))
}

/// The router wrapped in the same layers the binary installs.
pub fn test_app(state: &Arc<AppState>) -> Router {
    Router::new()
        .merge(router(Arc::clone(state)))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
}
