use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::jwt::JwtKeys,
    config::{AppConfig, AuthConfig},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(config: AppConfig, auth: AuthConfig, db: DatabaseConnection) -> Arc<Self> {
        let jwt = JwtKeys::from_secret(auth.jwt_secret.as_bytes());
        Arc::new(Self {
            config,
            auth,
            db,
            jwt,
        })
    }
}
