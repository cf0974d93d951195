use std::sync::Arc;

use crate::infra::db::Db;
use crate::security::config::SecurityConfig;
use crate::security::jwt::JwtManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub jwt: JwtManager,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(db: Db, jwt: JwtManager, security: SecurityConfig) -> Arc<Self> {
        Arc::new(Self { db, jwt, security })
    }
}
