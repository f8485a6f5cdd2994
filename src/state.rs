use crate::auth::{jwt::JwtKeys, password::CredentialHasher};
use crate::config::AppConfig;
use crate::db;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub hasher: Arc<CredentialHasher>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let db = db::connect(&config.database_url, config.max_connections).await?;
        Self::from_parts(db, config)
    }

    pub fn from_parts(db: SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let keys = JwtKeys::from_config(&config.jwt);
        let hasher = Arc::new(CredentialHasher::new(&config.hash)?);
        Ok(Self {
            db,
            config: Arc::new(config),
            keys,
            hasher,
        })
    }
}
