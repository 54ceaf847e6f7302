use crate::common::auth::JwtService;
use crate::config::Config;
use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let jwt = JwtService::from_config(&config);
        Self { db, config, jwt }
    }
}
