use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: Option<String>,
    pub app_name: String,
    pub deployment: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available
        let db_url = env::var("DB_URL").ok().or_else(|| {
            Some(format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").expect("DB_USER must be set"),
                env::var("DB_PASSWORD").expect("DB_PASSWORD must be set"),
                env::var("DB_HOST").expect("DB_HOST must be set"),
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").expect("DB_NAME must be set"),
            ))
        });

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using default (not secure for production)");
            "default-secret-change-in-production".to_string()
        });

        Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "guge-api".to_string()),
            deployment: env::var("DEPLOYMENT")
                .expect("DEPLOYMENT must be set, this can be local, dev, stage, or prod"),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret,
            access_token_minutes: parse_or("ACCESS_TOKEN_MINUTES", 60),
            refresh_token_days: parse_or("REFRESH_TOKEN_DAYS", 1),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            db_url,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "guge-api-test".to_string(),
            deployment: "test".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            jwt_secret: "test-secret".to_string(),
            access_token_minutes: 5,
            refresh_token_days: 1,
            cors_allowed_origins: vec![],
            db_url: Some("sqlite::memory:".to_string()),
        }
    }
}

fn parse_or(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::common::auth::JwtService;
    use crate::routes::build_router;
    use crate::users::models as users;
    use axum::Router;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

    /// Router plus the handles a test needs to seed data and authenticate.
    pub struct TestApp {
        pub router: Router,
        pub db: DatabaseConnection,
        pub staff_token: String,
        pub user_token: String,
    }

    /// Fresh in-memory database with every migration applied.
    ///
    /// A single pooled connection keeps the in-memory database alive for the
    /// whole test.
    pub async fn setup_test_db() -> DatabaseConnection {
        use migration::{Migrator, MigratorTrait};

        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("Failed to connect to test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run database migrations");

        db
    }

    pub async fn create_test_user(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
        is_staff: bool,
    ) -> users::Model {
        users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(bcrypt::hash(password, 4).unwrap()),
            first_name: Set("Test".to_string()),
            last_name: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            is_active: Set(true),
            is_staff: Set(is_staff),
            is_superuser: Set(false),
            date_joined: Set(chrono::Utc::now()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test user")
    }

    pub async fn setup_test_app() -> TestApp {
        let db = setup_test_db().await;
        let config = Config::for_tests();
        let jwt = JwtService::from_config(&config);

        let staff = create_test_user(&db, "reviewer", "staff-password", true).await;
        let agent = create_test_user(&db, "collector", "agent-password", false).await;

        TestApp {
            router: build_router(&db, &config),
            staff_token: jwt.generate_access_token(&staff).unwrap(),
            user_token: jwt.generate_access_token(&agent).unwrap(),
            db,
        }
    }
}
