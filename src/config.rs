use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub environment: String,
    pub notification_sender: String,
    pub hierarchy_depth_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://@localhost:5432/leavekeeper".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            notification_sender: env::var("NOTIFICATION_SENDER")
                .unwrap_or_else(|_| "no-reply@leavekeeper.local".to_string()),
            hierarchy_depth_limit: env::var("HIERARCHY_DEPTH_LIMIT")
                .unwrap_or_else(|_| "32".to_string())
                .parse()
                .unwrap_or(32),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "postgres://@localhost:5432/leavekeeper".to_string(),
            database_max_connections: 5,
            environment: "development".to_string(),
            notification_sender: "no-reply@leavekeeper.local".to_string(),
            hierarchy_depth_limit: 32,
        }
    }
}
