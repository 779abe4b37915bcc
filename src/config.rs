use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub environment: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Loads the whole configuration from the environment. Called once at
    /// startup; the resulting value is shared read-only afterwards.
    pub fn from_env() -> anyhow::Result<Self> {
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("APP_PORT must be a valid port number")?,
        };
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        Ok(Self {
            server,
            database_url,
            environment,
            jwt,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
