use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cookies: CookieConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. `None` selects the in-memory database.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    /// Whether auth cookies carry the Secure attribute. Keep true anywhere
    /// TLS terminates in front of the server.
    pub secure: bool,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if
    /// present. The two signing secrets are required; everything else has a
    /// development-friendly default.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").ok(),
            },
            jwt: JwtConfig {
                access_secret: env::var("JWT_ACCESS_SECRET")?,
                refresh_secret: env::var("JWT_REFRESH_SECRET")?,
                access_expiry_minutes: env::var("JWT_ACCESS_EXPIRY_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()?,
                refresh_expiry_minutes: env::var("JWT_REFRESH_EXPIRY_MINUTES")
                    .unwrap_or_else(|_| "1440".to_string())
                    .parse()?,
            },
            cookies: CookieConfig {
                secure: env::var("COOKIE_SECURE")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()?,
            },
        })
    }
}
