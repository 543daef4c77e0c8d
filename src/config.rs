// src/config.rs - Configuration loaded from environment with sane defaults

use anyhow::Result;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sitin_system.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: generate_jwt_secret(),
            token_expiration_hours: 24,
            bcrypt_cost: 12,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn generate_jwt_secret() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

pub fn load_config() -> Result<Config> {
    // .env is optional; real deployments set variables directly
    let _ = dotenvy::dotenv();

    let mut config = Config::default();

    if let Ok(host) = env::var("SITIN_HOST") {
        config.server.host = host;
    }
    if let Ok(port) = env::var("SITIN_PORT") {
        config.server.port = port.parse()?;
    }
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Ok(max) = env::var("DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections = max.parse()?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }
        config.auth.jwt_secret = secret;
    }
    if let Ok(hours) = env::var("TOKEN_EXPIRATION_HOURS") {
        config.auth.token_expiration_hours = hours.parse()?;
    }
    if let Ok(cost) = env::var("BCRYPT_COST") {
        config.auth.bcrypt_cost = cost.parse()?;
    }
    if let Ok(origins) = env::var("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(level) = env::var("LOG_LEVEL") {
        config.logging.level = level;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "sitin_system.db");
        assert!(config.auth.jwt_secret.len() >= 32);
    }

    #[test]
    fn generated_secret_is_long_enough() {
        let secret = generate_jwt_secret();
        assert_eq!(secret.len(), 64);
        assert_ne!(secret, generate_jwt_secret());
    }
}
