use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: Option<Secret<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("FACTURO_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("FACTURO_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let db_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let max_connections = env::var("FACTURO_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "16".to_string())
            .parse()?;
        let min_connections = env::var("FACTURO_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let redis_url = env::var("FACTURO_REDIS_URL").ok().map(Secret::new);

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            redis: RedisConfig { url: redis_url },
            service_name: "facturo-service".to_string(),
        })
    }
}
