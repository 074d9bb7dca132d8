use core_config::{FromEnv, env_optional, env_parse, server::ServerConfig};

use database::postgres::PostgresConfig;

pub use core_config::Environment;

const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    /// `None` selects the in-memory store
    pub database: Option<PostgresConfig>,
    pub audit_queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let database = match env_optional("DATABASE_URL") {
            Some(_) => Some(PostgresConfig::from_env()?),
            None => None,
        };
        let audit_queue_capacity =
            env_parse("AUDIT_QUEUE_CAPACITY", DEFAULT_AUDIT_QUEUE_CAPACITY)?.max(1);

        Ok(Self {
            environment,
            server,
            database,
            audit_queue_capacity,
        })
    }
}
