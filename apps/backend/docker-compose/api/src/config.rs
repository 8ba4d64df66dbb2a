use sales_analytics_api::seed::{DEFAULT_SEED_COUNT, SeedMode};
use sales_analytics_storage::StoreProvider;
use std::env;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub store: StoreProvider,
    pub seed: SeedMode,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let provider = var("STORE_PROVIDER").unwrap_or_else(|| {
            if database_url.is_some() {
                "database".to_string()
            } else {
                "memory".to_string()
            }
        });

        let store = match provider.to_ascii_lowercase().as_str() {
            "memory" => StoreProvider::Memory,
            "database" | "postgres" | "sqlite" => StoreProvider::Database {
                url: database_url.ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: var("DATABASE_MAX_CONNECTIONS")
                    .map(|raw| raw.parse())
                    .transpose()
                    .map_err(|_| {
                        ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string())
                    })?
                    .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            },
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "STORE_PROVIDER: unknown provider `{}`",
                    other
                )));
            }
        };

        let seed_count = var("SEED_COUNT")
            .map(|raw| raw.parse())
            .transpose()
            .map_err(|_| ConfigError::InvalidValue("SEED_COUNT".to_string()))?
            .unwrap_or(DEFAULT_SEED_COUNT);
        let seed_mode = var("SEED_MODE").unwrap_or_else(|| "random".to_string());
        let seed = SeedMode::parse(&seed_mode, seed_count)
            .ok_or_else(|| ConfigError::InvalidValue(format!("SEED_MODE: `{}`", seed_mode)))?;

        Ok(Config { port, store, seed })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVar(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(var) => write!(f, "Invalid value for: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}
