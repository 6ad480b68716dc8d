//! Settings read from the environment (and `.env` when present).

use crate::error::ConfigError;
use crate::event::{DEFAULT_MAX_RETRIES, MAX_RETRIES, MIN_RETRIES};
use sqlx::postgres::PgPoolOptions;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// `DATABASE_URL`; wins over the individual parts when set.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
    /// Schema holding the entity tables.
    pub schema: String,
    pub max_connections: u32,
    /// Create schema, enum types, and tables at startup.
    pub synchronize: bool,
    /// Log every SQL statement at info.
    pub log_statements: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            url: None,
            host: "localhost".into(),
            port: 5432,
            name: "nexus_events".into(),
            username: "postgres".into(),
            password: "postgres".into(),
            schema: "public".into(),
            max_connections: 5,
            synchronize: false,
            log_statements: false,
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.name
            ),
        }
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new().max_connections(self.max_connections)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database: DatabaseSettings,
    /// Retry budget used when a caller does not pass one.
    pub event_max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database: DatabaseSettings::default(),
            event_max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Settings::from_env`] against any lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let d = DatabaseSettings::default();
        let database = DatabaseSettings {
            url: get("DATABASE_URL"),
            host: get("DATABASE_HOST").unwrap_or(d.host),
            port: parse(&get, "DATABASE_PORT", d.port)?,
            name: get("DATABASE_NAME").unwrap_or(d.name),
            username: get("DATABASE_USERNAME").unwrap_or(d.username),
            password: get("DATABASE_PASSWORD").unwrap_or(d.password),
            schema: get("DATABASE_SCHEMA").unwrap_or(d.schema),
            max_connections: parse(&get, "DATABASE_MAX_CONNECTIONS", d.max_connections)?,
            synchronize: flag(&get, "DATABASE_SYNCHRONIZE", d.synchronize)?,
            log_statements: flag(&get, "DATABASE_LOGGING", d.log_statements)?,
        };
        let settings = Settings {
            database,
            event_max_retries: parse(&get, "EVENT_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RETRIES..=MAX_RETRIES).contains(&self.event_max_retries) {
            return Err(ConfigError::Validation(format!(
                "EVENT_MAX_RETRIES must be between {} and {}, got {}",
                MIN_RETRIES, MAX_RETRIES, self.event_max_retries
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation("DATABASE_MAX_CONNECTIONS must be positive".into()));
        }
        Ok(())
    }
}

fn parse<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

fn flag<G>(get: &G, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidVar { name, value }),
        },
    }
}
