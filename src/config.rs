use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::Duration;

use crate::error::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://foodgram.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub port: u16,
    pub secret: String,
    pub session_hours: i64,
    pub db_connections: u32,
    pub ingredients_file: Option<PathBuf>,
    pub tags_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("FOODGRAM_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("FOODGRAM_SECRET must be set".to_owned()))?;

        let session_hours: i64 = try_load(&lookup, "FOODGRAM_SESSION_HOURS", "24")?;
        if session_hours <= 0 {
            return Err(Error::Config(
                "FOODGRAM_SESSION_HOURS must be positive".to_owned(),
            ));
        }

        let db_connections: u32 = try_load(&lookup, "FOODGRAM_DB_CONNECTIONS", "5")?;
        if db_connections == 0 {
            return Err(Error::Config(
                "FOODGRAM_DB_CONNECTIONS must be positive".to_owned(),
            ));
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            redis_url: lookup("REDIS_URL").filter(|s| !s.trim().is_empty()),
            port: try_load(&lookup, "FOODGRAM_PORT", "8000")?,
            secret,
            session_hours,
            db_connections,
            ingredients_file: lookup("FOODGRAM_INGREDIENTS_FILE").map(PathBuf::from),
            tags_file: lookup("FOODGRAM_TAGS_FILE").map(PathBuf::from),
        })
    }

    /// In-process defaults with the given signing secret.
    pub fn with_secret(secret: &str) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            redis_url: None,
            port: 8000,
            secret: secret.to_owned(),
            session_hours: 24,
            db_connections: 5,
            ingredients_file: None,
            tags_file: None,
        }
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::hours(self.session_hours)
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_owned()
        })
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {key} value: {e}")))
}
