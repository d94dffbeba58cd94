use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use thiserror::Error;
use tracing::{debug, info, warn};

const MONGODB_URI: &str = "MONGODB_URI";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: String, message: String },

    #[error("Missing secret {0}")]
    MissingSecret(&'static str),
}

pub struct Config {
    pub port: u16,
    pub store: StoreConfig,
    pub cors_max_age: u64,
}

/// Which document store backs the server.
pub enum StoreConfig {
    Mongo { uri: String, database: String },
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StoreKind {
    Mongo,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreKind::Mongo),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store {other:?}, expected mongo or memory")),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let store = match try_load::<StoreKind>("LAWACE_STORE", "mongo")? {
            StoreKind::Mongo => StoreConfig::Mongo {
                uri: mongo_uri()?,
                database: try_load("DB_NAME", "lawaceDB")?,
            },
            StoreKind::Memory => StoreConfig::Memory,
        };

        Ok(Self {
            port: try_load("PORT", "3000")?,
            store,
            cors_max_age: try_load("CORS_MAX_AGE_SECS", "3600")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            store: StoreConfig::Memory,
            cors_max_age: 60 * 60,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .inspect_err(|e| {
            debug!("Failed to read {secret_name} from file ({e}), trying environment");
        })
        .ok()
        .or_else(|| var(secret_name))
        .filter(|secret| !secret.is_empty())
}

fn mongo_uri() -> Result<String, ConfigError> {
    if let Some(uri) = read_secret(MONGODB_URI) {
        return Ok(uri);
    }

    match (read_secret("DB_USER"), read_secret("DB_PASS"), var("DB_HOST")) {
        (Some(user), Some(pass), Some(host)) => Ok(format!(
            "mongodb+srv://{user}:{pass}@{host}/?retryWrites=true&w=majority&appName=lawace"
        )),
        _ => {
            warn!("Neither {MONGODB_URI} nor DB_USER, DB_PASS and DB_HOST are set");
            Err(ConfigError::MissingSecret(MONGODB_URI))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreKind;

    #[test]
    fn test_store_kind() {
        assert_eq!("mongo".parse::<StoreKind>(), Ok(StoreKind::Mongo));
        assert_eq!(" Memory ".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert!("redis".parse::<StoreKind>().is_err());
    }
}
