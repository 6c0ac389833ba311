use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use axum::http::HeaderName;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreKind::Redis),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store backend {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub store: StoreKind,
    /// Header the authenticating proxy puts the caller's user id in.
    pub actor_header: HeaderName,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let redis_url: String = try_load("REDIS_URL", "redis://127.0.0.1:6379")?;

        Ok(Self {
            port: try_load("RUST_PORT", "3001")?,
            redis_url: with_password(&redis_url, read_secret("REDIS_PASSWORD")),
            store: try_load("STORE_BACKEND", "redis")?,
            actor_header: try_load("ACTOR_HEADER", "x-user-id")?,
        })
    }
}

/// The values [`Config::load`] falls back to when nothing is set.
impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store: StoreKind::Redis,
            actor_header: HeaderName::from_static("x-user-id"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("No {secret_name} secret: {e}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

/// Puts the password into `redis://host` style urls that carry no credentials.
fn with_password(url: &str, password: Option<String>) -> String {
    match (password, url.split_once("://")) {
        (Some(password), Some((scheme, rest))) if !rest.contains('@') => {
            format!("{scheme}://:{password}@{rest}")
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind() {
        assert_eq!("redis".parse::<StoreKind>(), Ok(StoreKind::Redis));
        assert_eq!("Memory".parse::<StoreKind>(), Ok(StoreKind::Memory));
        assert!("mongo".parse::<StoreKind>().is_err());
    }

    #[test]
    fn test_default_matches_load_fallbacks() {
        let config = Config::default();
        assert_eq!(config.store, StoreKind::Redis);
        assert_eq!(config.port, 3001);
        assert_eq!(config.actor_header, "x-user-id");

        assert_eq!(try_load::<StoreKind>("COOKBOOK_UNSET_STORE", "redis").unwrap(), config.store);
        assert_eq!(try_load::<u16>("COOKBOOK_UNSET_PORT", "3001").unwrap(), config.port);
    }

    #[test]
    fn test_with_password() {
        assert_eq!(
            with_password("redis://cache:6379", Some("hunter2".to_string())),
            "redis://:hunter2@cache:6379"
        );
        assert_eq!(
            with_password("redis://user:pw@cache:6379", Some("hunter2".to_string())),
            "redis://user:pw@cache:6379"
        );
        assert_eq!(with_password("redis://cache:6379", None), "redis://cache:6379");
    }
}
