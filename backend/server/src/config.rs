use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_ORIGINS: &str =
    "http://localhost:5173,http://127.0.0.1:5173,http://localhost:3000,http://127.0.0.1:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Secret {0} not found in /run/secrets or the environment")]
    MissingSecret(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_ms: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the config from `source`, which stands in for the environment.
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bcrypt_cost: u32 = try_load(&source, "BCRYPT_COST", "10")?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: format!("{bcrypt_cost} is outside 4..=31"),
            });
        }

        Ok(Self {
            port: try_load(&source, "RUST_PORT", "8080")?,
            redis_url: var(&source, "REDIS_URL"),
            jwt_secret: read_secret(&source, "JWT_SECRET_KEY")?,
            jwt_expiration_ms: try_load(&source, "JWT_EXPIRATION_MS", "3600000")?,
            bcrypt_cost,
            cors_origins: parse_origins(&try_load::<String>(
                &source,
                "CORS_ORIGINS",
                DEFAULT_ORIGINS,
            )?),
        })
    }
}

fn var(source: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = source(key);
    if value.is_none() {
        warn!("Environment variable {key} not found, using default");
    }

    value
}

fn try_load<T: FromStr>(
    source: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(source, key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

fn read_secret(
    source: &impl Fn(&str) -> Option<String>,
    secret_name: &'static str,
) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            source(secret_name)
                .map(|s| s.trim().to_string())
                .ok_or(ConfigError::MissingSecret(secret_name))
        })
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
