//! Process configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use warden_infra::ServiceConfig;
use warden_infra::services::DEFAULT_BCRYPT_COST;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub reason: String,
}

impl ConfigError {
    fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string. Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    pub bcrypt_cost: u32,
    pub token_ttl: Option<Duration>,
    pub seed_admin: bool,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = var("WARDEN_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::new("WARDEN_BIND_ADDR", e.to_string()))?;

        let bcrypt_cost = match var("WARDEN_BCRYPT_COST") {
            Some(raw) => {
                let cost = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| ConfigError::new("WARDEN_BCRYPT_COST", e.to_string()))?;
                if !(4..=31).contains(&cost) {
                    return Err(ConfigError::new("WARDEN_BCRYPT_COST", "must be between 4 and 31"));
                }
                cost
            }
            None => DEFAULT_BCRYPT_COST,
        };

        let token_ttl = match var("WARDEN_TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| ConfigError::new("WARDEN_TOKEN_TTL_SECS", e.to_string()))?;
                if secs <= 0 {
                    return Err(ConfigError::new("WARDEN_TOKEN_TTL_SECS", "must be positive"));
                }
                Some(Duration::seconds(secs))
            }
            None => None,
        };

        let seed_admin = match var("WARDEN_SEED_ADMIN") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::new("WARDEN_SEED_ADMIN", "expected true or false"))?,
            None => true,
        };

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            bcrypt_cost,
            token_ttl,
            seed_admin,
        })
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            bcrypt_cost: self.bcrypt_cost,
            token_ttl: self.token_ttl,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.token_ttl, None);
        assert!(config.seed_admin);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("WARDEN_BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/warden"),
            ("WARDEN_BCRYPT_COST", "12"),
            ("WARDEN_TOKEN_TTL_SECS", "3600"),
            ("WARDEN_SEED_ADMIN", "false"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/warden"));
        assert_eq!(config.service_config().bcrypt_cost, 12);
        assert_eq!(config.token_ttl, Some(Duration::hours(1)));
        assert!(!config.seed_admin);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert_eq!(config(&[("WARDEN_BCRYPT_COST", "3")]).unwrap_err().name, "WARDEN_BCRYPT_COST");
        assert_eq!(config(&[("WARDEN_BCRYPT_COST", "ten")]).unwrap_err().name, "WARDEN_BCRYPT_COST");
        assert_eq!(config(&[("WARDEN_TOKEN_TTL_SECS", "0")]).unwrap_err().name, "WARDEN_TOKEN_TTL_SECS");
        assert_eq!(config(&[("WARDEN_BIND_ADDR", "nowhere")]).unwrap_err().name, "WARDEN_BIND_ADDR");
        assert_eq!(config(&[("WARDEN_SEED_ADMIN", "maybe")]).unwrap_err().name, "WARDEN_SEED_ADMIN");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[("DATABASE_URL", "  "), ("WARDEN_BCRYPT_COST", "")]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.bcrypt_cost, 10);
    }
}
