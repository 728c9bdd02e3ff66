//! Server configuration
//!
//! Read once at startup from `PUBKEY_REGISTRY_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `PUBKEY_REGISTRY_PORT` | `8080` |
//! | `PUBKEY_REGISTRY_BIND` | `0.0.0.0` |
//! | `PUBKEY_REGISTRY_DATABASE` | `./database.db` |
//! | `PUBKEY_REGISTRY_MIN_KEY_BITS` | `2048` |
//! | `PUBKEY_REGISTRY_MAX_KEY_BITS` | `4096` |
//! | `PUBKEY_REGISTRY_LOG_LEVEL` | `info` |

use pubkey_core::types::{DEFAULT_MAX_MODULUS_BITS, DEFAULT_MIN_MODULUS_BITS};
use pubkey_core::KeyPolicy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

pub const ENV_PORT: &str = "PUBKEY_REGISTRY_PORT";
pub const ENV_BIND: &str = "PUBKEY_REGISTRY_BIND";
pub const ENV_DATABASE: &str = "PUBKEY_REGISTRY_DATABASE";
pub const ENV_MIN_KEY_BITS: &str = "PUBKEY_REGISTRY_MIN_KEY_BITS";
pub const ENV_MAX_KEY_BITS: &str = "PUBKEY_REGISTRY_MAX_KEY_BITS";
pub const ENV_LOG_LEVEL: &str = "PUBKEY_REGISTRY_LOG_LEVEL";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_DATABASE: &str = "./database.db";

/// Configuration errors abort startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Invalid key size bounds: {0}")]
    Policy(#[from] pubkey_core::KeyError),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub key_policy: KeyPolicy,
    pub log_level: Level,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            port: DEFAULT_PORT,
            database_path: PathBuf::from(DEFAULT_DATABASE),
            key_policy: KeyPolicy::default(),
            log_level: Level::INFO,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value,
        }),
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, ENV_PORT, "port number", DEFAULT_PORT)?;
        let bind = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.into());
        let database_path = lookup(ENV_DATABASE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let min_bits = parse_var(&lookup, ENV_MIN_KEY_BITS, "bit count", DEFAULT_MIN_MODULUS_BITS)?;
        let max_bits = parse_var(&lookup, ENV_MAX_KEY_BITS, "bit count", DEFAULT_MAX_MODULUS_BITS)?;
        let key_policy = KeyPolicy::new(min_bits, max_bits)?;

        let log_level = parse_var(&lookup, ENV_LOG_LEVEL, "log level", Level::INFO)?;

        Ok(Self {
            bind,
            port,
            database_path,
            key_policy,
            log_level,
        })
    }

    /// Socket address string to bind the listener to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("./database.db"));
        assert_eq!(config.key_policy, KeyPolicy::default());
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_PORT, "9090"),
            (ENV_BIND, "127.0.0.1"),
            (ENV_DATABASE, "/var/lib/keys.db"),
            (ENV_MIN_KEY_BITS, "3072"),
            (ENV_MAX_KEY_BITS, "4096"),
            (ENV_LOG_LEVEL, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/keys.db"));
        assert_eq!(config.key_policy.min_modulus_bits(), 3072);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_bad_port() {
        let result = ServerConfig::from_lookup(lookup(&[(ENV_PORT, "eighty")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { var: ENV_PORT, .. })
        ));
    }

    #[test]
    fn test_inverted_key_bounds() {
        let result = ServerConfig::from_lookup(lookup(&[
            (ENV_MIN_KEY_BITS, "4096"),
            (ENV_MAX_KEY_BITS, "2048"),
        ]));
        assert!(matches!(result, Err(ConfigError::Policy(_))));
    }

    #[test]
    fn test_unsupported_max_bits() {
        let result = ServerConfig::from_lookup(lookup(&[(ENV_MAX_KEY_BITS, "8192")]));
        assert!(matches!(result, Err(ConfigError::Policy(_))));
    }
}
