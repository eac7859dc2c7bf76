//! Process configuration, read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PARCELHUB_BIND_ADDR` | `0.0.0.0:8080` | HTTP listen address |
//! | `USE_PERSISTENT_STORES` | `false` | store events in Postgres instead of memory |
//! | `DATABASE_URL` | - | required when `USE_PERSISTENT_STORES` is true |
//! | `PARCELHUB_SSE_KEEPALIVE_SECS` | `15` | keep-alive interval of `/stream` |
//! | `PARCELHUB_LOG_FORMAT` | `json` | `json` or `pretty` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use parcelhub_observability::LogFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set when {because}")]
    Missing { var: &'static str, because: &'static str },

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where committed events live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub sse_keep_alive: Duration,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            storage: StorageConfig::InMemory,
            sse_keep_alive: Duration::from_secs(15),
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    /// Read the process environment. Call `dotenvy::dotenv()` first to honour `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset and blank variables take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match get("PARCELHUB_BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "PARCELHUB_BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let persistent = match get("USE_PERSISTENT_STORES") {
            Some(raw) => parse_bool("USE_PERSISTENT_STORES", &raw)?,
            None => false,
        };
        let storage = if persistent {
            let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing {
                var: "DATABASE_URL",
                because: "USE_PERSISTENT_STORES=true",
            })?;
            StorageConfig::Postgres { database_url }
        } else {
            StorageConfig::InMemory
        };

        let sse_keep_alive = match get("PARCELHUB_SSE_KEEPALIVE_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: "PARCELHUB_SSE_KEEPALIVE_SECS",
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "PARCELHUB_SSE_KEEPALIVE_SECS",
                        value: raw.clone(),
                        reason: e.to_string(),
                    });
                }
            },
            None => defaults.sse_keep_alive,
        };

        let log_format = match get("PARCELHUB_LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e: parcelhub_observability::UnknownLogFormat| ConfigError::Invalid {
                var: "PARCELHUB_LOG_FORMAT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.log_format,
        };

        Ok(Self {
            bind_addr,
            storage,
            sse_keep_alive,
            log_format,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn persistent_stores_need_a_database_url() {
        let err = config(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var: "DATABASE_URL", .. }));

        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "TRUE"),
            ("DATABASE_URL", "postgres://localhost/parcelhub"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/parcelhub".to_string()
            }
        );
    }

    #[test]
    fn invalid_values_are_reported_not_defaulted() {
        assert!(matches!(
            config(&[("PARCELHUB_BIND_ADDR", "not-an-addr")]),
            Err(ConfigError::Invalid { var: "PARCELHUB_BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "maybe")]),
            Err(ConfigError::Invalid { var: "USE_PERSISTENT_STORES", .. })
        ));
        assert!(matches!(
            config(&[("PARCELHUB_SSE_KEEPALIVE_SECS", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config(&[("PARCELHUB_LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config(&[
            ("PARCELHUB_BIND_ADDR", "127.0.0.1:9000"),
            ("PARCELHUB_SSE_KEEPALIVE_SECS", "5"),
            ("PARCELHUB_LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.sse_keep_alive, Duration::from_secs(5));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }
}
