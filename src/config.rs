use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to load {path}: {reason}")]
    File { path: String, reason: String },
}

/// OTLP exporter settings; present only when an API key is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub allow_destructive_migrations: bool,
    pub session_cleanup_interval_secs: u64,
    pub otlp: Option<OtlpConfig>,
}

const DEFAULT_OTLP_ENDPOINT: &str = "https://api.honeycomb.io:443";
const DEFAULT_SESSION_CLEANUP_INTERVAL_SECS: u64 = 3600;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = dotenvy::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let allow_destructive_migrations = parse_var("ALLOW_DESTRUCTIVE_MIGRATIONS", false)?;
        let session_cleanup_interval_secs = parse_var(
            "SESSION_CLEANUP_INTERVAL_SECS",
            DEFAULT_SESSION_CLEANUP_INTERVAL_SECS,
        )?;
        if session_cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_CLEANUP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let otlp = dotenvy::var("HONEYCOMB_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| OtlpConfig {
                endpoint: dotenvy::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_OTLP_ENDPOINT.to_string()),
                api_key,
            });

        Ok(Self {
            database_url,
            allow_destructive_migrations,
            session_cleanup_interval_secs,
            otlp,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match dotenvy::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::Invalid { key, value })
        }
        _ => Ok(default),
    }
}

pub fn load_environment() -> Result<(), ConfigError> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), ConfigError> {
    if !Path::new(path).exists() {
        warn!("Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path).map_err(|e| ConfigError::File {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 5] = [
        "DATABASE_URL",
        "ALLOW_DESTRUCTIVE_MIGRATIONS",
        "SESSION_CLEANUP_INTERVAL_SECS",
        "HONEYCOMB_API_KEY",
        "OTEL_EXPORTER_OTLP_ENDPOINT",
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = KEYS.iter().map(|k| (*k, None)).collect();
        for (key, value) in vars {
            all.retain(|(k, _)| k != key);
            all.push((*key, Some(*value)));
        }
        temp_env::with_vars(all, f);
    }

    #[test]
    #[serial]
    fn defaults_apply_when_only_database_url_is_set() {
        with_env(&[("DATABASE_URL", "sqlite::memory:")], || {
            let config = AppConfig::from_env().unwrap();
            assert_eq!(config.database_url, "sqlite::memory:");
            assert!(!config.allow_destructive_migrations);
            assert_eq!(config.session_cleanup_interval_secs, 3600);
            assert_eq!(config.otlp, None);
        });
    }

    #[test]
    #[serial]
    fn missing_database_url_is_reported() {
        with_env(&[], || {
            assert_eq!(
                AppConfig::from_env(),
                Err(ConfigError::Missing("DATABASE_URL"))
            );
        });
    }

    #[test]
    #[serial]
    fn invalid_values_name_the_key() {
        with_env(
            &[
                ("DATABASE_URL", "sqlite::memory:"),
                ("ALLOW_DESTRUCTIVE_MIGRATIONS", "sometimes"),
            ],
            || {
                assert_eq!(
                    AppConfig::from_env(),
                    Err(ConfigError::Invalid {
                        key: "ALLOW_DESTRUCTIVE_MIGRATIONS",
                        value: "sometimes".to_string()
                    })
                );
            },
        );

        with_env(
            &[
                ("DATABASE_URL", "sqlite::memory:"),
                ("SESSION_CLEANUP_INTERVAL_SECS", "0"),
            ],
            || {
                assert!(matches!(
                    AppConfig::from_env(),
                    Err(ConfigError::Invalid { key: "SESSION_CLEANUP_INTERVAL_SECS", .. })
                ));
            },
        );
    }

    #[test]
    #[serial]
    fn exporter_is_enabled_by_api_key() {
        with_env(
            &[
                ("DATABASE_URL", "sqlite::memory:"),
                ("HONEYCOMB_API_KEY", "secret"),
            ],
            || {
                let otlp = AppConfig::from_env().unwrap().otlp.unwrap();
                assert_eq!(otlp.api_key, "secret");
                assert_eq!(otlp.endpoint, DEFAULT_OTLP_ENDPOINT);
            },
        );
    }
}
