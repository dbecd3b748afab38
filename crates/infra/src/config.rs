//! Process configuration, read once at start-up from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `DATABASE_URL` | unset | PostgreSQL store when set, in-memory otherwise |
//! | `JWT_SECRET` / `SESSION_SECRET` | `dev-secret-key` outside production | token signing secret |
//! | `BIND_ADDR` | `0.0.0.0:8080` | listen address |
//! | `APP_ENV` | `development` | `production` enables JSON logs and strict secrets |
//! | `SEED_DEMO_DATA` | `true` outside production | create demo accounts and events |

use std::net::SocketAddr;
use std::time::Duration;

use registrar_auth::DEFAULT_TOKEN_TTL;
use thiserror::Error;

const DEV_SECRET: &str = "dev-secret-key";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET (or SESSION_SECRET) must be set in production")]
    MissingSecret,

    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Fixed at [`DEFAULT_TOKEN_TTL`]; only tests override it.
    pub token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub seed_demo_data: bool,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bind_addr", &self.bind_addr)
            .field("seed_demo_data", &self.seed_demo_data)
            .finish()
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var("APP_ENV").as_deref().map(str::trim) {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = match var("JWT_SECRET").or_else(|| var("SESSION_SECRET")) {
            Some(secret) => secret,
            None if environment.is_production() => return Err(ConfigError::MissingSecret),
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
        };

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let seed_demo_data = match var("SEED_DEMO_DATA") {
            Some(raw) => parse_bool("SEED_DEMO_DATA", raw)?,
            None => !environment.is_production(),
        };

        Ok(Self {
            environment,
            database_url: var("DATABASE_URL"),
            jwt_secret,
            token_ttl: DEFAULT_TOKEN_TTL,
            bind_addr,
            seed_demo_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn development_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.jwt_secret, DEV_SECRET);
        assert_eq!(cfg.token_ttl, Duration::from_secs(1800));
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(cfg.seed_demo_data);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn session_secret_is_a_fallback() {
        let cfg = config(&[("SESSION_SECRET", "s1")]).unwrap();
        assert_eq!(cfg.jwt_secret, "s1");
        let cfg = config(&[("SESSION_SECRET", "s1"), ("JWT_SECRET", "j1")]).unwrap();
        assert_eq!(cfg.jwt_secret, "j1");
    }

    #[test]
    fn production_is_strict() {
        assert_eq!(config(&[("APP_ENV", "production")]).unwrap_err(), ConfigError::MissingSecret);

        let cfg = config(&[("APP_ENV", "production"), ("JWT_SECRET", "prod")]).unwrap();
        assert!(cfg.environment.is_production());
        assert!(!cfg.seed_demo_data);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { name: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("SEED_DEMO_DATA", "maybe")]),
            Err(ConfigError::Invalid { name: "SEED_DEMO_DATA", .. })
        ));
        assert!(!config(&[("SEED_DEMO_DATA", "off")]).unwrap().seed_demo_data);
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = config(&[("JWT_SECRET", "super-secret")]).unwrap();
        assert!(!format!("{cfg:?}").contains("super-secret"));
    }
}
