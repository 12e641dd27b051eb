pub mod database;

use std::{env, net::IpAddr, path::PathBuf};

pub use database::{DatabaseConfig, DEFAULT_DATABASE_URL};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

/// Everything the server binary needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub static_dir: PathBuf,
    pub debug_endpoints: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = current_environment(&lookup);

        let host_value = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let host = host_value
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "HOST",
                value: host_value.clone(),
            })?;

        let port_value = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port_value
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: port_value.clone(),
            })?;

        let static_dir = lookup("STATIC_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| "public".to_string());

        let debug_endpoints =
            !environment.is_production() || env_flag_enabled(&lookup, "ENABLE_DEBUG_ENDPOINTS");

        Ok(AppConfig {
            environment,
            server: ServerConfig { host, port },
            database: DatabaseConfig::from_lookup(&lookup, environment),
            static_dir: PathBuf::from(static_dir),
            debug_endpoints,
        })
    }
}

pub(crate) fn current_environment<F>(lookup: &F) -> Environment
where
    F: Fn(&str) -> Option<String>,
{
    lookup("ENVIRONMENT")
        .map(|value| Environment::parse(&value))
        .unwrap_or(Environment::Development)
}

fn env_flag_enabled<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(config.debug_endpoints);
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
    }

    #[test]
    fn production_disables_debug_endpoints_unless_forced() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("ENVIRONMENT", "production")])).unwrap();
        assert!(config.environment.is_production());
        assert!(!config.debug_endpoints);

        let forced = AppConfig::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "production"),
            ("ENABLE_DEBUG_ENDPOINTS", "true"),
        ]))
        .unwrap();
        assert!(forced.debug_endpoints);
    }

    #[test]
    fn environment_parsing_is_lenient() {
        assert_eq!(Environment::parse("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::parse("test"), Environment::Test);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }
}
