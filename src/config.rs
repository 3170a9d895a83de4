use std::env;

use anyhow::{Context, Result};
use dotenvy::dotenv;

pub const DEFAULT_DATABASE_URL: &str = "data/hives.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DASHBOARD_ORIGIN: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub dashboard_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dashboard_origin: DEFAULT_DASHBOARD_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Reads the environment, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
            None => defaults.port,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            dashboard_origin: lookup("DASHBOARD_ORIGIN").unwrap_or(defaults.dashboard_origin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "/var/lib/hives.db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DASHBOARD_ORIGIN", "http://hives.local"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "/var/lib/hives.db");
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.dashboard_origin, "http://hives.local");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("PORT", "70000")]).is_err());
    }
}
