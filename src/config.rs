//! Runtime configuration read from the environment.
//!
//! Only the process plumbing is configurable.  The capability catalog
//! and the route rules are compiled in.

use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_FILE: &str = "data/fixtures.json";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `PERSONNEL_BIND_ADDR`
    pub bind_addr: String,
    /// `PERSONNEL_DATA_FILE`, the JSON fixtures backing sessions and records.
    pub data_file: PathBuf,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.  Empty values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            bind_addr: get("PERSONNEL_BIND_ADDR").unwrap_or(defaults.bind_addr),
            data_file: get("PERSONNEL_DATA_FILE").map(PathBuf::from).unwrap_or(defaults.data_file),
            log_filter: get("PERSONNEL_LOG").unwrap_or(defaults.log_filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PERSONNEL_BIND_ADDR", "0.0.0.0:8080"),
            ("PERSONNEL_DATA_FILE", "/srv/seed.json"),
            ("PERSONNEL_LOG", ""),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.data_file, PathBuf::from("/srv/seed.json"));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
