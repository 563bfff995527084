//! Runtime configuration
//!
//! Everything is read from `FOODGRAM_*` environment variables with defaults
//! suitable for a local checkout.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SHOPPING_LIST_TITLE: &str = "Shopping list";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be an integer between 1 and {max}, got {value}")]
    InvalidPageSize {
        var: &'static str,
        value: String,
        max: u32,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub page_size: u32,
    pub shopping_list_title: String,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("FOODGRAM_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let bind_addr = match lookup("FOODGRAM_BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidAddr {
                var: "FOODGRAM_BIND_ADDR",
                value,
            })?,
            None => default_bind_addr(),
        };

        let page_size = match lookup("FOODGRAM_PAGE_SIZE") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
                _ => {
                    return Err(ConfigError::InvalidPageSize {
                        var: "FOODGRAM_PAGE_SIZE",
                        value,
                        max: MAX_PAGE_SIZE,
                    })
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let shopping_list_title = lookup("FOODGRAM_SHOPPING_LIST_TITLE")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SHOPPING_LIST_TITLE.to_string());

        Ok(Self {
            database_path,
            bind_addr,
            page_size,
            shopping_list_title,
        })
    }

    pub fn trace_loaded(&self) {
        info!(
            database_path = %self.database_path.display(),
            bind_addr = %self.bind_addr,
            page_size = self.page_size,
            "Loaded config"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_addr: default_bind_addr(),
            page_size: DEFAULT_PAGE_SIZE,
            shopping_list_title: DEFAULT_SHOPPING_LIST_TITLE.to_string(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

/// `<project>/data/foodgram.db`, located relative to the running executable
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("foodgram.db");
    path
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.shopping_list_title, DEFAULT_SHOPPING_LIST_TITLE);
        assert!(config.database_path.ends_with("data/foodgram.db"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("FOODGRAM_DATABASE_PATH", "/tmp/x.db"),
            ("FOODGRAM_BIND_ADDR", "0.0.0.0:9000"),
            ("FOODGRAM_PAGE_SIZE", "12"),
            ("FOODGRAM_SHOPPING_LIST_TITLE", "Groceries"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.page_size, 12);
        assert_eq!(config.shopping_list_title, "Groceries");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("FOODGRAM_BIND_ADDR", "nowhere")])),
            Err(ConfigError::InvalidAddr { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("FOODGRAM_PAGE_SIZE", "0")])),
            Err(ConfigError::InvalidPageSize { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("FOODGRAM_PAGE_SIZE", "abc")])),
            Err(ConfigError::InvalidPageSize { .. })
        ));
    }
}
