// src/config.rs
//
// Runtime configuration, read from the environment with sane defaults.

use std::path::PathBuf;

use crate::domain::HomepageLimits;
use crate::error::{AppError, AppResult};

pub const ENV_DATABASE: &str = "HOMEPAGE_CURATOR_DB";
pub const ENV_POOL_SIZE: &str = "HOMEPAGE_CURATOR_POOL_SIZE";
pub const ENV_BANNER_LIMIT: &str = "HOMEPAGE_CURATOR_BANNER_LIMIT";
pub const ENV_RANKED_LIMIT: &str = "HOMEPAGE_CURATOR_RANKED_LIMIT";
pub const ENV_NEW_LAUNCH_LIMIT: &str = "HOMEPAGE_CURATOR_NEW_LAUNCH_LIMIT";
pub const ENV_LOG: &str = "HOMEPAGE_CURATOR_LOG";

#[derive(Debug, Clone)]
pub struct CurationConfig {
    /// SQLite file backing the story store
    pub database_path: PathBuf,
    pub pool_size: u32,
    pub homepage_limits: HomepageLimits,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: 15,
            homepage_limits: HomepageLimits::default(),
            log_level: "info".to_string(),
        }
    }
}

impl CurationConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATABASE) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(size) = lookup(ENV_POOL_SIZE) {
            config.pool_size = parse_number(ENV_POOL_SIZE, &size)?;
        }
        if let Some(limit) = lookup(ENV_BANNER_LIMIT) {
            config.homepage_limits.banner = parse_number(ENV_BANNER_LIMIT, &limit)?;
        }
        if let Some(limit) = lookup(ENV_RANKED_LIMIT) {
            config.homepage_limits.ranked = parse_number(ENV_RANKED_LIMIT, &limit)?;
        }
        if let Some(limit) = lookup(ENV_NEW_LAUNCH_LIMIT) {
            config.homepage_limits.new_launches = parse_number(ENV_NEW_LAUNCH_LIMIT, &limit)?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            config.log_level = level;
        }

        if config.pool_size == 0 {
            return Err(AppError::Other(format!("{} must be at least 1", ENV_POOL_SIZE)));
        }

        Ok(config)
    }
}

/// {APP_DATA}/homepage-curator/curator.db, or the working directory when
/// the platform has no data directory
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("homepage-curator")
        .join("curator.db")
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Other(format!("Invalid value for {}: {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CurationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.pool_size, 15);
        assert_eq!(config.homepage_limits, HomepageLimits::default());
        assert!(config.database_path.ends_with("homepage-curator/curator.db"));
    }

    #[test]
    fn test_overrides() {
        let config = CurationConfig::from_lookup(lookup(&[
            (ENV_DATABASE, "/tmp/stories.db"),
            (ENV_BANNER_LIMIT, "3"),
            (ENV_LOG, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/stories.db"));
        assert_eq!(config.homepage_limits.banner, 3);
        assert_eq!(config.homepage_limits.ranked, 6);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(CurationConfig::from_lookup(lookup(&[(ENV_POOL_SIZE, "many")])).is_err());
        assert!(CurationConfig::from_lookup(lookup(&[(ENV_POOL_SIZE, "0")])).is_err());
        assert!(CurationConfig::from_lookup(lookup(&[(ENV_RANKED_LIMIT, "-1")])).is_err());
    }
}
