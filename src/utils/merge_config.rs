// src/utils/merge_config.rs
//! Run configuration: environment first, CLI flags layered on top.

use anyhow::{bail, Result};
use log::{debug, info};
use std::env;
use std::path::PathBuf;

use crate::matching::matcher::{DEFAULT_EDIT_THRESHOLD, DEFAULT_TOKEN_THRESHOLD};

pub const DEFAULT_DATA_LAKE_DIR: &str = "datalake/transfermarkt";
pub const DEFAULT_OUTPUT_DIR: &str = "data_output";
pub const DEFAULT_MAX_PLAYERS_PER_FILE: usize = 800;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub data_lake_dir: PathBuf,
    pub output_dir: PathBuf,
    pub token_threshold: f64,
    pub edit_threshold: f64,
    pub max_players_per_file: usize,
    /// JSON file of alias table overrides, keyed by source tag.
    pub alias_table_path: Option<PathBuf>,
    pub dry_run: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            data_lake_dir: PathBuf::from(DEFAULT_DATA_LAKE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            token_threshold: DEFAULT_TOKEN_THRESHOLD,
            edit_threshold: DEFAULT_EDIT_THRESHOLD,
            max_players_per_file: DEFAULT_MAX_PLAYERS_PER_FILE,
            alias_table_path: None,
            dry_run: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl MergeConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            data_lake_dir: env_path("DATA_LAKE_DIR").unwrap_or(defaults.data_lake_dir),
            output_dir: env_path("OUTPUT_DIR").unwrap_or(defaults.output_dir),
            token_threshold: env_parse("TOKEN_MATCH_THRESHOLD", defaults.token_threshold),
            edit_threshold: env_parse("EDIT_MATCH_THRESHOLD", defaults.edit_threshold),
            max_players_per_file: env_parse("MAX_PLAYERS_PER_FILE", defaults.max_players_per_file),
            alias_table_path: env_path("ALIAS_TABLE_PATH"),
            dry_run: false,
        };
        debug!("Merge config from env: {:?}", config);
        config
    }

    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("token threshold", self.token_threshold),
            ("edit threshold", self.edit_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("Invalid {}: {} (expected a value between 0 and 1)", label, value);
            }
        }
        if self.max_players_per_file == 0 {
            bail!("Invalid max players per file: must be at least 1");
        }
        Ok(())
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("⚙️  Merge configuration:");
        info!("   Data lake: {}", self.data_lake_dir.display());
        info!("   Output: {}", self.output_dir.display());
        info!(
            "   Thresholds: token overlap >= {:.2}, edit ratio >= {:.2}",
            self.token_threshold, self.edit_threshold
        );
        info!("   Max players per group file: {}", self.max_players_per_file);
        match &self.alias_table_path {
            Some(path) => info!("   Alias overrides: {}", path.display()),
            None => info!("   Alias overrides: none (built-in tables)"),
        }
        if self.dry_run {
            info!("🧪 Dry run: nothing will be written");
        }
    }
}

/// Environment variable configuration example
pub fn print_env_config_example() {
    println!("# Merge Configuration");
    println!("export DATA_LAKE_DIR={}", DEFAULT_DATA_LAKE_DIR);
    println!("export OUTPUT_DIR={}", DEFAULT_OUTPUT_DIR);
    println!("export TOKEN_MATCH_THRESHOLD={}", DEFAULT_TOKEN_THRESHOLD);
    println!("export EDIT_MATCH_THRESHOLD={}", DEFAULT_EDIT_THRESHOLD);
    println!("export MAX_PLAYERS_PER_FILE={}", DEFAULT_MAX_PLAYERS_PER_FILE);
    println!("# Optional JSON file of alias table overrides");
    println!("export ALIAS_TABLE_PATH=aliases.json");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MergeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.token_threshold, 0.6);
        assert_eq!(config.edit_threshold, 0.78);
        assert_eq!(config.max_players_per_file, 800);
    }

    #[test]
    fn test_env_config() {
        env::set_var("DATA_LAKE_DIR", "/tmp/lake");
        env::set_var("TOKEN_MATCH_THRESHOLD", "0.7");
        env::set_var("EDIT_MATCH_THRESHOLD", "oops");
        env::set_var("MAX_PLAYERS_PER_FILE", "50");
        env::set_var("ALIAS_TABLE_PATH", "  ");

        let config = MergeConfig::from_env();
        assert_eq!(config.data_lake_dir, PathBuf::from("/tmp/lake"));
        assert_eq!(config.token_threshold, 0.7);
        assert_eq!(config.edit_threshold, DEFAULT_EDIT_THRESHOLD);
        assert_eq!(config.max_players_per_file, 50);
        assert_eq!(config.alias_table_path, None);

        env::remove_var("DATA_LAKE_DIR");
        env::remove_var("TOKEN_MATCH_THRESHOLD");
        env::remove_var("EDIT_MATCH_THRESHOLD");
        env::remove_var("MAX_PLAYERS_PER_FILE");
        env::remove_var("ALIAS_TABLE_PATH");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = MergeConfig {
            token_threshold: 1.5,
            ..MergeConfig::default()
        };
        assert!(config.validate().is_err());
        config.token_threshold = 0.6;
        config.edit_threshold = -0.1;
        assert!(config.validate().is_err());
        config.edit_threshold = 0.78;
        config.max_players_per_file = 0;
        assert!(config.validate().is_err());
    }
}
