//! Crate-level configuration assembled from the environment.

use serde::{Deserialize, Serialize};

use crate::file::FileValidatorConfig;
use crate::output::OutputSanitizerConfig;
use crate::rate_limit::RateLimiterConfig;
use crate::sql::SqlValidatorConfig;

/// Top-level configuration covering all four validators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    pub sql: SqlValidatorConfig,
    pub file: FileValidatorConfig,
    pub output: OutputSanitizerConfig,
    pub rate_limit: RateLimiterConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `SHEETGUARD_*` environment variables,
    /// falling back to the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            sql: SqlValidatorConfig {
                strict_mode: env_parse("SHEETGUARD_SQL_STRICT", defaults.sql.strict_mode),
                allow_comments: env_parse(
                    "SHEETGUARD_SQL_ALLOW_COMMENTS",
                    defaults.sql.allow_comments,
                ),
            },
            file: FileValidatorConfig {
                max_size: env_parse("SHEETGUARD_MAX_FILE_SIZE", defaults.file.max_size),
            },
            output: OutputSanitizerConfig {
                max_rows: env_parse("SHEETGUARD_MAX_ROWS", defaults.output.max_rows),
                max_cell_length: env_parse(
                    "SHEETGUARD_MAX_CELL_LENGTH",
                    defaults.output.max_cell_length,
                ),
            },
            rate_limit: RateLimiterConfig::new()
                .with_fail_open(env_parse("SHEETGUARD_FAIL_OPEN", true)),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.file.max_size == 0 {
            return Err("SHEETGUARD_MAX_FILE_SIZE must be greater than zero".to_string());
        }

        if self.output.max_rows == 0 {
            return Err("SHEETGUARD_MAX_ROWS must be greater than zero".to_string());
        }

        if self.output.max_cell_length == 0 {
            return Err("SHEETGUARD_MAX_CELL_LENGTH must be greater than zero".to_string());
        }

        if self.rate_limit.quotas.is_empty() {
            return Err("rate limit quota table cannot be empty".to_string());
        }

        for (role, quota) in &self.rate_limit.quotas {
            if quota.max_actions == 0 {
                return Err(format!("quota for role '{role}' must allow at least 1 action"));
            }
            if quota.window_minutes < 1 {
                return Err(format!(
                    "quota window for role '{role}' must be at least 1 minute"
                ));
            }
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
