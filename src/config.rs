//! Application configuration loaded once from environment variables.
//!
//! Business constants (point table, weekly threshold, target strategy,
//! ranking mode) are declared here exactly once and injected into the
//! services that need them, never re-declared per call site.

use std::env;

use chrono::Weekday;

use crate::aggregate::{RankingMode, TargetStrategy};
use crate::points::PointTable;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- External source (Asana) ---
    /// Personal access token for the Asana API. Absence is not fatal at
    /// startup; a sync run without it fails with a config error.
    pub asana_access_token: Option<String>,
    /// Asana project whose tasks are synced.
    pub asana_project_id: Option<String>,
    /// Tasks fetched per page.
    pub sync_page_size: u32,
    /// Hard stop on the pagination loop. A source that keeps returning
    /// continuation tokens past this bound aborts the sync.
    pub sync_max_pages: u32,
    /// Network timeout for Asana requests, in seconds.
    pub asana_timeout_secs: u64,

    // --- Server / infrastructure ---
    /// GCP project ID (Firestore).
    pub gcp_project_id: String,
    /// Frontend URL for CORS.
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Scoring and aggregation ---
    /// Category code -> point weight table.
    pub point_table: PointTable,
    /// Weekly point bar a member must reach for a week to count as achieved.
    pub weekly_threshold: f64,
    /// Fallback per-member weekly target when no explicit target is set.
    pub default_weekly_target: f64,
    /// Weekday on which dashboard weeks begin.
    pub week_starts_on: Weekday,
    /// Default team-target computation strategy.
    pub target_strategy: TargetStrategy,
    /// Default leaderboard ranking mode.
    pub ranking: RankingMode,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            asana_access_token: Some("test_token".to_string()),
            asana_project_id: Some("1200000000000000".to_string()),
            sync_page_size: 100,
            sync_max_pages: 200,
            asana_timeout_secs: 30,
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            point_table: PointTable::default(),
            weekly_threshold: 160.0,
            default_weekly_target: 160.0,
            week_starts_on: Weekday::Mon,
            target_strategy: TargetStrategy::Sum,
            ranking: RankingMode::Weeks,
        }
    }
}

impl Config {
    /// Constants the pure aggregator depends on.
    pub fn aggregate_config(&self) -> crate::aggregate::AggregateConfig {
        crate::aggregate::AggregateConfig {
            weekly_threshold: self.weekly_threshold,
            default_weekly_target: self.default_weekly_target,
            week_starts_on: self.week_starts_on,
            target_strategy: self.target_strategy,
            ranking: self.ranking,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let point_table = match env::var("POINT_TABLE") {
            Ok(json) => PointTable::from_json(&json)
                .map_err(|e| ConfigError::Invalid("POINT_TABLE", e.to_string()))?,
            Err(_) => PointTable::default(),
        };

        Ok(Self {
            asana_access_token: env::var("ASANA_ACCESS_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            asana_project_id: env::var("ASANA_PROJECT_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            sync_page_size: parse_or("SYNC_PAGE_SIZE", 100)?,
            sync_max_pages: parse_or("SYNC_MAX_PAGES", 200)?,
            asana_timeout_secs: parse_or("ASANA_TIMEOUT_SECS", 30)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: parse_or("PORT", 8080)?,
            point_table,
            weekly_threshold: parse_or("WEEKLY_THRESHOLD", 160.0)?,
            default_weekly_target: parse_or("DEFAULT_WEEKLY_TARGET", 160.0)?,
            week_starts_on: match env::var("WEEK_STARTS_ON") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid("WEEK_STARTS_ON", raw))?,
                Err(_) => Weekday::Mon,
            },
            target_strategy: match env::var("TARGET_STRATEGY").as_deref() {
                Ok("sum") | Err(_) => TargetStrategy::Sum,
                Ok("constant") => TargetStrategy::Constant,
                Ok(other) => {
                    return Err(ConfigError::Invalid("TARGET_STRATEGY", other.to_string()))
                }
            },
            ranking: match env::var("RANKING_MODE").as_deref() {
                Ok("weeks") | Err(_) => RankingMode::Weeks,
                Ok("percent") => RankingMode::Percent,
                Ok(other) => return Err(ConfigError::Invalid("RANKING_MODE", other.to_string())),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sync_page_size, 100);
        assert_eq!(config.weekly_threshold, 160.0);
        assert_eq!(config.week_starts_on, Weekday::Mon);
        assert_eq!(config.target_strategy, TargetStrategy::Sum);
        assert_eq!(config.point_table.weight("S4"), Some(5.0));
    }

    #[test]
    fn test_from_env_without_credentials() {
        // Credentials are optional at startup; the sync run reports the
        // config error instead.
        env::remove_var("ASANA_ACCESS_TOKEN");
        env::remove_var("ASANA_PROJECT_ID");

        let config = Config::from_env().expect("Config should load");
        assert!(config.asana_access_token.is_none());
        assert!(config.asana_project_id.is_none());
        assert_eq!(config.port, 8080);
    }
}
