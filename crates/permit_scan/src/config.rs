use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;

use crate::scan_types::ScanError;

/// Where the known availability snapshot lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL table addressed by `table_name`
    Postgres,
    /// Process-local map, lost on exit
    Memory,
}

/// Settings for the permit check, gathered once at startup
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Numeric site identifier of the listing (Kauai state parks are 1692)
    pub site_id: u32,

    /// First day of the lookahead window; `None` means the current date in Hawaii
    pub start_date: Option<NaiveDate>,

    /// Number of days searched per check
    pub days_to_search: usize,

    /// Campsite row to watch (exact match on the first cell)
    pub campsite_name: String,

    /// Trail name used in the alert text
    pub trail_name: String,

    /// Known-state table identifier
    pub table_name: String,

    /// Listing host, overridable for tests
    pub source_base_url: String,

    /// Prefix applied to the four secret names
    pub secret_prefix: String,

    /// Database connection string for the postgres store
    pub database_url: String,

    /// Known-state backend
    pub store_backend: StoreBackend,

    /// Log alerts instead of sending them
    pub dry_run: bool,

    /// Scheduling settings
    pub schedule: ScheduleConfig,
}

/// How the watcher drives checks
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Time between check starts (default: 60 seconds)
    pub check_interval: Duration,

    /// Wall-clock bound on a single check (default: 50 seconds)
    pub check_timeout: Duration,

    /// Run a single check and exit
    pub run_once: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            check_timeout: Duration::from_secs(50),
            run_once: false,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            site_id: 1692,
            start_date: None,
            days_to_search: 5,
            campsite_name: "Kalalau".to_string(),
            trail_name: "Napali".to_string(),
            table_name: "napali_known_availability".to_string(),
            source_base_url: "https://camping.ehawaii.gov".to_string(),
            secret_prefix: "napali_".to_string(),
            database_url: "postgres://localhost/napali_permits".to_string(),
            store_backend: StoreBackend::Postgres,
            dry_run: false,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl WatcherConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let start_date = match var("START_DATE") {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y%m%d").map_err(|e| {
                ScanError::Configuration(format!("START_DATE must be YYYYMMDD, got {raw}: {e}"))
            })?),
            None => None,
        };

        let days_to_search = parse_or(
            var("DAYS_TO_SEARCH"),
            "DAYS_TO_SEARCH",
            defaults.days_to_search,
        )?;
        if days_to_search == 0 {
            return Err(ScanError::Configuration(
                "DAYS_TO_SEARCH must be at least 1".to_string(),
            ));
        }

        let store_backend = match var("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ScanError::Configuration(format!(
                    "STORE_BACKEND must be 'postgres' or 'memory', got {other}"
                )));
            }
        };

        let check_interval = Duration::from_secs(parse_or(
            var("CHECK_INTERVAL_SECS"),
            "CHECK_INTERVAL_SECS",
            defaults.schedule.check_interval.as_secs(),
        )?);
        let check_timeout = Duration::from_secs(parse_or(
            var("CHECK_TIMEOUT_SECS"),
            "CHECK_TIMEOUT_SECS",
            defaults.schedule.check_timeout.as_secs(),
        )?);
        if check_interval.is_zero() || check_timeout.is_zero() {
            return Err(ScanError::Configuration(
                "CHECK_INTERVAL_SECS and CHECK_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            site_id: parse_or(var("SITE_ID"), "SITE_ID", defaults.site_id)?,
            start_date,
            days_to_search,
            campsite_name: var("CAMPSITE_NAME").unwrap_or(defaults.campsite_name),
            trail_name: var("TRAIL_NAME").unwrap_or(defaults.trail_name),
            table_name: var("KNOWN_INFO_TABLE").unwrap_or(defaults.table_name),
            source_base_url: var("SOURCE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.source_base_url),
            secret_prefix: lookup("SECRET_PREFIX").unwrap_or(defaults.secret_prefix),
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            store_backend,
            dry_run: parse_flag(var("NOTIFY_DRY_RUN"), "NOTIFY_DRY_RUN")?,
            schedule: ScheduleConfig {
                check_interval,
                check_timeout,
                run_once: parse_flag(var("RUN_ONCE"), "RUN_ONCE")?,
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ScanError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| ScanError::Configuration(format!("Invalid {key} '{raw}': {e}"))),
        None => Ok(default),
    }
}

fn parse_flag(raw: Option<String>, key: &str) -> Result<bool, ScanError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(ScanError::Configuration(format!(
            "{key} must be true or false, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<WatcherConfig, ScanError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WatcherConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.site_id, 1692);
        assert_eq!(config.days_to_search, 5);
        assert_eq!(config.campsite_name, "Kalalau");
        assert_eq!(config.start_date, None);
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.secret_prefix, "napali_");
        assert_eq!(config.schedule.check_interval, Duration::from_secs(60));
        assert_eq!(config.schedule.check_timeout, Duration::from_secs(50));
        assert!(!config.dry_run);
        assert!(!config.schedule.run_once);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            ("SITE_ID", "42"),
            ("START_DATE", "20230521"),
            ("DAYS_TO_SEARCH", "7"),
            ("CAMPSITE_NAME", "Hanakoa"),
            ("KNOWN_INFO_TABLE", "permits"),
            ("SOURCE_BASE_URL", "http://localhost:9000/"),
            ("STORE_BACKEND", "memory"),
            ("NOTIFY_DRY_RUN", "true"),
            ("RUN_ONCE", "1"),
        ])
        .unwrap();

        assert_eq!(config.site_id, 42);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2023, 5, 21));
        assert_eq!(config.days_to_search, 7);
        assert_eq!(config.campsite_name, "Hanakoa");
        assert_eq!(config.table_name, "permits");
        assert_eq!(config.source_base_url, "http://localhost:9000");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.dry_run);
        assert!(config.schedule.run_once);
    }

    #[test]
    fn test_empty_secret_prefix_is_allowed() {
        let config = config_from(&[("SECRET_PREFIX", "")]).unwrap();
        assert_eq!(config.secret_prefix, "");
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        for pairs in [
            vec![("START_DATE", "2023-05-21")],
            vec![("DAYS_TO_SEARCH", "0")],
            vec![("DAYS_TO_SEARCH", "five")],
            vec![("STORE_BACKEND", "dynamo")],
            vec![("RUN_ONCE", "maybe")],
            vec![("CHECK_TIMEOUT_SECS", "0")],
        ] {
            let result = config_from(&pairs);
            assert!(
                matches!(result, Err(ScanError::Configuration(_))),
                "expected configuration error for {pairs:?}"
            );
        }
    }
}
