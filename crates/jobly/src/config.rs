//! Application configuration.
//!
//! Read once at startup and passed explicitly to whatever needs it; nothing in
//! jobly reads the environment on its own.

use crate::error::{JoblyError, JoblyResult};
use crate::monitor::MonitorConfig;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "postgresql:///jobly";
const DEFAULT_TEST_DATABASE_URL: &str = "postgresql:///jobly-test";

/// Which environment the process runs in (`JOBLY_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(s: &str) -> JoblyResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(JoblyError::Config(format!("unknown JOBLY_ENV {other:?}"))),
        }
    }
}

/// Configuration for a jobly process.
#[derive(Debug, Clone)]
pub struct JoblyConfig {
    pub environment: Environment,
    pub database_url: String,
    /// Key handed to the token signer.
    pub secret_key: String,
    /// Work factor handed to the password hasher.
    pub bcrypt_work_factor: u32,
    pub pool_max_size: usize,
    pub query_timeout: Option<Duration>,
    pub slow_query_threshold: Option<Duration>,
}

impl Default for JoblyConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            secret_key: String::new(),
            bcrypt_work_factor: 12,
            pool_max_size: 16,
            query_timeout: None,
            slow_query_threshold: None,
        }
    }
}

impl JoblyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> JoblyResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// Keys: `JOBLY_ENV`, `DATABASE_URL`, `TEST_DATABASE_URL`, `SECRET_KEY`,
    /// `BCRYPT_WORK_FACTOR`, `JOBLY_POOL_MAX_SIZE`, `JOBLY_QUERY_TIMEOUT_MS`,
    /// `JOBLY_SLOW_QUERY_MS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<Self> {
        let environment = match lookup("JOBLY_ENV") {
            Some(v) => Environment::parse(&v)?,
            None => Environment::default(),
        };
        let is_test = environment == Environment::Test;

        let database_url = if is_test {
            lookup("TEST_DATABASE_URL").unwrap_or_else(|| DEFAULT_TEST_DATABASE_URL.to_string())
        } else {
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
        };

        let secret_key = match lookup("SECRET_KEY") {
            Some(key) if !key.is_empty() => key,
            _ if environment != Environment::Production => "test".to_string(),
            _ => return Err(JoblyError::Config("SECRET_KEY must be set".to_string())),
        };

        let bcrypt_work_factor = match lookup("BCRYPT_WORK_FACTOR") {
            Some(v) => parse_number("BCRYPT_WORK_FACTOR", &v)?,
            None if is_test => 1,
            None => 12,
        };

        let pool_max_size = match lookup("JOBLY_POOL_MAX_SIZE") {
            Some(v) => parse_number("JOBLY_POOL_MAX_SIZE", &v)?,
            None => 16,
        };

        let query_timeout = lookup("JOBLY_QUERY_TIMEOUT_MS")
            .map(|v| parse_number("JOBLY_QUERY_TIMEOUT_MS", &v).map(Duration::from_millis))
            .transpose()?;
        let slow_query_threshold = lookup("JOBLY_SLOW_QUERY_MS")
            .map(|v| parse_number("JOBLY_SLOW_QUERY_MS", &v).map(Duration::from_millis))
            .transpose()?;

        Ok(Self {
            environment,
            database_url,
            secret_key,
            bcrypt_work_factor,
            pool_max_size,
            query_timeout,
            slow_query_threshold,
        })
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = key.into();
        self
    }

    pub fn bcrypt_work_factor(mut self, factor: u32) -> Self {
        self.bcrypt_work_factor = factor;
        self
    }

    pub fn pool_max_size(mut self, size: usize) -> Self {
        self.pool_max_size = size;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Monitor settings derived from this configuration.
    pub fn monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new();
        if let Some(timeout) = self.query_timeout {
            config = config.with_query_timeout(timeout);
        }
        if let Some(threshold) = self.slow_query_threshold {
            config = config.with_slow_query_threshold(threshold);
        }
        config
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> JoblyResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| JoblyError::Config(format!("{key}={value:?}: {e}")))
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
    fn development_defaults() {
        let config = JoblyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database_url, "postgresql:///jobly");
        assert_eq!(config.secret_key, "test");
        assert_eq!(config.bcrypt_work_factor, 12);
        assert_eq!(config.pool_max_size, 16);
        assert!(config.query_timeout.is_none());
    }

    #[test]
    fn test_environment_uses_test_database_and_cheap_hashing() {
        let config = JoblyConfig::from_lookup(lookup(&[
            ("JOBLY_ENV", "test"),
            ("DATABASE_URL", "postgresql:///ignored"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "postgresql:///jobly-test");
        assert_eq!(config.bcrypt_work_factor, 1);
    }

    #[test]
    fn production_requires_secret_key() {
        let err = JoblyConfig::from_lookup(lookup(&[("JOBLY_ENV", "production")])).unwrap_err();
        assert!(matches!(err, JoblyError::Config(_)));

        let config = JoblyConfig::from_lookup(lookup(&[
            ("JOBLY_ENV", "prod"),
            ("SECRET_KEY", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.secret_key, "s3cret");
    }

    #[test]
    fn numeric_settings_are_parsed() {
        let config = JoblyConfig::from_lookup(lookup(&[
            ("JOBLY_POOL_MAX_SIZE", "4"),
            ("JOBLY_QUERY_TIMEOUT_MS", "2500"),
            ("JOBLY_SLOW_QUERY_MS", "100"),
        ]))
        .unwrap();
        assert_eq!(config.pool_max_size, 4);
        assert_eq!(config.query_timeout, Some(Duration::from_millis(2500)));
        let monitor = config.monitor_config();
        assert_eq!(monitor.slow_query_threshold, Some(Duration::from_millis(100)));

        let err = JoblyConfig::from_lookup(lookup(&[("BCRYPT_WORK_FACTOR", "many")])).unwrap_err();
        assert!(err.to_string().contains("BCRYPT_WORK_FACTOR"));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!(JoblyConfig::from_lookup(lookup(&[("JOBLY_ENV", "staging")])).is_err());
    }
}
