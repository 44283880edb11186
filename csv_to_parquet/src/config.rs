use std::env;

use crate::keys::{
    PathMapping, DEFAULT_CLEAN_SEGMENT, DEFAULT_ERROR_PREFIX, DEFAULT_LANDING_SEGMENT,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("environment variable {0} must be set")]
    MissingVar(&'static str),
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Process-wide settings, read once at cold start.
#[derive(Debug, Clone)]
pub(crate) struct IngestConfig {
    /// Receives both the Parquet output and the quarantined rows.
    pub clean_bucket: String,
    pub paths: PathMapping,
}

impl IngestConfig {
    /// Reads `CLEAN_BUCKET` (required) plus the optional `LANDING_SEGMENT`,
    /// `CLEAN_SEGMENT` and `ERROR_PREFIX` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let clean_bucket = env_opt("CLEAN_BUCKET").ok_or(ConfigError::MissingVar("CLEAN_BUCKET"))?;
        Ok(Self {
            clean_bucket,
            paths: PathMapping {
                landing_segment: env_or("LANDING_SEGMENT", DEFAULT_LANDING_SEGMENT),
                clean_segment: env_or("CLEAN_SEGMENT", DEFAULT_CLEAN_SEGMENT),
                error_prefix: env_or("ERROR_PREFIX", DEFAULT_ERROR_PREFIX),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-based tests must run serially.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for k in ["CLEAN_BUCKET", "LANDING_SEGMENT", "CLEAN_SEGMENT", "ERROR_PREFIX"] {
            env::remove_var(k);
        }
    }

    #[test]
    fn missing_bucket_is_an_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();

        let err = IngestConfig::from_env().unwrap_err();
        assert_eq!(err.to_string(), "environment variable CLEAN_BUCKET must be set");
    }

    #[test]
    fn empty_bucket_counts_as_missing() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("CLEAN_BUCKET", "");

        assert!(IngestConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn defaults_for_path_mapping() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("CLEAN_BUCKET", "clean-bucket");

        let cfg = IngestConfig::from_env().unwrap();
        assert_eq!(cfg.clean_bucket, "clean-bucket");
        assert_eq!(cfg.paths, PathMapping::default());

        clear_env();
    }

    #[test]
    fn overrides_path_mapping() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("CLEAN_BUCKET", "clean-bucket");
        env::set_var("LANDING_SEGMENT", "raw/");
        env::set_var("ERROR_PREFIX", "quarantine");

        let cfg = IngestConfig::from_env().unwrap();
        assert_eq!(cfg.paths.landing_segment, "raw/");
        assert_eq!(cfg.paths.clean_segment, DEFAULT_CLEAN_SEGMENT);
        assert_eq!(cfg.paths.error_prefix, "quarantine");

        clear_env();
    }
}
