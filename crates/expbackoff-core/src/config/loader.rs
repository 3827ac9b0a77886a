//! Configuration loader with precedence
//!
//! Loads retry configuration from multiple sources with the following
//! precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (~/.expbackoff/config.yaml, or an explicit path)
//! 3. Environment variables (EXPBACKOFF_* prefix, default policy only)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::str::FromStr;

/// Overrides `default.max-retries`
pub const ENV_MAX_RETRIES: &str = "EXPBACKOFF_MAX_RETRIES";
/// Overrides `default.base-delay-ms`
pub const ENV_BASE_DELAY_MS: &str = "EXPBACKOFF_BASE_DELAY_MS";
/// Overrides `default.backoff-factor`
pub const ENV_BACKOFF_FACTOR: &str = "EXPBACKOFF_BACKOFF_FACTOR";
/// Overrides `default.trailing-delay`
pub const ENV_TRAILING_DELAY: &str = "EXPBACKOFF_TRAILING_DELAY";

/// Retry configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Path of the YAML config file
    config_path: Utf8PathBuf,
    /// Whether a missing file is an error
    required: bool,
}

impl ConfigLoader {
    /// Create a loader for the standard config file (~/.expbackoff/config.yaml)
    ///
    /// The file is optional; defaults apply when it does not exist.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home).map_err(|p| {
            Error::invalid_config(format!("Home directory is not UTF-8: {}", p.display()))
        })?;

        Ok(Self {
            config_path: home.join(".expbackoff").join("config.yaml"),
            required: false,
        })
    }

    /// Create a loader for an explicit config file, which must exist
    pub fn with_file(config_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            required: true,
        }
    }

    /// Path the loader reads from
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    /// Load retry configuration with precedence applied
    pub fn load(&self) -> Result<RetryConfig> {
        let mut config = if self.config_path.exists() {
            tracing::debug!(path = %self.config_path, "loading retry configuration");
            self.load_yaml_file(&self.config_path)?
        } else if self.required {
            return Err(Error::config_not_found(self.config_path.as_str()));
        } else {
            RetryConfig::default()
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file(&self, path: &Utf8Path) -> Result<RetryConfig> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(RetryConfig::default());
        }
        let config: RetryConfig = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Apply environment variable overrides to the default policy
    fn apply_env_overrides(config: &mut RetryConfig) -> Result<()> {
        if let Some(val) = env_override(ENV_MAX_RETRIES)? {
            config.default.max_retries = val;
        }

        if let Some(val) = env_override(ENV_BASE_DELAY_MS)? {
            config.default.base_delay_ms = val;
        }

        if let Some(val) = env_override(ENV_BACKOFF_FACTOR)? {
            config.default.backoff_factor = val;
        }

        if let Some(val) = env_override(ENV_TRAILING_DELAY)? {
            config.default.trailing_delay = val;
        }

        Ok(())
    }
}

/// Read and parse an environment variable, if set
fn env_override<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} has an invalid value: {}", name, val))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ALL_VARS: [&str; 4] = [
        ENV_MAX_RETRIES,
        ENV_BASE_DELAY_MS,
        ENV_BACKOFF_FACTOR,
        ENV_TRAILING_DELAY,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn loader_for(file: &NamedTempFile) -> ConfigLoader {
        ConfigLoader::with_file(Utf8PathBuf::from_path_buf(file.path().to_path_buf()).unwrap())
    }

    #[test]
    #[serial]
    fn test_load_file_with_operations() {
        clear_env();
        let file = write_config(
            r#"
default:
  max-retries: 5
  base-delay-ms: 100
  backoff-factor: 1.5
operations:
  health-check:
    max-retries: 10
    base-delay-ms: 250
    trailing-delay: true
"#,
        );

        let config = loader_for(&file).load().unwrap();

        assert_eq!(config.default.max_retries, 5);
        assert_eq!(config.default.backoff_factor, 1.5);
        let health = config.policy_for("health-check");
        assert_eq!(health.max_retries, 10);
        assert_eq!(health.base_delay_ms, 250);
        assert_eq!(health.backoff_factor, 2.0);
        assert!(health.trailing_delay);
    }

    #[test]
    #[serial]
    fn test_missing_optional_file_uses_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader {
            config_path: Utf8PathBuf::from_path_buf(dir.path().join("absent.yaml")).unwrap(),
            required: false,
        };

        assert_eq!(loader.load().unwrap(), RetryConfig::default());
    }

    #[test]
    #[serial]
    fn test_missing_required_file_is_error() {
        clear_env();
        let loader = ConfigLoader::with_file("/nonexistent/expbackoff.yaml");

        let err = loader.load().unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_empty_file_uses_defaults() {
        clear_env();
        let file = write_config("\n");

        assert_eq!(loader_for(&file).load().unwrap(), RetryConfig::default());
    }

    #[test]
    #[serial]
    fn test_malformed_yaml_is_invalid_config() {
        clear_env();
        let file = write_config("default: [not, a, policy]\n");

        let err = loader_for(&file).load().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let file = write_config("default:\n  max-retries: 5\n  backoff-factor: 1.5\n");
        env::set_var(ENV_MAX_RETRIES, "8");
        env::set_var(ENV_BASE_DELAY_MS, "20");
        env::set_var(ENV_TRAILING_DELAY, "true");

        let config = loader_for(&file).load();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.default.max_retries, 8);
        assert_eq!(config.default.base_delay_ms, 20);
        assert_eq!(config.default.backoff_factor, 1.5);
        assert!(config.default.trailing_delay);
    }

    #[test]
    #[serial]
    fn test_env_invalid_number_is_error() {
        clear_env();
        let file = write_config("");
        env::set_var(ENV_MAX_RETRIES, "many");

        let result = loader_for(&file).load();
        clear_env();

        let err = result.unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_RETRIES));
    }

    #[test]
    #[serial]
    fn test_env_invalid_factor_fails_validation() {
        clear_env();
        let file = write_config("");
        env::set_var(ENV_BACKOFF_FACTOR, "-3");

        let result = loader_for(&file).load();
        clear_env();

        assert!(matches!(result.unwrap_err(), Error::InvalidPolicy { .. }));
    }
}
