//! Application configuration.
//!
//! Loaded from YAML files and `CALLCOUNT__`-prefixed environment variables:
//!
//! ```yaml
//! dispatch:
//!   mode: async            # async | sync
//!   channel_capacity: 4096 # omit for an unbounded queue
//! log_invocations: false
//! ```

mod dispatch;

pub use dispatch::{DispatchConfig, DispatchMode};

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "callcount.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CALLCOUNT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "CALLCOUNT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "CALLCOUNT_LOG";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How call events travel from instrumented operations to the counter.
    pub dispatch: DispatchConfig,
    /// Also log every call event.
    pub log_invocations: bool,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `callcount.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that deserialize but cannot be honored.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.channel_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "dispatch.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create config for testing: synchronous dispatch, no extra logging.
    pub fn for_test() -> Self {
        Self {
            dispatch: DispatchConfig {
                mode: DispatchMode::Sync,
                channel_capacity: None,
            },
            log_invocations: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.dispatch.mode, DispatchMode::Async);
        assert_eq!(config.dispatch.channel_capacity, None);
        assert!(!config.log_invocations);
    }

    #[test]
    fn test_config_for_test() {
        assert_eq!(Config::for_test().dispatch.mode, DispatchMode::Sync);
    }

    #[test]
    #[serial]
    fn test_load_without_sources_gives_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let file = yaml_file(
            "dispatch:\n  mode: sync\n  channel_capacity: 64\nlog_invocations: true\n",
        );

        let config = Config::load(file.path().to_str()).unwrap();

        assert_eq!(config.dispatch.mode, DispatchMode::Sync);
        assert_eq!(config.dispatch.channel_capacity, Some(64));
        assert!(config.log_invocations);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some("/nonexistent/callcount-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    #[serial]
    fn test_zero_channel_capacity_rejected() {
        let file = yaml_file("dispatch:\n  channel_capacity: 0\n");

        let result = Config::load(file.path().to_str());

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = yaml_file("dispatch:\n  mode: async\n");
        std::env::set_var("CALLCOUNT__DISPATCH__MODE", "sync");
        std::env::set_var("CALLCOUNT__DISPATCH__CHANNEL_CAPACITY", "8");

        let config = Config::load(file.path().to_str());

        std::env::remove_var("CALLCOUNT__DISPATCH__MODE");
        std::env::remove_var("CALLCOUNT__DISPATCH__CHANNEL_CAPACITY");

        let config = config.unwrap();
        assert_eq!(config.dispatch.mode, DispatchMode::Sync);
        assert_eq!(config.dispatch.channel_capacity, Some(8));
    }
}
