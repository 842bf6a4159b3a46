//! Logging configuration parsing from environment variables.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub log_format: LogFormat,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Self {
        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        };
        Self { log_format }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observability_config_defaults() {
        let config = ObservabilityEnvConfig::default();
        assert_eq!(config.log_format, LogFormat::Compact);
    }
}
