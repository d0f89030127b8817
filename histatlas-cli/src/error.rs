//! CLI error type.

use std::fmt;

use histatlas::config::ConfigError;
use histatlas::fetch::FetchError;
use histatlas::loader::LoadError;
use histatlas::logging::LoggingError;
use histatlas::period::PeriodError;

/// Everything that can make a command fail.
#[derive(Debug)]
pub enum CliError {
    /// Missing or invalid configuration.
    Config(String),
    /// The period table could not be built.
    Periods(PeriodError),
    /// The fetch channel could not be built.
    Channel(FetchError),
    /// A load failed.
    Load(LoadError),
    Logging(LoggingError),
    /// The async runtime could not be started.
    Runtime(std::io::Error),
    /// Arguments that clap cannot validate on its own.
    InvalidArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Periods(e) => write!(f, "Period table error: {}", e),
            CliError::Channel(e) => write!(f, "Failed to set up fetching: {}", e),
            CliError::Load(e) => write!(f, "Load failed: {}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Periods(e) => Some(e),
            CliError::Channel(e) => Some(e),
            CliError::Load(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Config(_) | CliError::InvalidArgument(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<PeriodError> for CliError {
    fn from(e: PeriodError) -> Self {
        CliError::Periods(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Channel(e)
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        CliError::Load(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err: CliError = LoadError::UnknownPeriod {
            ordinal: 40,
            count: 12,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Load failed: unknown period 40 (table has 12 periods)"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::MissingValue {
            section: "data".to_string(),
            key: "base_url".to_string(),
        }
        .into();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: data.base_url is not set"
        );
    }
}
