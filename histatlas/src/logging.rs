//! Tracing subscriber setup.
//!
//! Log lines go to stderr and, optionally, to a file through a non-blocking
//! writer. The level comes from `RUST_LOG` when set, otherwise from the
//! caller's default.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Level used when neither `RUST_LOG` nor the caller says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log file path has no file name: {0}")]
    FileName(PathBuf),

    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

/// Install the global subscriber.
///
/// Returns the guard of the file writer when `log_file` is given; logs still
/// buffered are flushed when it is dropped, so keep it alive until exit.
pub fn init_logging(
    default_level: &str,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(default_level)?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::new(Rfc3339))
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    if let Some(path) = log_file {
        info!(path = %path.display(), "Logging to file");
    }
    Ok(guard)
}

fn build_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(default_level).map_err(|e| LoggingError::Filter {
            filter: default_level.to_string(),
            reason: e.to_string(),
        })
    })
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::FileName(path.to_path_buf()))?;

    std::fs::create_dir_all(&directory).map_err(|source| LoggingError::Directory {
        path: directory.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(&directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_default_filter() {
        // Only meaningful when RUST_LOG does not override the default.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = build_filter("info,=[");
        assert!(matches!(result, Err(LoggingError::Filter { .. })));
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("histatlas.log");

        let (_writer, _guard) = file_writer(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_file_writer_rejects_directory_path() {
        let result = file_writer(Path::new("/"));
        assert!(matches!(result, Err(LoggingError::FileName(_))));
    }
}
