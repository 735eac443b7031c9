//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Binaries call [`init`]
//! once at startup; `RUST_LOG` takes precedence over the configured level.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Errors initialising logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// The log file path has no file name.
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    /// The log directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Install the global subscriber.
///
/// Logs go to stderr, or to `settings.file` when set. The returned guard must
/// be held for the life of the program when logging to a file; dropping it
/// flushes and stops the background writer.
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    match &settings.file {
        Some(path) => {
            let (directory, file_name) = split_path(path)?;
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
            Ok(None)
        }
    }
}

fn split_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((directory, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_split_path() {
        let path = PathBuf::from("/var/log/locus.log");
        let (dir, name) = split_path(&path).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, "locus.log");

        let bare = PathBuf::from("locus.log");
        let (dir, _) = split_path(&bare).unwrap();
        assert_eq!(dir, Path::new("."));
    }

    // Installs the global subscriber, so it is the only test here that calls `init`.
    #[test]
    fn test_init_writes_to_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("locus.log");
        let settings = LoggingSettings {
            level: "info".to_string(),
            file: Some(path.clone()),
        };

        let guard = init(&settings).unwrap();
        assert!(guard.is_some());
        tracing::error!(request_id = 7u64, "file logging check");
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("file logging check"));
        assert!(contents.contains("request_id=7"));

        assert!(matches!(
            init(&LoggingSettings::default()),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_split_path_rejects_directory_only() {
        assert!(matches!(
            split_path(Path::new("/")),
            Err(LoggingError::InvalidPath(_))
        ));
    }
}
