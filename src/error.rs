//! Error types for pomo.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the flat-file store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("encoding {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("decoding {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// True when the underlying failure is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Failures loading the user configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to determine home directory")]
    NoHomeDirectory,

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid duration for {key}: {value:?}")]
    InvalidDuration { key: &'static str, value: String },
}

/// Failures delivering a timer alert.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("desktop notification failed: {0}")]
    Desktop(#[from] notify_rust::error::Error),

    #[error("terminal bell failed: {0}")]
    Bell(#[from] io::Error),
}

/// Failures driving the interactive program.
#[derive(Error, Debug)]
pub enum PomoError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected() {
        let err = StoreError::io(
            "opening",
            "/tmp/nope.json",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "opening /tmp/nope.json: missing");
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidDuration {
            key: "pomodoro",
            value: "soon".into(),
        };
        assert_eq!(err.to_string(), "invalid duration for pomodoro: \"soon\"");
    }
}
