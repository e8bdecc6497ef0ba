use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading or writing the settings file and data folders.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("saving settings is disabled for this session")]
    SaveDisabled,
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Rejections from the dotted-path switch registry. A rejected switch never
/// modifies the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("malformed switch '{0}', expected key=value")]
    Malformed(String),

    #[error("unknown setting '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("value {value} for {key} is outside [{min} - {max}]")]
    OutOfRange {
        key: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("value '{value}' is not allowed for {key}")]
    NotAllowed { key: String, value: String },
}

/// Problems with individual launch arguments. Collected and reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid argument {arg}: {source}")]
    InvalidArgument {
        arg: String,
        #[source]
        source: SwitchError,
    },
}
