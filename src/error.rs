use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading a marker schema
#[derive(Debug, Error)]
pub enum MarkerTableError {
    #[error("failed to read marker schema {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse marker schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid marker row '{token}': {reason}")]
    InvalidRow { token: String, reason: String },
}

/// Failures while reading paragraph records
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading paragraphs: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid paragraph record at line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while encoding entries for output
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encoding failed: {0}")]
    Xml(String),

    #[error("error writing output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    MarkerTable(#[from] MarkerTableError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("error writing {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("worker thread panicked while parsing {path:?}")]
    WorkerPanicked { path: PathBuf },
}
