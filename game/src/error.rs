use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed encoding config: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("board length {0} is not one of 8, 10, 12, 14, 16")]
    UnsupportedLength(usize),
    #[error("per-length table `{table}` has no entry for length {length}")]
    MissingLength { table: &'static str, length: usize },
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}
