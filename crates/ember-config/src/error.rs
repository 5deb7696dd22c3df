//! Errors raised while loading, validating, or persisting `config.ron`.

use std::path::PathBuf;

/// Everything that can go wrong with the on-disk configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed to open.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config directory or file could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        /// File or directory that failed to write.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// RON syntax or schema error.
    #[error("malformed config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The config could not be turned into RON.
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] ron::Error),

    /// A value parsed fine but is outside its legal range.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human-readable constraint.
        reason: String,
    },
}
