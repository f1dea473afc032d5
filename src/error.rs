//! Error types
//!
//! The simulator itself never fails at runtime: broken invariants panic and
//! expected absences are `Option`. Errors only come from loading settings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Reading a configuration file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration text was not valid JSON for the expected shape
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field parsed but holds an unusable value
    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
