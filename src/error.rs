use std::path::PathBuf;
use thiserror::Error;

/// Error type for a single benchmark run.
///
/// Every variant is fatal: the tool generates one report per process
/// lifetime and prefers no report over a possibly-wrong one.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Requested benchmark binary is missing on disk
    #[error("benchmark binary not found at: {0}")]
    Configuration(PathBuf),

    /// Benchmark process returned a non-zero exit status
    #[error("benchmark exited with status {status}: {stderr}")]
    ProcessExecution { status: i32, stderr: String },

    /// A data row token could not be coerced to its column type
    #[error("row {row}: cannot coerce `{token}` for column `{column}`")]
    TypeCoercion {
        row: usize,
        column: &'static str,
        token: String,
    },

    /// The benchmark printed no parseable data rows
    #[error("no data rows parsed from benchmark output")]
    NoData,

    /// I/O errors from output-directory and file handling
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DataFrame construction or CSV serialization errors
    #[error("table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),

    /// Chart rendering errors
    #[error("chart error: {0}")]
    Chart(String),
}
