//! Output sinks for scraped datasets
//!
//! The primary sink is CSV; checkpoints reuse the same writer under a
//! derived file name.

mod csv_output;

pub use csv_output::CsvExporter;

use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type ExportResult<T> = Result<T, ExportError>;
