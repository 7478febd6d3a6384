//! Error types for the Unpivot pipeline.
//!
//! One enum per layer:
//!
//! - [`LoadError`] - reading CSV / Excel uploads into a table
//! - [`ExportError`] - writing the reshaped table back out
//! - [`ConfigError`] - invalid environment configuration
//! - [`PipelineError`] - load + reshape orchestration
//! - [`ServerError`] - HTTP layer
//!
//! The reshape engine itself never fails: missing columns are data, and the
//! "nothing to reshape" case is an empty table that the pipeline turns into
//! [`PipelineError::NoCategoryColumns`] or [`PipelineError::AllCategoriesBlank`].

use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while turning an uploaded file into a [`crate::models::Table`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The file extension is not one we know how to load.
    #[error("Unsupported file type '{0}'. Please upload .csv, .xlsx, or .xls")]
    UnsupportedFormat(String),

    /// The file has no bytes at all.
    #[error("File is empty")]
    EmptyFile,

    /// No header row could be read.
    #[error("No header row found")]
    NoHeaders,

    /// Malformed CSV.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// The workbook could not be opened or read.
    #[error("Cannot read workbook: {0}")]
    Workbook(String),

    /// The workbook has no worksheet.
    #[error("Workbook has no worksheet")]
    NoWorksheet,
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        LoadError::Csv {
            line,
            message: err.to_string(),
        }
    }
}

impl From<calamine::Error> for LoadError {
    fn from(err: calamine::Error) -> Self {
        LoadError::Workbook(err.to_string())
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing the reshaped table.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failure.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// XLSX writer failure.
    #[error("Excel export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// The table is larger than a worksheet can hold.
    #[error("Table too large for a worksheet: {0}")]
    TooLarge(String),

    /// Unknown export format name.
    #[error("Unknown export format '{0}' (expected 'csv' or 'xlsx')")]
    UnknownFormat(String),

    /// IO error while flushing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Load + reshape orchestration errors.
///
/// Returned by [`crate::transform::pipeline::reshape_bytes`] and
/// [`crate::transform::pipeline::reshape_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload could not be loaded.
    #[error("{0}")]
    Load(#[from] LoadError),

    /// The input has none of `Category 1`..`Category 9`.
    #[error("No 'Category 1'...'Category 9' columns were found in this file")]
    NoCategoryColumns,

    /// Category columns exist but every category value is blank.
    #[error("Found {groups} category column(s) but every category value is blank")]
    AllCategoriesBlank { groups: usize },
}

impl PipelineError {
    /// True when the file loaded fine but holds nothing to reshape.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            PipelineError::NoCategoryColumns | PipelineError::AllCategoriesBlank { .. }
        )
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Export error.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown job id.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Socket / runtime failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // LoadError -> PipelineError -> ServerError
        let load_err = LoadError::UnsupportedFormat("report.pdf".into());
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("report.pdf"));
        assert!(!pipeline_err.is_no_data());

        let server_err: ServerError = pipeline_err.into();
        assert!(server_err.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_no_data_errors() {
        assert!(PipelineError::NoCategoryColumns.is_no_data());
        let err = PipelineError::AllCategoriesBlank { groups: 3 };
        assert!(err.is_no_data());
        assert!(err.to_string().contains("3 category"));
    }

    #[test]
    fn test_config_error_format() {
        let err = ConfigError::InvalidValue {
            key: "UNPIVOT_PORT".into(),
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("UNPIVOT_PORT"));
        assert!(msg.contains("abc"));
    }
}
