//! # Unpivot - wide to long reshaping of opportunity spreadsheets
//!
//! Turns a table with up to nine repeated column groups
//! (`Category {i}`, `Per Call Price {i}`, `Monthly Flat Fee {i}`, `APF {i}`,
//! `Books {i}`) into one row per (entity, category group).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ CSV / Excel  │────▶│   Parser    │────▶│   Reshape   │────▶│    Export    │
//! │   upload     │     │ (auto-enc)  │     │ (wide→long) │     │ (csv / xlsx) │
//! └──────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unpivot::{reshape_file, ExportFormat};
//!
//! let result = reshape_file("opps.xlsx")?;
//! let csv = ExportFormat::Csv.write(&result.output)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - `Table` and the wide column naming convention
//! - [`parser`] - CSV / Excel loading with auto-detection
//! - [`transform`] - Reshape engine and pipeline
//! - [`validation`] - Schema inspection (column presence)
//! - [`export`] - CSV / XLSX output
//! - [`cache`] - Upload memoization and download jobs
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Loading
pub mod parser;

// Transformation
pub mod transform;

// Schema inspection
pub mod validation;

// Output
pub mod export;

// Caching
pub mod cache;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ExportError, LoadError, PipelineError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    display_value, is_blank, normalized_columns, wide_column_names, ColumnFamily, Table,
    CATEGORY_VALUE_COLUMN, MAX_GROUPS, SOURCE_CATEGORY_COLUMN,
};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_bytes, load_file, LoadedTable,
    SourceFormat,
};

// =============================================================================
// Re-exports - Reshape
// =============================================================================

pub use transform::reshape::{present_groups, reshape};

pub use transform::pipeline::{
    reshape_bytes, reshape_file, reshape_loaded, PipelineResult, SourceInfo,
};

// =============================================================================
// Re-exports - Inspection / Export
// =============================================================================

pub use validation::{inspect_schema, GroupReport, SchemaReport};

pub use export::{output_file_name, to_csv_bytes, to_xlsx_bytes, ExportFormat};

// =============================================================================
// Re-exports - Cache / Config / API
// =============================================================================

pub use cache::{content_key, JobStore, ResultCache};

pub use config::ServerConfig;

pub use api::types::{error_response, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::{build_router, start_server, AppState};
}
