//! High-level pipeline: load an upload, inspect it, reshape it.
//!
//! # Example
//!
//! ```rust,ignore
//! use unpivot::transform::pipeline::reshape_file;
//!
//! let result = reshape_file("opps.xlsx")?;
//! println!("{} rows in, {} rows out", result.input_rows, result.output_rows);
//! ```
//!
//! The reshape engine returns an empty table when there is nothing to do;
//! this layer turns that into [`PipelineError::NoCategoryColumns`] or
//! [`PipelineError::AllCategoriesBlank`] for the caller to show.

use std::path::Path;

use serde::Serialize;

use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineError;
use crate::models::Table;
use crate::parser::{load_bytes, load_file, LoadedTable, SourceFormat};
use crate::transform::reshape::reshape;
use crate::validation::{inspect_schema, SchemaReport};

/// What was detected while loading the input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub format: SourceFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub columns: Vec<String>,
}

/// Result of a complete load + reshape.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub source: SourceInfo,
    /// The long table.
    pub output: Table,
    /// Schema inspection of the input.
    pub report: SchemaReport,
    pub input_rows: usize,
    pub output_rows: usize,
}

/// Load and reshape a file on disk.
pub fn reshape_file<P: AsRef<Path>>(path: P) -> Result<PipelineResult, PipelineError> {
    let path = path.as_ref();
    log_info(format!("📖 Reading {}...", path.display()));
    let loaded = load_file(path).map_err(|e| {
        log_error(format!("Load failed: {}", e));
        e
    })?;
    reshape_loaded(loaded)
}

/// Load and reshape uploaded bytes; `filename` decides the format.
pub fn reshape_bytes(bytes: &[u8], filename: &str) -> Result<PipelineResult, PipelineError> {
    log_info(format!("📖 Reading {} ({} bytes)...", filename, bytes.len()));
    let loaded = load_bytes(bytes, filename).map_err(|e| {
        log_error(format!("Load failed: {}", e));
        e
    })?;
    reshape_loaded(loaded)
}

/// Reshape an already-loaded table.
pub fn reshape_loaded(loaded: LoadedTable) -> Result<PipelineResult, PipelineError> {
    let LoadedTable {
        table,
        format,
        encoding,
        delimiter,
    } = loaded;

    if let Some(ref enc) = encoding {
        log_success(format!("Detected encoding: {}", enc));
    }
    if let Some(d) = delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(d)));
    }
    log_success(format!("Read {} rows x {} columns", table.len(), table.width()));

    let report = inspect_schema(&table);
    log_report(&report);

    if !report.has_groups() {
        log_error("No 'Category 1'...'Category 9' columns found");
        return Err(PipelineError::NoCategoryColumns);
    }

    log_info("🔄 Reshaping...");
    let output = reshape(&table);

    if output.is_empty() {
        log_error("Every category value is blank");
        return Err(PipelineError::AllCategoriesBlank {
            groups: report.groups.len(),
        });
    }
    log_success(format!("Done! Output rows: {}", output.len()));

    Ok(PipelineResult {
        source: SourceInfo {
            format,
            encoding,
            delimiter: delimiter.map(|d| format_delimiter(d).to_string()),
            columns: table.columns.clone(),
        },
        input_rows: table.len(),
        output_rows: output.len(),
        output,
        report,
    })
}

fn log_report(report: &SchemaReport) {
    log_info(format!("📋 Found {} category group(s)", report.groups.len()));
    for group in &report.groups {
        if group.missing_attributes.is_empty() {
            log_info_indent(
                format!("{} ({} filled rows)", group.category_column, group.filled_rows),
                1,
            );
        } else {
            log_info_indent(
                format!(
                    "{} ({} filled rows, missing: {})",
                    group.category_column,
                    group.filled_rows,
                    group.missing_attributes.join(", ")
                ),
                1,
            );
        }
    }
    if !report.orphan_columns.is_empty() {
        log_warning(format!(
            "Dropped without a matching category: {}",
            report.orphan_columns.join(", ")
        ));
    }
    if !report.out_of_range_columns.is_empty() {
        log_warning(format!(
            "Ignored (index outside 1..9): {}",
            report.out_of_range_columns.join(", ")
        ));
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reshape_bytes_csv() {
        let csv = "Entity,Category 1,Per Call Price 1,Category 2,Books 2\nA,X,10,,5\n";

        let result = reshape_bytes(csv.as_bytes(), "opps.csv").unwrap();

        assert_eq!(result.input_rows, 1);
        assert_eq!(result.output_rows, 1);
        assert_eq!(result.output.get_or_null(0, "Category Value"), json!("X"));
        assert_eq!(result.output.get_or_null(0, "Per Call Price"), json!(10));
        assert_eq!(result.source.format, SourceFormat::Csv);
        assert_eq!(result.source.delimiter.as_deref(), Some(","));
        assert_eq!(result.report.groups.len(), 2);
    }

    #[test]
    fn test_no_category_columns() {
        let err = reshape_bytes(b"Entity,Notes\nA,hello\n", "opps.csv").unwrap_err();
        assert!(matches!(err, PipelineError::NoCategoryColumns));
    }

    #[test]
    fn test_all_categories_blank() {
        let err = reshape_bytes(b"Entity,Category 1,Category 2\nA,,\n", "opps.csv").unwrap_err();
        assert!(matches!(err, PipelineError::AllCategoriesBlank { groups: 2 }));
    }

    #[test]
    fn test_unsupported_format() {
        let err = reshape_bytes(b"whatever", "opps.pdf").unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
        assert!(!err.is_no_data());
    }

    #[test]
    fn test_reshape_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opps.csv");
        std::fs::write(&path, "Entity;Category 1;Category 2\nA;X;Y\nB;Z;\n").unwrap();

        let result = reshape_file(&path).unwrap();

        assert_eq!(result.output_rows, 3);
        assert_eq!(result.source.delimiter.as_deref(), Some(";"));
    }
}
