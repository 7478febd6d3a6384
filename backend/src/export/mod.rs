//! Serialize a reshaped [`Table`] for download.
//!
//! Column order and row order are written exactly as the table holds them.

use std::str::FromStr;

use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExportError, ExportResult};
use crate::models::{display_value, Table};

/// Worksheet name used for Excel output.
pub const SHEET_NAME: &str = "Done";

/// Suffix appended to the uploaded file's stem.
pub const OUTPUT_SUFFIX: &str = "-done";

/// Excel's hard row limit (header included).
const XLSX_MAX_ROWS: usize = 1_048_576;

/// Excel's hard column limit.
const XLSX_MAX_COLS: usize = 16_384;

/// Download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// Serialize `table` in this format.
    pub fn write(self, table: &Table) -> ExportResult<Vec<u8>> {
        match self {
            ExportFormat::Csv => to_csv_bytes(table),
            ExportFormat::Xlsx => to_xlsx_bytes(table),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// `report.final.xlsx` -> `report.final-done.csv`
pub fn output_file_name(original: &str, format: ExportFormat) -> String {
    let stem = match original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => original,
    };
    format!("{}{}.{}", stem, OUTPUT_SUFFIX, format.extension())
}

/// Comma-delimited UTF-8 with a header row; null cells are empty.
pub fn to_csv_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(display_value))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Single worksheet named [`SHEET_NAME`] with typed cells.
pub fn to_xlsx_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    if table.len() + 1 > XLSX_MAX_ROWS || table.width() > XLSX_MAX_COLS {
        return Err(ExportError::TooLarge(format!(
            "{} rows x {} columns",
            table.len(),
            table.width()
        )));
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let excel_col = c as u16;
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    sheet.write_boolean(excel_row, excel_col, *b)?;
                }
                Value::Number(n) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(excel_row, excel_col, f)?;
                    }
                    None => {
                        sheet.write_string(excel_row, excel_col, n.to_string())?;
                    }
                },
                other => {
                    sheet.write_string(excel_row, excel_col, display_value(other))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::from_rows(
            vec!["Entity".into(), "Category Value".into(), "Books".into()],
            vec![
                vec![json!("A, Inc."), json!("X"), json!(5)],
                vec![json!("B"), json!("Y"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("opps.xlsx", ExportFormat::Csv), "opps-done.csv");
        assert_eq!(output_file_name("q3.opps.csv", ExportFormat::Xlsx), "q3.opps-done.xlsx");
        assert_eq!(output_file_name("noext", ExportFormat::Csv), "noext-done.csv");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert!(ExportFormat::Xlsx.mime_type().contains("spreadsheetml"));
    }

    #[test]
    fn test_csv_output() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text, "Entity,Category Value,Books\n\"A, Inc.\",X,5\nB,Y,\n");
    }

    #[test]
    fn test_xlsx_output_reads_back() {
        let bytes = ExportFormat::Xlsx.write(&sample()).unwrap();

        let loaded = crate::parser::load_bytes(&bytes, "out.xlsx").unwrap();

        assert_eq!(loaded.table.columns, sample().columns);
        assert_eq!(loaded.table.rows, sample().rows);
    }
}
