//! Load uploaded CSV and Excel files into a [`Table`].
//!
//! CSV input goes through encoding detection (`chardet`), decoding
//! (`encoding_rs`) and delimiter detection before the `csv` reader runs.
//! Excel input is read from the first worksheet with `calamine`.
//!
//! Cells are typed the way dataframe loaders usually do it: missing-value
//! markers become null, numeric literals become numbers, `True`/`False`
//! become booleans, and everything else stays text.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{LoadError, LoadResult};
use crate::models::Table;

/// Strings read as missing values.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Excel,
}

impl SourceFormat {
    /// Pick a format from a file name's extension.
    pub fn from_filename(name: &str) -> LoadResult<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Ok(SourceFormat::Csv)
        } else if [".xlsx", ".xls", ".xlsm", ".ods"]
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            Ok(SourceFormat::Excel)
        } else {
            Err(LoadError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// A loaded table plus what was detected while loading it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub format: SourceFormat,
    /// Detected encoding (`None` for workbooks).
    pub encoding: Option<String>,
    /// Detected delimiter (`None` for workbooks).
    pub delimiter: Option<char>,
}

/// Load a file from disk, choosing the format from its name.
pub fn load_file<P: AsRef<Path>>(path: P) -> LoadResult<LoadedTable> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes, &name)
}

/// Load uploaded bytes, choosing the format from `filename`.
pub fn load_bytes(bytes: &[u8], filename: &str) -> LoadResult<LoadedTable> {
    let format = SourceFormat::from_filename(filename)?;
    if bytes.is_empty() {
        return Err(LoadError::EmptyFile);
    }

    match format {
        SourceFormat::Csv => parse_csv_bytes(bytes),
        SourceFormat::Excel => parse_workbook_bytes(bytes),
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding; a UTF-8 BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Comma wins ties, including the single-column case.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8]) -> LoadResult<LoadedTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(LoadedTable {
        table,
        format: SourceFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse decoded CSV text with an explicit delimiter.
pub fn parse_csv_str(content: &str, delimiter: char) -> LoadResult<Table> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let raw_headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if raw_headers.is_empty() {
        return Err(LoadError::NoHeaders);
    }
    let mut table = Table::new(normalize_headers(raw_headers));

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(infer_cell).collect());
    }

    Ok(table)
}

/// Type a raw text field.
pub fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if NA_VALUES.contains(&trimmed) {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if looks_numeric(trimmed) {
        if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    match trimmed {
        "True" | "TRUE" | "true" => Value::Bool(true),
        "False" | "FALSE" | "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Rust's float parser also accepts `inf` and `nan`; only plain decimal
/// literals count as numbers here.
fn looks_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Blank headers become `Unnamed: {pos}`; repeats get `.1`, `.2`, ... suffixes.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (pos, header) in raw.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", pos)
        } else {
            header
        };
        let mut name = base.clone();
        let mut n = 1;
        while out.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        out.push(name);
    }
    out
}

// =============================================================================
// Excel
// =============================================================================

/// Parse an Excel workbook (xlsx / xls / xlsm / ods); first sheet, first row as header.
pub fn parse_workbook_bytes(bytes: &[u8]) -> LoadResult<LoadedTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(LoadError::NoHeaders)?;
    let raw_headers: Vec<String> = header_row
        .iter()
        .map(|cell| match excel_cell(cell) {
            Value::Null => String::new(),
            other => crate::models::display_value(&other).trim().to_string(),
        })
        .collect();
    let mut table = Table::new(normalize_headers(raw_headers));

    for row in rows {
        let cells: Vec<Value> = row.iter().map(excel_cell).collect();
        if cells.iter().all(Value::is_null) {
            continue;
        }
        table.push_row(cells);
    }

    Ok(LoadedTable {
        table,
        format: SourceFormat::Excel,
        encoding: None,
        delimiter: None,
    })
}

fn excel_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Value::Number((*f as i64).into())
        }
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::Null,
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(datetime) => Value::String(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Value::String(dt.to_string()),
        },
        Data::DateTimeIso(s) => Value::String(s.replacen('T', " ", 1)),
        other => Value::String(other.to_string()),
    }
}
