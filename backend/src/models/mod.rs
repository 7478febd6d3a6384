//! Domain models for the Unpivot pipeline.
//!
//! - [`Table`] - ordered columns plus positional rows of JSON cells
//! - [`ColumnFamily`] - the five repeated column families of the wide layout
//! - [`MAX_GROUPS`] / [`group_indices`] - the fixed `1..=9` group range
//! - [`is_blank`] / [`display_value`] - cell helpers shared by reshape and export

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Group naming convention
// =============================================================================

/// Highest group index examined. Indices outside `1..=MAX_GROUPS` are ignored.
pub const MAX_GROUPS: usize = 9;

/// Name of the column recording which `Category {i}` produced a long row.
pub const SOURCE_CATEGORY_COLUMN: &str = "Source Category Column";

/// Name of the normalized category column.
pub const CATEGORY_VALUE_COLUMN: &str = "Category Value";

/// Iterate the group indices in output order.
pub fn group_indices() -> impl Iterator<Item = usize> {
    1..=MAX_GROUPS
}

/// One of the five repeated column families of the wide layout.
///
/// Group `i` of family `f` lives in the column `"{f.prefix()} {i}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnFamily {
    Category,
    PerCallPrice,
    MonthlyFlatFee,
    Apf,
    Books,
}

impl ColumnFamily {
    /// All families, in the order their normalized columns are emitted.
    pub const ALL: [ColumnFamily; 5] = [
        ColumnFamily::Category,
        ColumnFamily::PerCallPrice,
        ColumnFamily::MonthlyFlatFee,
        ColumnFamily::Apf,
        ColumnFamily::Books,
    ];

    /// The four families attached to a category.
    pub const ATTRIBUTES: [ColumnFamily; 4] = [
        ColumnFamily::PerCallPrice,
        ColumnFamily::MonthlyFlatFee,
        ColumnFamily::Apf,
        ColumnFamily::Books,
    ];

    /// Column name prefix in the wide layout.
    pub fn prefix(self) -> &'static str {
        match self {
            ColumnFamily::Category => "Category",
            ColumnFamily::PerCallPrice => "Per Call Price",
            ColumnFamily::MonthlyFlatFee => "Monthly Flat Fee",
            ColumnFamily::Apf => "APF",
            ColumnFamily::Books => "Books",
        }
    }

    /// Wide column name for group `index`, e.g. `Books 3`.
    pub fn column(self, index: usize) -> String {
        format!("{} {}", self.prefix(), index)
    }

    /// Column name in the long layout.
    pub fn normalized_name(self) -> &'static str {
        match self {
            ColumnFamily::Category => CATEGORY_VALUE_COLUMN,
            other => other.prefix(),
        }
    }

    /// Look a family up by its wide prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.prefix() == prefix)
    }
}

/// Every wide-format column name (`5 families x 9 groups`).
pub fn wide_column_names() -> Vec<String> {
    group_indices()
        .flat_map(|i| ColumnFamily::ALL.into_iter().map(move |f| f.column(i)))
        .collect()
}

/// The six columns appended by the reshape, in output order.
pub fn normalized_columns() -> [&'static str; 6] {
    [
        SOURCE_CATEGORY_COLUMN,
        CATEGORY_VALUE_COLUMN,
        ColumnFamily::PerCallPrice.normalized_name(),
        ColumnFamily::MonthlyFlatFee.normalized_name(),
        ColumnFamily::Apf.normalized_name(),
        ColumnFamily::Books.normalized_name(),
    ]
}

// =============================================================================
// Cell helpers
// =============================================================================

/// A cell is blank when it is null or text that trims to nothing.
///
/// Numbers and booleans are never blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Text form of a cell, as written to CSV.
///
/// Integers stay integers even when their column also holds blanks.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Table
// =============================================================================

/// An in-memory table: named columns in order, rows in order.
///
/// Every row holds exactly one cell per column. Cells are JSON values
/// restricted to null, string, number and bool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// A table with the given schema and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Zero columns, zero rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from rows of cells, padding or truncating each to the schema width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row; short rows are null-padded, extra cells dropped.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (`row`, `column`), or null when the column does not exist.
    pub fn get_or_null(&self, row: usize, column: &str) -> Value {
        self.column_index(column)
            .and_then(|c| self.rows.get(row).and_then(|r| r.get(c)))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// All values of a column, or `None` when it does not exist.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// First `n` rows with the same schema.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_family_column_names() {
        assert_eq!(ColumnFamily::Category.column(3), "Category 3");
        assert_eq!(ColumnFamily::PerCallPrice.column(1), "Per Call Price 1");
        assert_eq!(ColumnFamily::MonthlyFlatFee.column(9), "Monthly Flat Fee 9");
        assert_eq!(ColumnFamily::Apf.column(2), "APF 2");
        assert_eq!(ColumnFamily::Books.column(7), "Books 7");
    }

    #[test]
    fn test_normalized_names() {
        assert_eq!(ColumnFamily::Category.normalized_name(), "Category Value");
        assert_eq!(ColumnFamily::Apf.normalized_name(), "APF");
        assert_eq!(
            normalized_columns(),
            [
                "Source Category Column",
                "Category Value",
                "Per Call Price",
                "Monthly Flat Fee",
                "APF",
                "Books"
            ]
        );
    }

    #[test]
    fn test_wide_column_names_cover_all_groups() {
        let names = wide_column_names();
        assert_eq!(names.len(), 45);
        assert!(names.contains(&"Category 1".to_string()));
        assert!(names.contains(&"Books 9".to_string()));
        assert!(!names.contains(&"Category 10".to_string()));
        assert!(!names.contains(&"Category 0".to_string()));
    }

    #[test]
    fn test_from_prefix() {
        assert_eq!(
            ColumnFamily::from_prefix("Monthly Flat Fee"),
            Some(ColumnFamily::MonthlyFlatFee)
        );
        assert_eq!(ColumnFamily::from_prefix("category"), None);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("  \t ")));
        assert!(!is_blank(&json!("X")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!("abc")), "abc");
        assert_eq!(display_value(&json!(10)), "10");
        assert_eq!(display_value(&json!(2.5)), "2.5");
        assert_eq!(display_value(&json!(true)), "True");
    }

    #[test]
    fn test_push_row_pads_and_truncates() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![json!(1)]);
        table.push_row(vec![json!(1), json!(2), json!(3)]);
        assert_eq!(table.rows[0], vec![json!(1), Value::Null]);
        assert_eq!(table.rows[1], vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_get_or_null() {
        let table = Table::from_rows(
            vec!["Entity".into(), "Books 1".into()],
            vec![vec![json!("A"), json!(5)]],
        );
        assert_eq!(table.get_or_null(0, "Books 1"), json!(5));
        assert_eq!(table.get_or_null(0, "Books 2"), Value::Null);
        assert_eq!(table.get_or_null(7, "Entity"), Value::Null);
    }

    #[test]
    fn test_head() {
        let table = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![json!(1), json!("x")], vec![json!(2), Value::Null]],
        );
        let head = table.head(1);
        assert_eq!(head.len(), 1);
        assert_eq!(head.columns, table.columns);
        assert_eq!(head.rows[0], vec![json!(1), json!("x")]);
        assert_eq!(table.head(10).len(), 2);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }
}
