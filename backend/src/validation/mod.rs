//! Schema inspection for wide spreadsheets.
//!
//! Only column presence is checked. The report tells the operator which
//! groups will be reshaped, which of their attribute columns are missing
//! (those cells come out null), and which wide-looking columns are ignored.
//!
//! # Example
//!
//! ```rust,ignore
//! use unpivot::{inspect_schema, Table};
//!
//! let table = Table::new(vec!["Entity".into(), "Category 1".into(), "Books 4".into()]);
//! let report = inspect_schema(&table);
//! assert_eq!(report.groups.len(), 1);
//! assert_eq!(report.orphan_columns, vec!["Books 4"]);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::{ColumnFamily, Table, MAX_GROUPS};
use crate::transform::reshape::present_groups;

/// Matches `"{family} {n}"` for the five wide families.
static WIDE_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Category|Per Call Price|Monthly Flat Fee|APF|Books) (\d+)$")
        .expect("static regex")
});

/// One present group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    /// Group index (1..=9).
    pub index: usize,
    /// The `Category {i}` column.
    pub category_column: String,
    /// Attribute columns of this group that are absent from the input.
    pub missing_attributes: Vec<String>,
    /// Rows whose category value is non-blank.
    pub filled_rows: usize,
}

/// What the reshape will do with an input schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    /// Groups that will produce rows, in output order.
    pub groups: Vec<GroupReport>,
    /// Attribute columns in range whose `Category {i}` is missing (dropped).
    pub orphan_columns: Vec<String>,
    /// Wide-looking columns with an index outside 1..=9 (kept as base columns).
    pub out_of_range_columns: Vec<String>,
    /// Columns carried into every long row.
    pub base_columns: Vec<String>,
}

impl SchemaReport {
    /// True when at least one `Category {i}` column exists.
    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Rows the reshape will emit.
    pub fn expected_rows(&self) -> usize {
        self.groups.iter().map(|g| g.filled_rows).sum()
    }
}

/// Split a column name into its wide family and index.
pub fn parse_wide_column(name: &str) -> Option<(ColumnFamily, usize)> {
    let caps = WIDE_COLUMN.captures(name)?;
    let family = ColumnFamily::from_prefix(caps.get(1)?.as_str())?;
    let index = caps.get(2)?.as_str().parse().ok()?;
    Some((family, index))
}

/// Inspect `table`'s schema against the wide layout.
pub fn inspect_schema(table: &Table) -> SchemaReport {
    let mut report = SchemaReport::default();

    for index in present_groups(table) {
        let category_column = ColumnFamily::Category.column(index);
        let values = table.column_values(&category_column).unwrap_or_default();
        let missing_attributes = ColumnFamily::ATTRIBUTES
            .iter()
            .map(|f| f.column(index))
            .filter(|c| !table.has_column(c))
            .collect();
        let filled_rows = values
            .into_iter()
            .filter(|v| !crate::models::is_blank(v))
            .count();

        report.groups.push(GroupReport {
            index,
            category_column,
            missing_attributes,
            filled_rows,
        });
    }

    for column in &table.columns {
        match parse_wide_column(column) {
            Some((_, index)) if !(1..=MAX_GROUPS).contains(&index) => {
                report.out_of_range_columns.push(column.clone());
                report.base_columns.push(column.clone());
            }
            Some((ColumnFamily::Category, _)) => {}
            Some((_, index)) => {
                if !report.groups.iter().any(|g| g.index == index) {
                    report.orphan_columns.push(column.clone());
                }
            }
            None => report.base_columns.push(column.clone()),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(columns: &[&str]) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_parse_wide_column() {
        assert_eq!(parse_wide_column("Category 3"), Some((ColumnFamily::Category, 3)));
        assert_eq!(
            parse_wide_column("Monthly Flat Fee 12"),
            Some((ColumnFamily::MonthlyFlatFee, 12))
        );
        assert_eq!(parse_wide_column("Category"), None);
        assert_eq!(parse_wide_column("category 1"), None);
        assert_eq!(parse_wide_column("Books 1 "), None);
    }

    #[test]
    fn test_present_and_partial_groups() {
        let report = inspect_schema(&table(&[
            "Entity",
            "Category 1",
            "Per Call Price 1",
            "Monthly Flat Fee 1",
            "APF 1",
            "Books 1",
            "Category 3",
            "Books 3",
        ]));

        assert_eq!(report.groups.len(), 2);
        assert!(report.groups[0].missing_attributes.is_empty());
        assert_eq!(report.groups[1].index, 3);
        assert_eq!(
            report.groups[1].missing_attributes,
            vec!["Per Call Price 3", "Monthly Flat Fee 3", "APF 3"]
        );
        assert_eq!(report.base_columns, vec!["Entity"]);
    }

    #[test]
    fn test_orphans_and_out_of_range() {
        let report = inspect_schema(&table(&["Entity", "Category 2", "Books 4", "Category 10", "APF 0"]));

        assert_eq!(report.orphan_columns, vec!["Books 4"]);
        assert_eq!(report.out_of_range_columns, vec!["Category 10", "APF 0"]);
        assert_eq!(report.base_columns, vec!["Entity", "Category 10", "APF 0"]);
    }

    #[test]
    fn test_groups_follow_engine_presence() {
        let t = table(&["Category 7", "Entity", "Category 2", "Category 9", "Books 2"]);
        let report = inspect_schema(&t);

        let indices: Vec<usize> = report.groups.iter().map(|g| g.index).collect();
        assert_eq!(indices, present_groups(&t));
        assert_eq!(indices, vec![2, 7, 9]);
    }

    #[test]
    fn test_no_groups() {
        let report = inspect_schema(&table(&["Entity", "Notes"]));
        assert!(!report.has_groups());
        assert_eq!(report.expected_rows(), 0);
    }

    #[test]
    fn test_expected_rows_counts_non_blank_categories() {
        let t = Table::from_rows(
            vec!["Category 1".into(), "Category 2".into()],
            vec![
                vec![json!("X"), json!("")],
                vec![json!("Y"), json!("Z")],
                vec![serde_json::Value::Null, json!(" ")],
            ],
        );

        let report = inspect_schema(&t);

        assert_eq!(report.groups[0].filled_rows, 2);
        assert_eq!(report.groups[1].filled_rows, 1);
        assert_eq!(report.expected_rows(), crate::transform::reshape(&t).len());
    }
}
