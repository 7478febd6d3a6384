//! Wide to long reshape.
//!
//! ```text
//! Wide input                                   Long output
//! ┌────────┬────────────┬──────────────────┬─────────────┐      ┌────────┬────────────┬───────┬─────┐
//! │ Entity │ Category 1 │ Per Call Price 1 │ Category 2  │  →   │ Entity │ Source ... │ Cat.. │ ... │
//! │ A      │ X          │ 10               │ Y           │      │ A      │ Category 1 │ X     │ 10  │
//! └────────┴────────────┴──────────────────┴─────────────┘      │ A      │ Category 2 │ Y     │     │
//!                                                               └────────┴────────────┴───────┴─────┘
//! ```
//!
//! Each present `Category {i}` yields one extract holding every input row.
//! Extracts are concatenated group-major, rows with a blank category are
//! dropped, and all 45 wide columns are removed from the schema.

use serde_json::Value;

use crate::models::{
    group_indices, is_blank, normalized_columns, wide_column_names, ColumnFamily, Table,
    CATEGORY_VALUE_COLUMN,
};

/// Reshape a wide table into the long layout.
///
/// Returns [`Table::empty`] when none of `Category 1`..`Category 9` exists.
/// When groups exist but every category is blank, the result keeps its
/// schema and has zero rows.
pub fn reshape(input: &Table) -> Table {
    let extracts: Vec<Table> = group_indices()
        .filter_map(|i| group_extract(input, i))
        .collect();

    if extracts.is_empty() {
        return Table::empty();
    }

    let long = concat(extracts);
    let long = drop_blank_categories(long);
    drop_wide_columns(long)
}

/// Indices `i` for which `Category {i}` exists, in order.
pub fn present_groups(input: &Table) -> Vec<usize> {
    group_indices()
        .filter(|&i| input.has_column(&ColumnFamily::Category.column(i)))
        .collect()
}

/// Copy of `input` extended with the normalized columns of group `index`.
///
/// `None` when `Category {index}` is not a column of `input`.
fn group_extract(input: &Table, index: usize) -> Option<Table> {
    let cat_col = ColumnFamily::Category.column(index);
    if !input.has_column(&cat_col) {
        return None;
    }

    let mut columns = input.columns.clone();
    let mut slots = Vec::with_capacity(6);
    for name in normalized_columns() {
        // Assigning onto an existing column overwrites it in place.
        let slot = match columns.iter().position(|c| c == name) {
            Some(pos) => pos,
            None => {
                columns.push(name.to_string());
                columns.len() - 1
            }
        };
        slots.push(slot);
    }

    let sources: Vec<String> = ColumnFamily::ALL.iter().map(|f| f.column(index)).collect();

    let mut extract = Table::new(columns);
    for row_idx in 0..input.len() {
        let mut row = input.rows[row_idx].clone();
        let mut values = Vec::with_capacity(6);
        values.push(Value::String(cat_col.clone()));
        values.extend(sources.iter().map(|src| input.get_or_null(row_idx, src)));

        for (slot, value) in slots.iter().zip(values) {
            if *slot < row.len() {
                row[*slot] = value;
            } else {
                row.push(value);
            }
        }
        extract.push_row(row);
    }

    Some(extract)
}

/// Stack tables vertically; the schema is the ordered union, missing cells null.
fn concat(tables: Vec<Table>) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for col in &table.columns {
            if !columns.contains(col) {
                columns.push(col.clone());
            }
        }
    }

    let mut out = Table::new(columns);
    for table in tables {
        let mapping: Vec<Option<usize>> = out
            .columns
            .iter()
            .map(|c| table.column_index(c))
            .collect();
        for row in table.rows {
            let cells = mapping
                .iter()
                .map(|src| src.map(|i| row[i].clone()).unwrap_or(Value::Null))
                .collect();
            out.push_row(cells);
        }
    }
    out
}

fn drop_blank_categories(mut table: Table) -> Table {
    if let Some(idx) = table.column_index(CATEGORY_VALUE_COLUMN) {
        table.rows.retain(|row| !is_blank(&row[idx]));
    }
    table
}

fn drop_wide_columns(table: Table) -> Table {
    let wide = wide_column_names();
    let keep: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !wide.contains(c))
        .map(|(i, _)| i)
        .collect();

    Table {
        columns: keep.iter().map(|&i| table.columns[i].clone()).collect(),
        rows: table
            .rows
            .into_iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect(),
    }
}
