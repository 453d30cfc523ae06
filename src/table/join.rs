//! Key-based joining of metrics tables.
//!
//! Aggregation repeatedly folds per-tool tables into one wide table keyed on
//! the sample identifier. The join here is deliberately stricter than a
//! general database join: keys must be unique and non-empty on both sides,
//! and non-key column names must not collide. Violations of any of these are
//! reported as errors rather than silently producing duplicated or suffixed
//! columns.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use clap::ValueEnum;
use itertools::Itertools;
use tracing::warn;

use crate::errors::Error;
use crate::errors::Result;
use crate::table::Record;
use crate::table::Table;
use crate::table::Value;
use crate::utils::display::PercentageFormat;

/// How records without a partner on the other side of a join are treated.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Join {
    /// Keep only records whose key appears in both tables. Unmatched records
    /// are dropped (with a warning naming them).
    Inner,

    /// Keep every record from both tables, filling columns from the missing
    /// side with null values.
    Outer,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Join::Inner => write!(f, "inner"),
            Join::Outer => write!(f, "outer"),
        }
    }
}

impl Table {
    /// Joins two tables on the `on` column.
    ///
    /// The resulting table carries the left table's columns followed by the
    /// right table's columns (minus the join column). Matched records appear
    /// in the left table's order. With [`Join::Outer`], unmatched left
    /// records keep their position and unmatched right records follow at the
    /// end.
    pub fn join(self, right: Table, on: &str, how: Join) -> Result<Table> {
        let left_name = self.name.clone();
        let right_name = right.name.clone();

        for (table, name) in [(&self, &left_name), (&right, &right_name)] {
            if !table.columns.iter().any(|c| c == on) {
                return Err(merge_error(
                    &left_name,
                    &right_name,
                    format!("join column '{}' is missing from '{}'", on, name),
                ));
            }
        }

        for column in &right.columns {
            if column != on && self.columns.iter().any(|c| c == column) {
                return Err(merge_error(
                    &left_name,
                    &right_name,
                    format!("column '{}' appears in both tables", column),
                ));
            }
        }

        let left_keys = collect_keys(&self, on, &left_name, &right_name)?;
        let right_keys = collect_keys(&right, on, &left_name, &right_name)?;

        let mut seen = HashSet::with_capacity(left_keys.len());
        for key in &left_keys {
            if !seen.insert(key.as_str()) {
                return Err(merge_error(
                    &left_name,
                    &right_name,
                    format!("'{}' contains the key '{}' more than once", left_name, key),
                ));
            }
        }

        let mut right_index = HashMap::with_capacity(right_keys.len());
        for (i, key) in right_keys.iter().enumerate() {
            if right_index.insert(key.as_str(), i).is_some() {
                return Err(merge_error(
                    &left_name,
                    &right_name,
                    format!("'{}' contains the key '{}' more than once", right_name, key),
                ));
            }
        }

        let left_columns = self.columns.clone();
        let right_only_columns = right
            .columns
            .iter()
            .filter(|column| column.as_str() != on)
            .cloned()
            .collect::<Vec<String>>();

        let mut columns = left_columns.clone();
        columns.extend(right_only_columns.iter().cloned());

        let mut merged = Table::new(format!("{}+{}", left_name, right_name));
        merged.columns = columns;

        let left_total = left_keys.len();
        let right_total = right_keys.len();
        let right_rows = right.rows;

        let mut matched = vec![false; right_rows.len()];
        let mut dropped_left = Vec::new();

        for (row, key) in self.rows.into_iter().zip(left_keys.iter()) {
            match right_index.get(key.as_str()) {
                Some(&i) => {
                    matched[i] = true;
                    merged.push(merge_records(row, right_rows[i].clone(), on))?;
                }
                None => match how {
                    Join::Inner => dropped_left.push(key.clone()),
                    Join::Outer => {
                        let mut record = row;

                        for column in &right_only_columns {
                            record.insert(column, Value::Null);
                        }

                        merged.push(record)?;
                    }
                },
            }
        }

        let mut dropped_right = Vec::new();

        for (i, row) in right_rows.iter().enumerate() {
            if matched[i] {
                continue;
            }

            match how {
                Join::Inner => dropped_right.push(right_keys[i].clone()),
                Join::Outer => {
                    let mut record = Record::new();

                    for column in &left_columns {
                        if column == on {
                            let key = row.get(on).cloned().unwrap_or(Value::Null);
                            record.insert(column, key);
                        } else {
                            record.insert(column, Value::Null);
                        }
                    }

                    for column in &right_only_columns {
                        let value = row.get(column).cloned().unwrap_or(Value::Null);
                        record.insert(column, value);
                    }

                    merged.push(record)?;
                }
            }
        }

        if !dropped_left.is_empty() {
            warn!(
                "{} of {} record(s) in '{}' ({}) had no match in '{}' and were dropped: {}",
                dropped_left.len(),
                left_total,
                left_name,
                PercentageFormat(dropped_left.len() as u64, left_total as u64),
                right_name,
                dropped_left.iter().join(", ")
            );
        }

        if !dropped_right.is_empty() {
            warn!(
                "{} of {} record(s) in '{}' ({}) had no match in '{}' and were dropped: {}",
                dropped_right.len(),
                right_total,
                right_name,
                PercentageFormat(dropped_right.len() as u64, right_total as u64),
                left_name,
                dropped_right.iter().join(", ")
            );
        }

        Ok(merged)
    }
}

/// Builds an [`Error::Merge`] for the pair of tables being joined.
fn merge_error(left: &str, right: &str, reason: String) -> Error {
    Error::Merge {
        left: left.to_string(),
        right: right.to_string(),
        reason,
    }
}

/// Collects the join key of every record in `table`, erroring on records
/// where the key column is empty.
fn collect_keys(table: &Table, on: &str, left: &str, right: &str) -> Result<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| match row.get(on) {
            Some(value) if !value.is_null() => Ok(value.to_string()),
            _ => Err(merge_error(
                left,
                right,
                format!("a record in '{}' has an empty '{}' value", table.name, on),
            )),
        })
        .collect()
}

/// Concatenates a matched pair of records, skipping the right side's copy of
/// the join column.
fn merge_records(left: Record, right: Record, on: &str) -> Record {
    let mut merged = left;

    for (column, value) in right {
        if column != on {
            merged.insert(&column, value);
        }
    }

    merged
}
