//! Sorting and range filtering
//!
//! Range predicates are answered by sorting the full row set on the target
//! column and cutting it at a lower or upper bound. Equality predicates keep
//! insertion order and use a linear scan.

use std::cmp::Ordering;

use crate::sql::ast::CompareOp;
use crate::storage::{Record, Value};

/// Tolerance for FLOAT equality
pub const FLOAT_EPSILON: f32 = 1e-4;

/// Stable top-down merge sort
pub fn merge_sort_by<T, F>(items: Vec<T>, mut compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    sort_run(items, &mut compare)
}

fn sort_run<T, F>(mut items: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = sort_run(items, compare);
    let right = sort_run(right, compare);
    merge(left, right, compare)
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        // ties go left
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            _ => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

/// Sort rows ascending by one column
pub fn sort_by_column(rows: Vec<Record>, column: usize) -> Vec<Record> {
    merge_sort_by(rows, |a, b| compare_column(a, b, column))
}

/// First index whose value is not less than `value`
pub fn lower_bound(sorted: &[Record], column: usize, value: &Value) -> usize {
    sorted.partition_point(|row| compare_to(row, column, value) == Ordering::Less)
}

/// First index whose value is strictly greater than `value`
pub fn upper_bound(sorted: &[Record], column: usize, value: &Value) -> usize {
    sorted.partition_point(|row| compare_to(row, column, value) != Ordering::Greater)
}

/// Apply a range predicate.
///
/// The result is ordered ascending by `column`, not by insertion.
pub fn range_filter(rows: Vec<Record>, column: usize, op: CompareOp, value: &Value) -> Vec<Record> {
    let mut sorted = sort_by_column(rows, column);
    match op {
        CompareOp::GtEq => {
            let at = lower_bound(&sorted, column, value);
            sorted.split_off(at)
        }
        CompareOp::Gt => {
            let at = upper_bound(&sorted, column, value);
            sorted.split_off(at)
        }
        CompareOp::Lt => {
            let at = lower_bound(&sorted, column, value);
            sorted.truncate(at);
            sorted
        }
        CompareOp::LtEq => {
            let at = upper_bound(&sorted, column, value);
            sorted.truncate(at);
            sorted
        }
        CompareOp::Eq => equality_filter(sorted, column, value),
    }
}

/// Keep rows whose column equals `value`, in their original order
pub fn equality_filter(rows: Vec<Record>, column: usize, value: &Value) -> Vec<Record> {
    rows.into_iter()
        .filter(|row| row.get(column).is_some_and(|cell| values_equal(cell, value)))
        .collect()
}

/// Dispatch a WHERE predicate to the equality scan or the range filter
pub fn filter_rows(rows: Vec<Record>, column: usize, op: CompareOp, value: &Value) -> Vec<Record> {
    if op.is_range() {
        range_filter(rows, column, op, value)
    } else {
        equality_filter(rows, column, value)
    }
}

/// Per-type equality; floats compare within `FLOAT_EPSILON`
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => (x - y).abs() < FLOAT_EPSILON,
        _ => a == b,
    }
}

fn compare_column(a: &Record, b: &Record, column: usize) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn compare_to(row: &Record, column: usize, value: &Value) -> Ordering {
    row.get(column)
        .and_then(|cell| cell.compare(value))
        .unwrap_or(Ordering::Equal)
}
