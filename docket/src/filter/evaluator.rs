use crate::collection::Record;
use crate::common::Value;
use crate::filter::Filter;
use std::cmp::Ordering;

/// Returns `true` if `record` satisfies the equality part of `filter`.
///
/// An empty `eq` matches everything. Otherwise at least one `eq` entry must
/// be present in the record with an equal value.
pub fn matches(record: &Record, filter: &Filter) -> bool {
    if filter.eq.is_empty() {
        return true;
    }
    filter
        .eq
        .iter()
        .any(|(field, expected)| record.get(field) == Some(expected))
}

/// Projects `record` onto `filter.select`.
///
/// Every selected field appears in the result; fields the record lacks map
/// to [Value::Null]. A [Record] keeps its fields in name order, so the
/// selection order is not preserved. An empty selection returns the record
/// unchanged.
pub fn project(record: Record, filter: &Filter) -> Record {
    if filter.select.is_empty() {
        return record;
    }
    filter
        .select
        .iter()
        .map(|field| {
            let value = record.get(field).cloned().unwrap_or(Value::Null);
            (field.clone(), value)
        })
        .collect()
}

/// Orders and truncates matched records for `find`.
///
/// With a sort field, records are stably ordered ascending by that field and
/// records lacking it follow all others in their original order. A non-zero
/// limit then keeps the first `limit` records.
pub(crate) fn arrange(mut records: Vec<Record>, filter: &Filter) -> Vec<Record> {
    if let Some(field) = &filter.sort {
        records.sort_by(|a, b| match (a.get(field), b.get(field)) {
            (Some(x), Some(y)) => x.compare(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
    if filter.limit > 0 {
        records.truncate(filter.limit);
    }
    records
}
