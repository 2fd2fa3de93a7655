use crate::collection::Record;
use crate::common::Value;
use std::fmt::{Display, Formatter};

/// A query specification.
///
/// `eq` is matched with OR semantics: a record matches when at least one of
/// its entries is present in the record with an equal value. Equality is
/// value-and-type equality, so `2` does not match `2.0`.
///
/// `select` projects results onto the listed fields. `limit` (`0` means
/// unlimited) and `sort` (ascending, by one field) are honored by `find` and
/// ignored by `update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub eq: Record,
    pub select: Vec<String>,
    pub limit: usize,
    pub sort: Option<String>,
}

/// A filter that matches every record.
pub fn all() -> Filter {
    Filter::default()
}

impl Filter {
    pub fn new() -> Filter {
        Filter::default()
    }

    /// Adds an equality constraint.
    pub fn eq<T: Into<Value>>(mut self, field: &str, value: T) -> Filter {
        self.eq.put(field, value);
        self
    }

    /// Replaces the equality constraints.
    pub fn with_eq(mut self, eq: Record) -> Filter {
        self.eq = eq;
        self
    }

    /// Restricts Find results to `fields`.
    ///
    /// Projected records list their fields in name order, not in the order
    /// given here.
    pub fn select(mut self, fields: &[&str]) -> Filter {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Filter {
        self.limit = limit;
        self
    }

    pub fn sort_by(mut self, field: &str) -> Filter {
        self.sort = Some(field.to_string());
        self
    }

    /// Returns `true` when the filter matches every record.
    pub fn is_match_all(&self) -> bool {
        self.eq.is_empty()
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "eq: {}", self.eq)?;
        if !self.select.is_empty() {
            write!(f, ", select: {:?}", self.select)?;
        }
        if self.limit > 0 {
            write!(f, ", limit: {}", self.limit)?;
        }
        if let Some(sort) = &self.sort {
            write!(f, ", sort: {}", sort)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn all_is_empty() {
        let filter = all();
        assert!(filter.is_match_all());
        assert!(filter.select.is_empty());
        assert_eq!(filter.limit, 0);
        assert_eq!(filter.sort, None);
    }

    #[test]
    fn builder_sets_every_part() {
        let filter = Filter::new()
            .eq("name", "Foo")
            .eq("age", 10)
            .select(&["name"])
            .limit(5)
            .sort_by("age");
        assert_eq!(filter.eq, record! { "name": "Foo", "age": 10 });
        assert_eq!(filter.select, vec!["name".to_string()]);
        assert_eq!(filter.limit, 5);
        assert_eq!(filter.sort.as_deref(), Some("age"));
        assert!(!filter.is_match_all());
    }

    #[test]
    fn display() {
        let filter = Filter::new().eq("a", 1).limit(2);
        assert_eq!(filter.to_string(), "eq: {\"a\": 1}, limit: 2");
    }
}
