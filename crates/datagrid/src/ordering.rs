//! Sort directions and multi-column sorting over compiled sort keys.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::accessor::SortKeyFn;
use crate::error::Result;
use crate::value::Value;

/// Sort direction of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Not sorted.
    #[default]
    None,
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    pub fn is_sorted(self) -> bool {
        !matches!(self, SortDirection::None)
    }

    /// Applies this direction to an ordering.
    ///
    /// `Descending` reverses; `Ascending` and `None` leave it unchanged.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Descending => ordering.reverse(),
            _ => ordering,
        }
    }

    /// Cycles none -> ascending -> descending -> none, as a header click does.
    pub fn next(self) -> SortDirection {
        match self {
            SortDirection::None => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::None => "none",
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sort key paired with its direction.
pub struct SortDefinition<R> {
    pub key: SortKeyFn<R>,
    pub direction: SortDirection,
}

impl<R> SortDefinition<R> {
    pub fn new(key: SortKeyFn<R>, direction: SortDirection) -> Self {
        SortDefinition { key, direction }
    }
}

impl<R> Clone for SortDefinition<R> {
    fn clone(&self) -> Self {
        SortDefinition {
            key: self.key.clone(),
            direction: self.direction,
        }
    }
}

/// Compares two key tuples using the definitions' directions.
///
/// The first definition is the primary key, the second breaks ties, etc.
pub fn compare_keys<R>(a: &[Value], b: &[Value], definitions: &[SortDefinition<R>]) -> Ordering {
    for ((ka, kb), def) in a.iter().zip(b).zip(definitions) {
        let ordering = def.direction.apply(ka.cmp(kb));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Returns `rows` stably sorted by the definitions.
///
/// Each key is computed once per row. Definitions with
/// [`SortDirection::None`] are skipped. The first conversion failure raised
/// by a key function is returned.
pub fn sort_rows<'a, R>(rows: &'a [R], definitions: &[SortDefinition<R>]) -> Result<Vec<&'a R>> {
    let active: Vec<SortDefinition<R>> = definitions
        .iter()
        .filter(|def| def.direction.is_sorted())
        .cloned()
        .collect();

    let mut keyed = rows
        .iter()
        .map(|row| {
            let keys = active
                .iter()
                .map(|def| def.key.call(row))
                .collect::<Result<Vec<Value>>>()?;
            Ok((keys, row))
        })
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &active));
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        name: &'static str,
        priority: i64,
    }

    fn by_name() -> SortKeyFn<Item> {
        SortKeyFn::new(|item: &Item| Value::from(item.name))
    }

    fn by_priority() -> SortKeyFn<Item> {
        SortKeyFn::new(|item: &Item| Value::from(item.priority))
    }

    #[test]
    fn direction_apply() {
        assert_eq!(SortDirection::Ascending.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortDirection::Descending.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortDirection::None.apply(Ordering::Greater), Ordering::Greater);
        assert_eq!(SortDirection::Descending.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn direction_cycle() {
        assert_eq!(SortDirection::None.next(), SortDirection::Ascending);
        assert_eq!(SortDirection::Ascending.next(), SortDirection::Descending);
        assert_eq!(SortDirection::Descending.next(), SortDirection::None);
        assert_eq!(SortDirection::Descending.to_string(), "descending");
    }

    #[test]
    fn multi_key_sort() {
        let items = vec![
            Item { name: "b", priority: 1 },
            Item { name: "a", priority: 2 },
            Item { name: "a", priority: 1 },
        ];
        let defs = vec![
            SortDefinition::new(by_priority(), SortDirection::Descending),
            SortDefinition::new(by_name(), SortDirection::Ascending),
        ];

        let sorted = sort_rows(&items, &defs).unwrap();
        let names: Vec<(&str, i64)> = sorted.iter().map(|i| (i.name, i.priority)).collect();
        assert_eq!(names, vec![("a", 2), ("a", 1), ("b", 1)]);
    }

    #[test]
    fn unsorted_definitions_are_skipped() {
        let items = vec![
            Item { name: "b", priority: 1 },
            Item { name: "a", priority: 2 },
        ];
        let defs = vec![SortDefinition::new(by_name(), SortDirection::None)];

        let sorted = sort_rows(&items, &defs).unwrap();
        assert_eq!(sorted[0].name, "b");
    }
}
