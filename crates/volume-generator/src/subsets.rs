//! Category-based decomposition of a recordset into subsets.
//!
//! Two modes:
//! - **Additive**: one subset per distinct tuple of category values. Subsets
//!   are disjoint and together cover every record.
//! - **Non-additive**: named groups, each accepting a set of values per
//!   category. A record belongs to a group when every category the group
//!   references holds an accepted value. Groups may overlap.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{Record, RecordSet};

/// Distinct observed values per category column.
pub type CategoryOptions = BTreeMap<String, BTreeSet<String>>;

/// Prefix carried by category columns in tabular sources.
pub const CATEGORY_PREFIX: &str = "category_";

/// A named non-additive group: accepted values per category column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedGroup {
    pub name: String,
    #[serde(default)]
    pub accept: BTreeMap<String, BTreeSet<String>>,
}

impl NamedGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accept: BTreeMap::new(),
        }
    }

    /// Accept `values` for `column`.
    pub fn accepting<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept
            .entry(column.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Whether `record` passes every category predicate of this group.
    ///
    /// Predicates are AND-ed; a group with no predicates accepts everything,
    /// and a predicate on a column the set does not have accepts nothing.
    pub fn matches(&self, set: &RecordSet, record: &Record) -> bool {
        self.accept.iter().all(|(column, accepted)| {
            set.column_index(column)
                .and_then(|i| record.categories.get(i))
                .is_some_and(|value| accepted.contains(value))
        })
    }
}

/// One subset of the decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subset {
    /// Exact category tuple, aligned with the decomposed columns.
    Additive { values: Vec<String> },
    /// Named value-set group.
    NonAdditive(NamedGroup),
}

/// How a recordset is split into subsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decomposition {
    Additive,
    NonAdditive(Vec<NamedGroup>),
}

impl Decomposition {
    /// Split `set` into subsets over `columns`, each with its own records.
    ///
    /// Subsets borrow their records from `set`.
    pub fn decompose<'a>(
        &self,
        set: &'a RecordSet,
        columns: &[String],
    ) -> Vec<(Subset, Vec<&'a Record>)> {
        match self {
            Self::Additive => additive_subsets(set, columns),
            Self::NonAdditive(groups) => groups
                .iter()
                .map(|group| {
                    (
                        Subset::NonAdditive(group.clone()),
                        nonadditive_records(set, group),
                    )
                })
                .collect(),
        }
    }
}

/// Finds the category columns of a recordset and their observed values.
pub trait CategoryExtractor: Send + Sync {
    /// Category columns, in a stable order.
    fn columns(&self, set: &RecordSet) -> Vec<String>;

    /// Distinct values observed for each of `columns`.
    fn options(&self, set: &RecordSet, columns: &[String]) -> CategoryOptions {
        let mut options = CategoryOptions::new();
        for column in columns {
            let values = options.entry(column.clone()).or_default();
            if let Some(i) = set.column_index(column) {
                values.extend(set.records.iter().filter_map(|r| r.categories.get(i).cloned()));
            }
        }
        options
    }
}

/// Uses every column declared on the recordset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredCategories;

impl CategoryExtractor for DeclaredCategories {
    fn columns(&self, set: &RecordSet) -> Vec<String> {
        set.category_columns.clone()
    }
}

/// Partition records by their exact tuple of values for `columns`.
///
/// Subsets come out in tuple order. Without columns, everything forms a
/// single subset with the empty tuple.
pub fn additive_subsets<'a>(set: &'a RecordSet, columns: &[String]) -> Vec<(Subset, Vec<&'a Record>)> {
    let positions: Vec<Option<usize>> = columns.iter().map(|c| set.column_index(c)).collect();
    let mut groups: BTreeMap<Vec<String>, Vec<&'a Record>> = BTreeMap::new();

    for record in &set.records {
        let key = positions
            .iter()
            .map(|p| {
                p.and_then(|i| record.categories.get(i))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        groups.entry(key).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(values, records)| (Subset::Additive { values }, records))
        .collect()
}

/// Records belonging to a non-additive group.
pub fn nonadditive_records<'a>(set: &'a RecordSet, group: &NamedGroup) -> Vec<&'a Record> {
    set.records
        .iter()
        .filter(|record| group.matches(set, record))
        .collect()
}

/// Enumerate the default non-additive groups for `columns`.
///
/// Each column either stays unconstrained or is pinned to one observed
/// value; the groups are the Cartesian product of those choices.
pub fn default_groups(columns: &[String], options: &CategoryOptions) -> Vec<NamedGroup> {
    let mut groups = vec![NamedGroup::new("")];

    for column in columns {
        let values = options.get(column).cloned().unwrap_or_default();
        let mut next = Vec::with_capacity(groups.len() * (values.len() + 1));
        for group in &groups {
            next.push(group.clone());
            for value in &values {
                next.push(group.clone().accepting(column.clone(), [value.clone()]));
            }
        }
        groups = next;
    }

    for group in &mut groups {
        group.name = group_name(group);
    }
    groups
}

fn group_name(group: &NamedGroup) -> String {
    if group.accept.is_empty() {
        return "all".to_string();
    }
    group
        .accept
        .iter()
        .map(|(column, values)| {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            format!("{}={}", strip_category_prefix(column), values.join("+"))
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Column name without the [`CATEGORY_PREFIX`].
pub fn strip_category_prefix(column: &str) -> &str {
    column.strip_prefix(CATEGORY_PREFIX).unwrap_or(column)
}

/// Percent-escape `%`, `/` and `\` so a category value stays one path part.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Produces the export label of a subset.
pub trait SubsetLabeler: Send + Sync {
    fn label(&self, subset: &Subset, columns: &[String]) -> String;
}

/// `column=value` pairs joined with `/`; non-additive groups use their name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLabeler;

impl SubsetLabeler for PathLabeler {
    fn label(&self, subset: &Subset, columns: &[String]) -> String {
        match subset {
            Subset::Additive { values } if values.is_empty() => "all".to_string(),
            Subset::Additive { values } => columns
                .iter()
                .zip(values)
                .map(|(column, value)| {
                    format!("{}={}", strip_category_prefix(column), escape_label_value(value))
                })
                .collect::<Vec<_>>()
                .join("/"),
            Subset::NonAdditive(group) => group.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn set() -> RecordSet {
        let ts = Utc.with_ymd_and_hms(2012, 8, 7, 0, 0, 0).unwrap();
        let rows = [
            ("theft", "day"),
            ("theft", "night"),
            ("assault", "night"),
            ("theft", "day"),
        ];
        RecordSet::from_records(
            vec!["category_type".to_string(), "category_shift".to_string()],
            rows.iter()
                .map(|(a, b)| Record::new(ts, 0.0, 0.0).with_categories([*a, *b]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_options() {
        let set = set();
        let columns = DeclaredCategories.columns(&set);
        let options = DeclaredCategories.options(&set, &columns);
        assert_eq!(options["category_type"].len(), 2);
        assert_eq!(options["category_shift"].len(), 2);
        assert!(options["category_type"].contains("assault"));
    }

    #[test]
    fn test_additive_partition() {
        let set = set();
        let subsets = additive_subsets(&set, &set.category_columns);
        assert_eq!(subsets.len(), 3);
        let sizes: usize = subsets.iter().map(|(_, r)| r.len()).sum();
        assert_eq!(sizes, set.len());

        let (first, records) = &subsets[0];
        assert_eq!(
            first,
            &Subset::Additive {
                values: vec!["assault".to_string(), "night".to_string()]
            }
        );
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_additive_without_columns_is_single_subset() {
        let set = set();
        let subsets = additive_subsets(&set, &[]);
        assert_eq!(subsets.len(), 1);
        assert_eq!(subsets[0].1.len(), set.len());
        assert_eq!(PathLabeler.label(&subsets[0].0, &[]), "all");
    }

    #[test]
    fn test_group_matching_is_conjunctive() {
        let set = set();
        let group = NamedGroup::new("theft-day")
            .accepting("category_type", ["theft"])
            .accepting("category_shift", ["day"]);
        assert_eq!(nonadditive_records(&set, &group).len(), 2);

        let any_type_at_night = NamedGroup::new("night").accepting("category_shift", ["night"]);
        assert_eq!(nonadditive_records(&set, &any_type_at_night).len(), 2);

        let everything = NamedGroup::new("all");
        assert_eq!(nonadditive_records(&set, &everything).len(), 4);

        let unknown = NamedGroup::new("x").accepting("category_color", ["red"]);
        assert!(nonadditive_records(&set, &unknown).is_empty());
    }

    #[test]
    fn test_default_groups_enumeration() {
        let set = set();
        let columns = set.category_columns.clone();
        let options = DeclaredCategories.options(&set, &columns);
        let groups = default_groups(&columns, &options);

        // (1 + 2) choices for each of two columns.
        assert_eq!(groups.len(), 9);
        assert_eq!(groups[0].name, "all");
        assert!(groups.iter().any(|g| g.name == "shift=night/type=theft"));
        assert!(groups.iter().any(|g| g.name == "type=assault"));
    }

    #[test]
    fn test_path_labels() {
        let columns = vec!["category_type".to_string(), "shift".to_string()];
        let subset = Subset::Additive {
            values: vec!["theft".to_string(), "day".to_string()],
        };
        assert_eq!(PathLabeler.label(&subset, &columns), "type=theft/shift=day");

        let slashed = Subset::Additive {
            values: vec!["a/b".to_string(), "50%".to_string()],
        };
        assert_eq!(PathLabeler.label(&slashed, &columns), "type=a%2Fb/shift=50%25");

        let group = Subset::NonAdditive(NamedGroup::new("weekend"));
        assert_eq!(PathLabeler.label(&group, &columns), "weekend");
    }
}
