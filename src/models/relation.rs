//! Binary relations between entities.
//!
//! Every many-to-many mapping of the data model (patient ↔ service,
//! patient ↔ treatment, patient ↔ old bed, bed ↔ service, bed ↔ treatment)
//! is a [`Relation`]: a deduplicated, order-irrelevant set of
//! `(key, value)` pairs. Multi-valued cells are expanded here and nowhere
//! else, so downstream code only ever sees flat pairs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Splits a delimiter-separated cell into trimmed, non-empty values.
pub fn split_list(raw: &str, delimiter: char) -> impl Iterator<Item = &str> {
    raw.split(delimiter).map(str::trim).filter(|v| !v.is_empty())
}

/// A set of unique `(key, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pairs: BTreeSet<(String, String)>,
}

impl Relation {
    /// Creates an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a relation from raw `(key, value)` rows.
    ///
    /// The value cell may hold a `delimiter`-separated list; it is expanded
    /// into one pair per item. Rows with a missing key or value are dropped,
    /// duplicates collapse.
    pub fn from_rows<I, K, V>(rows: I, delimiter: char) -> Self
    where
        I: IntoIterator<Item = (Option<K>, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut relation = Self::new();
        for (key, value) in rows {
            let (Some(key), Some(value)) = (key, value) else {
                continue;
            };
            let key = key.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            for item in split_list(value.as_ref(), delimiter) {
                relation.insert(key, item);
            }
        }
        relation
    }

    /// Builds a relation from already flat pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Adds a pair. Returns `false` if it was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.pairs.insert((key.into(), value.into()))
    }

    /// Whether the pair is present.
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.pairs.contains(&(key.to_string(), value.to_string()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the relation holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct keys.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Distinct values (the foreign-key column).
    pub fn values(&self) -> BTreeSet<&str> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// Values related to `key`.
    pub fn values_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Values grouped by key.
    pub fn grouped(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (k, v) in self.iter() {
            map.entry(k).or_default().push(v);
        }
        map
    }

    /// Values of this relation that do not belong to `domain`.
    pub fn values_outside<'a, S: AsRef<str>>(&'a self, domain: &[S]) -> Vec<&'a str> {
        let domain: BTreeSet<&str> = domain.iter().map(AsRef::as_ref).collect();
        self.values()
            .into_iter()
            .filter(|v| !domain.contains(v))
            .collect()
    }

    /// Aligns two relations sharing the same key space.
    ///
    /// For every key present in both, yields the cartesian product of its
    /// values in `self` and in `other`. Used to derive (service, treatment)
    /// pairs from the separate service and treatment relations.
    pub fn align(&self, other: &Relation) -> BTreeSet<(String, String)> {
        let left = self.grouped();
        let right = other.grouped();
        let mut out = BTreeSet::new();
        for (key, lvalues) in &left {
            if let Some(rvalues) = right.get(key) {
                for l in lvalues {
                    for r in rvalues {
                        out.insert((l.to_string(), r.to_string()));
                    }
                }
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Relation {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
