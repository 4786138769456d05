//! Service catalog.
//!
//! Services are named categories of care. Their declaration order is
//! significant: the 1-based position of a service is its rank, used as the
//! base of the disruption weight in the objective.

use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of declared services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    names: Vec<String>,
}

impl ServiceCatalog {
    /// Creates a catalog, keeping the first occurrence of each name.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for name in names {
            catalog.push(name);
        }
        catalog
    }

    /// Appends a service unless already declared.
    pub fn push(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    /// 1-based declaration rank.
    pub fn rank(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| i as u32 + 1)
    }

    /// Whether the service is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Declared names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of declared services.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no service is declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over declared names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
