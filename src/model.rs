//! Data model
//!
//! A [`ConfigItem`] is a named value scoped by application and, optionally,
//! by machine. The tuple (application, machine, name) is its identity and is
//! represented by [`ItemKey`].

use serde::{Deserialize, Serialize};

/// Application sentinel meaning "all applications"
pub const GLOBAL_APPLICATION: &str = "*";

/// A single configuration item
///
/// All fields default to their zero value when absent from a request body.
/// An `id` of 0 means the item has not been assigned an id by a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigItem {
    pub id: u64,
    pub application: String,
    /// Empty means "all machines"
    pub machine: String,
    pub name: String,
    pub value: String,
}

impl ConfigItem {
    /// Create an item that applies to every machine of `application`
    pub fn new(
        application: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Scope this item to a single machine
    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = machine.into();
        self
    }

    /// Build a lookup query (no value)
    pub fn query(application: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(application, name, "")
    }

    /// The composite identity of this item
    pub fn key(&self) -> ItemKey {
        ItemKey {
            application: self.application.clone(),
            machine: self.machine.clone(),
            name: self.name.clone(),
        }
    }

    /// True when this is the zero value returned for "nothing found"
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_global(&self) -> bool {
        self.application == GLOBAL_APPLICATION
    }
}

/// Composite identity of a stored item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub application: String,
    pub machine: String,
    pub name: String,
}

impl ItemKey {
    pub fn new(
        application: impl Into<String>,
        machine: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            machine: machine.into(),
            name: name.into(),
        }
    }

    /// Candidate keys for resolving `query`, most specific first
    ///
    /// 1. (application, machine, name) when the query names a machine
    /// 2. (application, "", name)
    /// 3. ("*", "", name)
    ///
    /// The first candidate present in the store wins.
    pub fn resolution_order(query: &ConfigItem) -> Vec<ItemKey> {
        let mut candidates = Vec::with_capacity(3);

        if !query.machine.is_empty() {
            candidates.push(Self::new(&query.application, &query.machine, &query.name));
        }
        candidates.push(Self::new(&query.application, "", &query.name));
        candidates.push(Self::new(GLOBAL_APPLICATION, "", &query.name));

        candidates
    }
}
