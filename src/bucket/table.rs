//! Bucket implementation

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::journal::Operation;
use crate::model::{ConfigItem, ItemKey};

/// In-memory item collection with a composite-key index
#[derive(Debug, Clone)]
pub struct Bucket {
    /// Items keyed by id
    items: BTreeMap<u64, ConfigItem>,

    /// Composite identity → id
    index: HashMap<ItemKey, u64>,

    /// Next id to hand out (ids start at 1; 0 means "unassigned")
    next_id: u64,
}

impl Bucket {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Point lookup by composite key
    pub fn lookup(&self, key: &ItemKey) -> Option<&ConfigItem> {
        self.index.get(key).and_then(|id| self.items.get(id))
    }

    /// Most specific item matching `query`, if any
    pub fn resolve(&self, query: &ConfigItem) -> Option<&ConfigItem> {
        ItemKey::resolution_order(query)
            .iter()
            .find_map(|candidate| self.lookup(candidate))
    }

    /// Id of the item stored under exactly this key
    pub fn find_id(&self, key: &ItemKey) -> Option<u64> {
        self.index.get(key).copied()
    }

    /// Prepare `item` for storage without mutating the bucket
    ///
    /// Retains the id of an existing item with the same key, otherwise takes
    /// the next free id. The caller-supplied id is ignored.
    pub fn stage(&self, mut item: ConfigItem) -> ConfigItem {
        item.id = self.find_id(&item.key()).unwrap_or(self.next_id);
        item
    }

    /// Apply a journaled operation
    pub fn apply(&mut self, operation: &Operation) {
        match operation {
            Operation::Put { item } => self.put(item.clone()),
            Operation::Delete { id } => {
                self.delete(*id);
            }
            Operation::Checkpoint { next_id } => {
                self.next_id = self.next_id.max(*next_id);
            }
        }
    }

    /// Insert or overwrite an item that already carries its id
    pub fn put(&mut self, item: ConfigItem) {
        let key = item.key();

        // A key re-pointed to a new id drops the old record
        if let Some(previous) = self.index.insert(key, item.id) {
            if previous != item.id {
                self.items.remove(&previous);
            }
        }
        // An id re-used under a new key drops the old index entry
        if let Some(replaced) = self.items.insert(item.id, item.clone()) {
            let old_key = replaced.key();
            if old_key != item.key() {
                self.index.remove(&old_key);
            }
        }

        self.next_id = self.next_id.max(item.id + 1);
    }

    /// Remove by id; returns the removed item
    pub fn delete(&mut self, id: u64) -> Option<ConfigItem> {
        let item = self.items.remove(&id)?;
        self.index.remove(&item.key());
        Some(item)
    }

    /// All items in ascending id order
    pub fn items(&self) -> Vec<ConfigItem> {
        self.items.values().cloned().collect()
    }

    /// Items whose application is exactly `application`
    pub fn items_for_application(&self, application: &str) -> Vec<ConfigItem> {
        self.items
            .values()
            .filter(|item| item.application == application)
            .cloned()
            .collect()
    }

    /// Distinct application names, sorted
    pub fn applications(&self) -> Vec<String> {
        self.items
            .values()
            .map(|item| item.application.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Operations that rebuild this bucket from scratch
    ///
    /// A checkpoint first so ids are not reused after compaction.
    pub fn snapshot(&self) -> Vec<Operation> {
        let mut operations = Vec::with_capacity(self.items.len() + 1);
        operations.push(Operation::Checkpoint {
            next_id: self.next_id,
        });
        operations.extend(
            self.items
                .values()
                .cloned()
                .map(|item| Operation::Put { item }),
        );
        operations
    }

    /// Remove every item; the id allocator keeps counting
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Self::new()
    }
}
