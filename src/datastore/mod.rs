//! Datastore Module
//!
//! The config store engine behind the HTTP layer.
//!
//! ## Backends
//! - [`FileStore`]: durable, single store file (journal + in-memory bucket)
//! - [`MemoryStore`]: process-lifetime only, for tests and small deployments
//!
//! ## Resolution
//! `get` walks [`ItemKey::resolution_order`](crate::model::ItemKey::resolution_order):
//! machine-specific, then application-wide, then global (`*`). The first hit
//! wins; no hit yields `ConfigItem::default()` rather than an error.

mod file;
mod memory;

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::ConfigItem;
use crate::settings::{DatastoreKind, DatastoreSettings};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Operations every config store backend provides
///
/// All methods take `&self` and are safe to call from many threads at once;
/// each backend serializes its own writers.
pub trait ConfigDatastore: Send + Sync {
    /// Create the backing storage if needed; `overwrite` resets it to empty
    fn init_store(&self, overwrite: bool) -> Result<()>;

    /// Insert or overwrite by (application, machine, name); returns the stored item
    fn set(&self, item: ConfigItem) -> Result<ConfigItem>;

    /// Most specific item for `query`, or the zero item when nothing matches
    fn get(&self, query: &ConfigItem) -> Result<ConfigItem>;

    /// Every stored item
    fn get_all(&self) -> Result<Vec<ConfigItem>>;

    /// Items whose application is exactly `application`
    fn get_all_for_application(&self, application: &str) -> Result<Vec<ConfigItem>>;

    /// Distinct application names across all items
    fn get_all_applications(&self) -> Result<Vec<String>>;

    /// Delete the item with exactly this (application, machine, name)
    fn remove(&self, item: &ConfigItem) -> Result<()>;
}

/// Build the datastore selected by `settings`
pub fn open_datastore(settings: &DatastoreSettings) -> Result<Arc<dyn ConfigDatastore>> {
    match settings.kind {
        DatastoreKind::File => {
            let config = StoreConfig::builder()
                .database(&settings.database)
                .build();
            Ok(Arc::new(FileStore::open(config)?))
        }
        DatastoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
