//! In-memory datastore

use parking_lot::RwLock;

use crate::bucket::Bucket;
use crate::error::Result;
use crate::model::ConfigItem;

use super::ConfigDatastore;

/// Config store that lives only as long as the process
#[derive(Default)]
pub struct MemoryStore {
    bucket: RwLock<Bucket>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigDatastore for MemoryStore {
    fn init_store(&self, overwrite: bool) -> Result<()> {
        if overwrite {
            self.bucket.write().clear();
        }
        Ok(())
    }

    fn set(&self, item: ConfigItem) -> Result<ConfigItem> {
        let mut bucket = self.bucket.write();
        let stored = bucket.stage(item);
        bucket.put(stored.clone());
        Ok(stored)
    }

    fn get(&self, query: &ConfigItem) -> Result<ConfigItem> {
        Ok(self
            .bucket
            .read()
            .resolve(query)
            .cloned()
            .unwrap_or_default())
    }

    fn get_all(&self) -> Result<Vec<ConfigItem>> {
        Ok(self.bucket.read().items())
    }

    fn get_all_for_application(&self, application: &str) -> Result<Vec<ConfigItem>> {
        Ok(self.bucket.read().items_for_application(application))
    }

    fn get_all_applications(&self) -> Result<Vec<String>> {
        Ok(self.bucket.read().applications())
    }

    fn remove(&self, item: &ConfigItem) -> Result<()> {
        let mut bucket = self.bucket.write();
        if let Some(id) = bucket.find_id(&item.key()) {
            bucket.delete(id);
        }
        Ok(())
    }
}
