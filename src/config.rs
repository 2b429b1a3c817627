//! Store configuration
//!
//! Engine-level configuration with sensible defaults. Process-level settings
//! (server address, datastore selection) live in [`crate::settings`].

use std::path::PathBuf;

/// Configuration for a file-backed store instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single store file (journal of all items)
    pub database: PathBuf,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the journal
    pub sync_strategy: SyncStrategy,

    /// Journal entry count above which compaction is considered
    ///
    /// Compaction only runs when the journal also holds more than twice as
    /// many entries as there are live items.
    pub compaction_threshold: usize,
}

/// Journal sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries
    EveryNEntries { count: usize },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("config.db"),
            sync_strategy: SyncStrategy::EveryWrite,
            compaction_threshold: 1024,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the store file path
    pub fn database(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database = path.into();
        self
    }

    /// Set the journal sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the compaction threshold (journal entries)
    pub fn compaction_threshold(mut self, entries: usize) -> Self {
        self.config.compaction_threshold = entries;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
