//! File-backed datastore
//!
//! Couples the store journal with an in-memory bucket.

use std::path::Path;

use parking_lot::{Mutex, RwLock};

use crate::bucket::Bucket;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::journal::{JournalRecovery, JournalWriter, Operation};
use crate::model::ConfigItem;

use super::ConfigDatastore;

/// Durable config store backed by a single file
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (set/remove/init): serialized by the `journal` mutex
///   - Stage against a read view of the bucket
///   - Append to the journal (fsync per [`SyncStrategy`](crate::config::SyncStrategy))
///   - Apply to the bucket under its write lock
///
/// - **Reads** (get/list): bucket read lock only, never wait on journal I/O
///
/// Holding the journal mutex across stage and apply means no other writer
/// can change the bucket in between.
pub struct FileStore {
    config: StoreConfig,

    /// Append-only store file (also the writer lock)
    journal: Mutex<JournalWriter>,

    /// Current items, rebuilt from the journal on open
    bucket: RwLock<Bucket>,
}

impl FileStore {
    /// Open or create the store file named by `config`
    ///
    /// On startup:
    /// 1. Recover entries, cutting off a torn tail
    /// 2. Replay them into a fresh bucket
    /// 3. Open the journal for appending (writing a header if new)
    pub fn open(config: StoreConfig) -> Result<Self> {
        let path = config.database.clone();

        let (entries, recovery) = JournalRecovery::recover(&path)?;

        let mut bucket = Bucket::new();
        for entry in &entries {
            bucket.apply(&entry.operation);
        }

        if recovery.entries_recovered > 0 || recovery.was_truncated {
            tracing::info!(
                path = %path.display(),
                entries = recovery.entries_recovered,
                discarded = recovery.entries_corrupted,
                items = bucket.len(),
                "Recovered config store"
            );
        }

        let journal = JournalWriter::resume(&path, config.sync_strategy, &recovery)?;

        Ok(Self {
            config,
            journal: Mutex::new(journal),
            bucket: RwLock::new(bucket),
        })
    }

    /// Start an empty store at `config.database`, replacing any existing file
    ///
    /// The old file is never read, so this also resets a damaged store that
    /// [`FileStore::open`] refuses.
    pub fn create(config: StoreConfig) -> Result<Self> {
        let journal = JournalWriter::create(&config.database, config.sync_strategy)?;

        tracing::warn!(path = %config.database.display(), "Created empty config store");

        Ok(Self {
            config,
            journal: Mutex::new(journal),
            bucket: RwLock::new(Bucket::new()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses the default config with the specified store file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(StoreConfig::builder().database(path).build())
    }

    /// Rewrite the journal as one entry per live item
    pub fn compact(&self) -> Result<()> {
        let mut journal = self.journal.lock();
        self.compact_locked(&mut journal)
    }

    /// Flush any unsynced journal entries
    pub fn sync(&self) -> Result<()> {
        self.journal.lock().sync()
    }

    /// Sync and close the store
    pub fn close(self) -> Result<()> {
        self.journal.into_inner().sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn path(&self) -> &Path {
        &self.config.database
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Entries currently in the store file
    pub fn journal_entry_count(&self) -> usize {
        self.journal.lock().entry_count()
    }

    pub fn item_count(&self) -> usize {
        self.bucket.read().len()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Journal then apply; caller holds the journal lock
    ///
    /// A failed append leaves nothing in the file, so the bucket is only
    /// touched once the entry is written.
    fn commit(&self, journal: &mut JournalWriter, operation: Operation) -> Result<()> {
        journal.append(operation.clone())?;
        self.bucket.write().apply(&operation);

        // The write is durable at this point; a failed compaction only
        // leaves a longer journal behind.
        if let Err(e) = self.maybe_compact(journal) {
            tracing::warn!(error = %e, "Compaction failed");
        }
        Ok(())
    }

    fn maybe_compact(&self, journal: &mut JournalWriter) -> Result<()> {
        let entries = journal.entry_count();
        let live = self.bucket.read().len();

        if entries > self.config.compaction_threshold && entries > live * 2 {
            self.compact_locked(journal)?;
        }
        Ok(())
    }

    fn compact_locked(&self, journal: &mut JournalWriter) -> Result<()> {
        let before = journal.entry_count();
        let snapshot = self.bucket.read().snapshot();
        journal.rewrite(snapshot)?;

        tracing::debug!(
            path = %self.config.database.display(),
            before,
            after = journal.entry_count(),
            "Compacted config store"
        );
        Ok(())
    }
}

impl ConfigDatastore for FileStore {
    fn init_store(&self, overwrite: bool) -> Result<()> {
        let mut journal = self.journal.lock();

        if overwrite {
            let mut bucket = self.bucket.write();
            journal.rewrite([Operation::Checkpoint {
                next_id: bucket.next_id(),
            }])?;
            bucket.clear();
            tracing::warn!(path = %self.config.database.display(), "Config store reset");
            return Ok(());
        }

        if !journal.file_exists() {
            // Removed from under us; recreate from what we hold in memory
            let snapshot = self.bucket.read().snapshot();
            journal.rewrite(snapshot)?;
            tracing::info!(path = %self.config.database.display(), "Config store recreated");
        }

        journal.sync()
    }

    fn set(&self, item: ConfigItem) -> Result<ConfigItem> {
        let mut journal = self.journal.lock();

        let stored = self.bucket.read().stage(item);
        self.commit(
            &mut journal,
            Operation::Put {
                item: stored.clone(),
            },
        )?;

        tracing::debug!(
            id = stored.id,
            application = %stored.application,
            machine = %stored.machine,
            name = %stored.name,
            "Config item set"
        );
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
        let mut journal = self.journal.lock();

        let Some(id) = self.bucket.read().find_id(&item.key()) else {
            return Ok(());
        };
        self.commit(&mut journal, Operation::Delete { id })?;

        tracing::debug!(
            id,
            application = %item.application,
            machine = %item.machine,
            name = %item.name,
            "Config item removed"
        );
        Ok(())
    }
}
