//! Journal Writer
//!
//! Appends entries to the store file and rewrites it during compaction.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{Result, StoreError};

use super::entry::write_file_header;
use super::{JournalEntry, JournalRecovery, Operation, RecoveryResult, FILE_HEADER_SIZE};

/// Failure injected into the writer's file I/O
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Write half the frame, then fail
    Write,
    /// Fail the fsync after a complete write
    Sync,
    /// Fail the fsync and the rollback that follows it
    SyncAndTruncate,
}

/// Writes entries to the store file
pub struct JournalWriter {
    path: PathBuf,
    file: File,

    /// Sequence number of the next appended entry
    next_seq: u64,

    /// Entries currently in the file
    entry_count: usize,

    /// Length of the file (always ends on a frame boundary)
    len: u64,

    sync_strategy: SyncStrategy,
    unsynced: usize,

    /// Set when a failed append could not be rolled back; the file may end
    /// in a partial frame, so no further appends are accepted until a rewrite
    broken: Option<String>,

    #[cfg(test)]
    fault: Option<Fault>,
}

impl JournalWriter {
    /// Open or create a store file, repairing a torn tail first
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let (_, recovery) = JournalRecovery::recover(path)?;
        Self::resume(path, sync_strategy, &recovery)
    }

    /// Open a store file that has already been recovered
    pub fn resume(
        path: &Path,
        sync_strategy: SyncStrategy,
        recovery: &RecoveryResult,
    ) -> Result<Self> {
        create_parent_dir(path)?;

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut len = file.metadata()?.len();

        if len == 0 {
            write_file_header(&mut file)?;
            file.sync_all()?;
            len = FILE_HEADER_SIZE;
        }

        Ok(Self::with_file(
            path,
            file,
            recovery.last_seq + 1,
            recovery.entries_recovered as usize,
            len,
            sync_strategy,
        ))
    }

    /// Start an empty store file, discarding whatever is at `path`
    ///
    /// Never reads the old contents, so it also replaces a damaged file.
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        create_parent_dir(path)?;

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.set_len(0)?;
        write_file_header(&mut file)?;
        file.sync_all()?;

        Ok(Self::with_file(
            path,
            file,
            1,
            0,
            FILE_HEADER_SIZE,
            sync_strategy,
        ))
    }

    /// Append an operation; returns its sequence number
    ///
    /// On any failure the frame is cut off again, so an `Err` means the
    /// operation is not in the file. If that cut fails too, the writer
    /// refuses further appends until [`JournalWriter::rewrite`] succeeds.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        if let Some(reason) = &self.broken {
            return Err(StoreError::JournalWrite(format!(
                "Journal unusable after failed rollback: {}",
                reason
            )));
        }

        let seq = self.next_seq;
        let frame = JournalEntry::new(seq, operation).serialize()?;

        if let Err(e) = self.write_frame(&frame) {
            return Err(self.roll_back(e));
        }

        let should_sync = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count.max(1),
        };
        if should_sync {
            if let Err(e) = self.sync_file() {
                return Err(self.roll_back(e));
            }
            self.unsynced = 0;
        } else {
            self.unsynced += 1;
        }

        self.len += frame.len() as u64;
        self.next_seq += 1;
        self.entry_count += 1;

        Ok(seq)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.sync_file()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Atomically replace the file with exactly `operations`
    ///
    /// Writes a sibling temp file, fsyncs it and renames it over the store
    /// file, so a crash leaves either the old or the new contents.
    pub fn rewrite<I>(&mut self, operations: I) -> Result<()>
    where
        I: IntoIterator<Item = Operation>,
    {
        let tmp_path = self.compaction_path();

        let mut count = 0usize;
        let mut len = FILE_HEADER_SIZE;
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;

            write_file_header(&mut tmp)?;
            for operation in operations {
                count += 1;
                let frame = JournalEntry::new(count as u64, operation).serialize()?;
                tmp.write_all(&frame)?;
                len += frame.len() as u64;
            }
            tmp.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;
        self.next_seq = count as u64 + 1;
        self.entry_count = count;
        self.len = len;
        self.unsynced = 0;
        self.broken = None;

        Ok(())
    }

    /// Whether the store file is still present on disk
    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }

    /// False once a failed append could not be rolled back
    pub fn is_writable(&self) -> bool {
        self.broken.is_none()
    }

    pub fn current_seq(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn file_len(&self) -> u64 {
        self.len
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn inject_fault(&mut self, fault: Option<Fault>) {
        self.fault = fault;
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn with_file(
        path: &Path,
        file: File,
        next_seq: u64,
        entry_count: usize,
        len: u64,
        sync_strategy: SyncStrategy,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            next_seq,
            entry_count,
            len,
            sync_strategy,
            unsynced: 0,
            broken: None,
            #[cfg(test)]
            fault: None,
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        if self.fault == Some(Fault::Write) {
            self.file.write_all(&frame[..frame.len() / 2])?;
            return Err(io::Error::other("injected write failure"));
        }

        self.file.write_all(frame)
    }

    fn sync_file(&mut self) -> io::Result<()> {
        #[cfg(test)]
        if matches!(self.fault, Some(Fault::Sync | Fault::SyncAndTruncate)) {
            return Err(io::Error::other("injected sync failure"));
        }

        self.file.sync_data()
    }

    fn truncate_file(&mut self, len: u64) -> io::Result<()> {
        #[cfg(test)]
        if self.fault == Some(Fault::SyncAndTruncate) {
            return Err(io::Error::other("injected truncate failure"));
        }

        self.file.set_len(len)?;
        self.file.sync_data()
    }

    /// Cut the file back to the last good frame after a failed append
    fn roll_back(&mut self, cause: io::Error) -> StoreError {
        match self.truncate_file(self.len) {
            Ok(()) => StoreError::JournalWrite(cause.to_string()),
            Err(e) => {
                let reason = format!("{} (rollback failed: {})", cause, e);
                tracing::error!(
                    path = %self.path.display(),
                    error = %reason,
                    "Store file may end in a partial entry; appends disabled"
                );
                self.broken = Some(reason.clone());
                StoreError::JournalWrite(reason)
            }
        }
    }

    fn compaction_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".compact");
        self.path.with_file_name(name)
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
