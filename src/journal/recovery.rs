//! Journal Recovery
//!
//! Replays the store file on open and repairs torn writes.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::{Result, StoreError};

use super::entry::is_header_prefix;
use super::{Frame, JournalEntry, JournalReader, FILE_HEADER_SIZE};

/// Handles journal recovery after a crash
pub struct JournalRecovery;

/// Result of a recovery (or verification) pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of damaged tail entries discarded
    pub entries_corrupted: u64,

    /// Last valid sequence number (0 when empty)
    pub last_seq: u64,

    /// Whether a torn tail was (or, when verifying, would be) cut off
    pub was_truncated: bool,

    /// Length of the valid prefix of the file
    pub valid_len: u64,
}

impl JournalRecovery {
    /// Recover entries from a store file
    ///
    /// This will:
    /// 1. Read all valid entries in order
    /// 2. Truncate an incomplete or checksum-failing final entry
    /// 3. Fail with `Corruption` if damage is followed by more data
    ///
    /// A missing or empty file recovers to zero entries.
    pub fn recover(path: &Path) -> Result<(Vec<JournalEntry>, RecoveryResult)> {
        Self::scan(path, true)
    }

    /// Verify integrity of a store file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path, false).map(|(_, result)| result)
    }

    fn scan(path: &Path, repair: bool) -> Result<(Vec<JournalEntry>, RecoveryResult)> {
        let mut result = RecoveryResult::default();

        if !path.exists() {
            return Ok((Vec::new(), result));
        }

        let file_len = fs::metadata(path)?.len();
        if file_len == 0 {
            return Ok((Vec::new(), result));
        }

        if file_len < FILE_HEADER_SIZE {
            // Crash while the header itself was being written
            let bytes = fs::read(path)?;
            if !is_header_prefix(&bytes) {
                return Err(StoreError::Corruption(
                    "Not a centralconfig store file (bad magic)".to_string(),
                ));
            }
            result.was_truncated = true;
            if repair {
                Self::truncate(path, 0)?;
            }
            return Ok((Vec::new(), result));
        }

        let mut reader = JournalReader::open(path)?;
        let mut entries = Vec::new();

        loop {
            match reader.next_frame()? {
                Frame::Entry(entry) => {
                    if entry.seq <= result.last_seq {
                        return Err(StoreError::Corruption(format!(
                            "Out-of-order sequence {} after {}",
                            entry.seq, result.last_seq
                        )));
                    }
                    result.last_seq = entry.seq;
                    result.entries_recovered += 1;
                    entries.push(entry);
                }
                Frame::End => break,
                Frame::Incomplete | Frame::BadChecksum { at_tail: true } => {
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Frame::BadChecksum { at_tail: false } => {
                    return Err(StoreError::Corruption(format!(
                        "Checksum mismatch at offset {} with {} bytes following",
                        reader.position(),
                        reader.file_len() - reader.position()
                    )));
                }
            }
        }

        result.valid_len = reader.position();

        if result.was_truncated {
            tracing::warn!(
                path = %path.display(),
                valid_len = result.valid_len,
                file_len,
                "Discarding torn entry at end of store file"
            );
            if repair {
                Self::truncate(path, result.valid_len)?;
            }
        }

        Ok((entries, result))
    }

    fn truncate(path: &Path, len: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(len)?;
        file.sync_all()?;
        Ok(())
    }
}
