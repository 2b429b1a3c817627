//! Journal entry definitions
//!
//! Defines the structure and framing of individual journal entries.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::ConfigItem;

/// Magic bytes at the start of every store file
pub const MAGIC: &[u8; 4] = b"CCFG";

/// On-disk format version
pub const FORMAT_VERSION: u16 = 1;

/// File header size: magic (4) + version (2)
pub const FILE_HEADER_SIZE: u64 = 6;

/// Entry header size: seq (8) + crc (4) + len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload accepted when reading (16 MB)
pub const MAX_ENTRY_SIZE: u32 = 16 * 1024 * 1024;

/// A single entry in the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequence number - monotonically increasing within one file
    pub seq: u64,

    /// The mutation to apply
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Mutations that can be journaled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or overwrite an item (id already assigned)
    Put { item: ConfigItem },

    /// Remove the item with this id
    Delete { id: u64 },

    /// Id allocator high-water mark, written at the head of compacted files
    Checkpoint { next_id: u64 },
}

impl JournalEntry {
    pub fn new(seq: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            seq,
            operation,
            timestamp,
        }
    }

    /// Encode as a full frame: header + payload
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        if payload.len() > MAX_ENTRY_SIZE as usize {
            return Err(StoreError::JournalWrite(format!(
                "Entry too large: {} bytes (max {})",
                payload.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.seq.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);

        Ok(frame)
    }

    /// Decode a full frame produced by [`JournalEntry::serialize`]
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::Corruption(format!(
                "Incomplete entry header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let (seq, crc, len) = Self::decode_header(&bytes[..HEADER_SIZE]);
        let end = HEADER_SIZE + len as usize;
        if bytes.len() < end {
            return Err(StoreError::Corruption(format!(
                "Incomplete entry payload: expected {} bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let payload = &bytes[HEADER_SIZE..end];
        if !Self::checksum_matches(crc, payload) {
            return Err(StoreError::Corruption(format!(
                "Checksum mismatch for entry seq={}",
                seq
            )));
        }

        Self::decode_payload(seq, payload)
    }

    /// Split an entry header into (seq, crc, payload_len)
    ///
    /// `header` must be at least [`HEADER_SIZE`] bytes.
    pub fn decode_header(header: &[u8]) -> (u64, u32, u32) {
        let mut seq = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        seq.copy_from_slice(&header[0..8]);
        crc.copy_from_slice(&header[8..12]);
        len.copy_from_slice(&header[12..16]);

        (
            u64::from_le_bytes(seq),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len),
        )
    }

    pub fn checksum_matches(crc: u32, payload: &[u8]) -> bool {
        crc32fast::hash(payload) == crc
    }

    /// Decode a checksum-verified payload, checking it against the header seq
    pub fn decode_payload(seq: u64, payload: &[u8]) -> Result<Self> {
        let entry: JournalEntry = bincode::deserialize(payload)?;
        if entry.seq != seq {
            return Err(StoreError::Corruption(format!(
                "Sequence mismatch: header says {}, payload says {}",
                seq, entry.seq
            )));
        }
        Ok(entry)
    }
}

/// Write the file header (magic + version)
pub(crate) fn write_file_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())
}

/// Validate a file header read from disk
pub(crate) fn check_file_header(bytes: &[u8]) -> Result<()> {
    if bytes.len() < FILE_HEADER_SIZE as usize || &bytes[0..4] != MAGIC {
        return Err(StoreError::Corruption(
            "Not a centralconfig store file (bad magic)".to_string(),
        ));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(StoreError::Corruption(format!(
            "Unsupported store format version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    Ok(())
}

/// True when `bytes` could be the beginning of a file header cut short by a crash
pub(crate) fn is_header_prefix(bytes: &[u8]) -> bool {
    let mut header = Vec::with_capacity(FILE_HEADER_SIZE as usize);
    header.extend_from_slice(MAGIC);
    header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.len() < header.len() && header.starts_with(bytes)
}
