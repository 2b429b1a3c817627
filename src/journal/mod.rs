//! Store Journal Module
//!
//! The single store file behind [`crate::datastore::FileStore`]: an
//! append-only log of item mutations, replayed into a
//! [`Bucket`](crate::bucket::Bucket) on open.
//!
//! ## Responsibilities
//! - Append an entry before any in-memory mutation becomes visible
//! - CRC32 checksums for corruption detection
//! - Sequence numbers for ordering
//! - Torn-write recovery and compaction
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ File Header                             │
//! │ ┌──────────────┬──────────────┐         │
//! │ │ Magic "CCFG" │ Version (2)  │         │
//! │ └──────────────┴──────────────┘         │
//! ├─────────────────────────────────────────┤
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ Seq (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2 ...                             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! `Data` is the bincode encoding of a [`JournalEntry`]; the CRC covers
//! `Data` only. All integers are little-endian.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{
    JournalEntry, Operation, FILE_HEADER_SIZE, FORMAT_VERSION, HEADER_SIZE, MAGIC,
    MAX_ENTRY_SIZE,
};
pub use reader::{Frame, JournalIterator, JournalReader};
pub use recovery::{JournalRecovery, RecoveryResult};
pub use writer::JournalWriter;

#[cfg(test)]
pub(crate) use writer::Fault;
