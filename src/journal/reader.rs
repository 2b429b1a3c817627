//! Journal Reader
//!
//! Reads entries sequentially from a store file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, StoreError};

use super::entry::check_file_header;
use super::{JournalEntry, FILE_HEADER_SIZE, HEADER_SIZE, MAX_ENTRY_SIZE};

/// Outcome of reading one frame
#[derive(Debug)]
pub enum Frame {
    /// A complete, checksum-verified entry
    Entry(JournalEntry),

    /// Clean end of file
    End,

    /// The file ends in the middle of a frame
    Incomplete,

    /// A complete frame whose checksum does not match (or whose length is
    /// implausible); `at_tail` is true when nothing follows it
    BadChecksum { at_tail: bool },
}

/// Reads entries from the store file
pub struct JournalReader {
    reader: BufReader<File>,

    /// Offset of the first byte not yet consumed by a good entry
    position: u64,

    file_len: u64,
}

impl JournalReader {
    /// Open a store file for reading and validate its header
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; FILE_HEADER_SIZE as usize];
        let read = read_fully(&mut reader, &mut header)?;
        check_file_header(&header[..read])?;

        Ok(Self {
            reader,
            position: FILE_HEADER_SIZE,
            file_len,
        })
    }

    /// Read the next frame
    ///
    /// After `Frame::Entry`, [`JournalReader::position`] points past it; after
    /// any other outcome it still points at the start of the offending frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let mut header = [0u8; HEADER_SIZE];
        let read = read_fully(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(Frame::End);
        }
        if read < HEADER_SIZE {
            return Ok(Frame::Incomplete);
        }

        let (seq, crc, len) = JournalEntry::decode_header(&header);
        let frame_end = self.position + HEADER_SIZE as u64 + len as u64;

        if len > MAX_ENTRY_SIZE {
            // Length field itself is garbage; nothing after it can be framed.
            return Ok(Frame::BadChecksum {
                at_tail: frame_end >= self.file_len,
            });
        }

        let mut payload = vec![0u8; len as usize];
        let read = read_fully(&mut self.reader, &mut payload)?;
        if read < payload.len() {
            return Ok(Frame::Incomplete);
        }

        if !JournalEntry::checksum_matches(crc, &payload) {
            return Ok(Frame::BadChecksum {
                at_tail: frame_end == self.file_len,
            });
        }

        let entry = JournalEntry::decode_payload(seq, &payload)?;
        self.position = frame_end;
        Ok(Frame::Entry(entry))
    }

    /// Read the next entry, treating any damage as corruption
    pub fn next_entry(&mut self) -> Result<Option<JournalEntry>> {
        match self.next_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Incomplete => Err(StoreError::Corruption(format!(
                "Incomplete entry at offset {}",
                self.position
            ))),
            Frame::BadChecksum { .. } => Err(StoreError::Corruption(format!(
                "Checksum mismatch at offset {}",
                self.position
            ))),
        }
    }

    /// Iterate over all entries
    pub fn entries(self) -> JournalIterator {
        JournalIterator {
            reader: self,
            done: false,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }
}

/// Iterator over journal entries; stops after the first error
pub struct JournalIterator {
    reader: JournalReader,
    done: bool,
}

impl Iterator for JournalIterator {
    type Item = Result<JournalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or EOF; returns bytes read
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
