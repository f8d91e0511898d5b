use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::TransferError;
use crate::types::Chunk;

/// Hex SHA-256 of one chunk, as sent in the chunk header.
pub fn checksum_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Splits a file into upload chunks, each tagged with its offset and checksum.
///
/// The size is fixed when the file is opened. A file that shrinks or grows
/// before the last chunk is handed out yields [`TransferError::SizeChanged`],
/// so a partially written file is never reported as fully sent.
///
/// All reads are blocking.
pub struct ChunkReader {
    file: File,
    chunk_size: usize,
    file_size: u64,
    sent: u64,
}

impl ChunkReader {
    /// A `chunk_size` of 0 is read as 1.
    pub fn new(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            chunk_size: chunk_size.max(1),
            file_size,
            sent: 0,
        })
    }

    /// Size recorded at open time.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Returns the next chunk, or `None` once `file_size` bytes were read.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let left = self.file_size - self.sent;
        if left == 0 {
            self.ensure_no_trailing_bytes()?;
            return Ok(None);
        }

        let len = left.min(self.chunk_size as u64) as usize;
        let mut data = vec![0u8; len];
        match self.file.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(self.size_changed());
            }
            Err(e) => return Err(e.into()),
        }

        let chunk = Chunk {
            offset: self.sent,
            checksum: checksum_bytes(&data),
            data,
        };
        self.sent += len as u64;
        Ok(Some(chunk))
    }

    fn ensure_no_trailing_bytes(&mut self) -> Result<(), TransferError> {
        let mut extra = [0u8; 1];
        if self.file.read(&mut extra)? > 0 {
            return Err(self.size_changed());
        }
        Ok(())
    }

    fn size_changed(&self) -> TransferError {
        let actual = self
            .file
            .metadata()
            .map(|m| m.len())
            .unwrap_or(self.sent);
        TransferError::SizeChanged {
            expected: self.file_size,
            actual,
        }
    }
}
