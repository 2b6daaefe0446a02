//! A zero-copy reader over a borrowed byte buffer.

use crate::{Digest, Error, DIGEST_LENGTH};
use bytes::Buf;

/// Reads fixed-size chunks from a borrowed buffer, front to back.
///
/// A read either returns exactly the requested number of bytes and advances, or fails with
/// [Error::BufferExhausted] and leaves the cursor where it was.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Return a new cursor positioned at the start of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Return the next `n` bytes.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let remaining = self.remaining();
        if remaining < n {
            return Err(Error::BufferExhausted {
                requested: n,
                remaining,
            });
        }
        let chunk = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(chunk)
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let mut chunk = self.read(2)?;
        Ok(chunk.get_u16_le())
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let mut chunk = self.read(8)?;
        Ok(chunk.get_u64_le())
    }

    /// Read a [Digest].
    pub fn read_digest(&mut self) -> Result<Digest, Error> {
        let mut digest = Digest::default();
        self.read(DIGEST_LENGTH)?.copy_to_slice(digest.as_mut());
        Ok(digest)
    }

    /// Number of bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Number of bytes read so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}
