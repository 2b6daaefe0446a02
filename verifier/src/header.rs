//! The header witness: the committed MMR size followed by the expected root.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use witness_mmr::{Digest, DIGEST_LENGTH};

/// Length of an encoded [Header].
pub const HEADER_LENGTH: usize = 8 + DIGEST_LENGTH;

/// Errors that can occur when decoding a [Header].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header must be {HEADER_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
}

/// The commitment a set of leaves is verified against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Number of nodes in the MMR.
    pub size: u64,
    /// Root of the MMR.
    pub root: Digest,
}

impl Header {
    /// Decode a header from exactly [HEADER_LENGTH] bytes.
    pub fn decode(mut buf: &[u8]) -> Result<Self, HeaderError> {
        if buf.len() != HEADER_LENGTH {
            return Err(HeaderError::InvalidLength(buf.len()));
        }
        let size = buf.get_u64_le();
        let mut root = Digest::default();
        buf.copy_to_slice(root.as_mut());
        Ok(Self { size, root })
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LENGTH);
        buf.put_u64_le(self.size);
        buf.put_slice(&self.root);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_header_layout() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&19u64.to_le_bytes());
        raw.extend_from_slice(&[0xcd; DIGEST_LENGTH]);

        let header = Header::decode(&raw).unwrap();
        assert_eq!(header.size, 19);
        assert_eq!(header.root, Digest::from([0xcd; DIGEST_LENGTH]));
        assert_eq!(header.encode(), raw);
    }

    #[test_case(0; "empty")]
    #[test_case(8; "size only")]
    #[test_case(39; "one short")]
    #[test_case(41; "one long")]
    fn test_header_invalid_length(len: usize) {
        assert_eq!(
            Header::decode(&vec![0u8; len]),
            Err(HeaderError::InvalidLength(len))
        );
    }
}
