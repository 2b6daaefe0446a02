use core::{fmt, ops::Deref};

/// Length of every digest, leaf value and root handled by this crate.
pub const DIGEST_LENGTH: usize = 32;

/// A 32-byte digest.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_LENGTH]);

impl Digest {
    /// Return the underlying bytes.
    pub const fn to_bytes(self) -> [u8; DIGEST_LENGTH] {
        self.0
    }
}

impl From<[u8; DIGEST_LENGTH]> for Digest {
    fn from(value: [u8; DIGEST_LENGTH]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for Digest {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl Deref for Digest {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_display() {
        let mut bytes = [0u8; DIGEST_LENGTH];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let digest = Digest::from(bytes);
        assert_eq!(
            digest.to_string(),
            "ab00000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(
            format!("{digest:?}"),
            "Digest(ab00000000000000000000000000000000000000000000000000000000000001)"
        );
        assert_eq!(digest.to_bytes(), bytes);
        assert_eq!(&digest[..], &bytes[..]);
    }
}
