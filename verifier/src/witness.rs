//! Sources of the witnesses consumed by a verification: the header, a proof (compiled or raw),
//! and the leaves.

use bytes::Bytes;
use std::{
    fmt,
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// One of the byte blobs supplied to a verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Witness {
    /// MMR size (`u64`, little-endian) followed by the expected root.
    Header,
    /// Proof items, back to back.
    Proof,
    /// Leaf records, back to back.
    Leaves,
    /// Length-prefixed proof items, back to back.
    RawProof,
}

impl Witness {
    /// Every witness, in index order.
    pub const ALL: [Witness; 4] = [
        Witness::Header,
        Witness::Proof,
        Witness::Leaves,
        Witness::RawProof,
    ];

    /// Index of the witness in the input it is loaded from.
    pub const fn index(self) -> usize {
        match self {
            Witness::Header => 0,
            Witness::Proof => 1,
            Witness::Leaves => 2,
            Witness::RawProof => 3,
        }
    }

    /// Name of the file holding the witness in a [Directory].
    pub const fn file_name(self) -> &'static str {
        match self {
            Witness::Header => "header.bin",
            Witness::Proof => "proof.bin",
            Witness::Leaves => "leaves.bin",
            Witness::RawProof => "raw_proof.bin",
        }
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Witness::Header => write!(f, "header"),
            Witness::Proof => write!(f, "proof"),
            Witness::Leaves => write!(f, "leaves"),
            Witness::RawProof => write!(f, "raw proof"),
        }
    }
}

/// Errors that can occur when loading a witness.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{0} witness not found")]
    Missing(Witness),
    #[error("{witness} witness exceeds {limit} bytes")]
    TooLarge { witness: Witness, limit: usize },
    #[error("failed to read {witness} witness: {source}")]
    Io {
        witness: Witness,
        #[source]
        source: io::Error,
    },
}

/// Something witnesses can be loaded from.
pub trait Source {
    /// Load `witness`, failing if it holds more than `limit` bytes.
    fn load(&self, witness: Witness, limit: usize) -> Result<Bytes, LoadError>;
}

/// Witnesses stored as files in a directory (see [Witness::file_name]).
#[derive(Clone, Debug)]
pub struct Directory {
    path: PathBuf,
}

impl Directory {
    /// Return a new [Directory] rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the directory the witness files live in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` as `witness`, creating the directory if needed.
    pub fn store(&self, witness: Witness, data: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.path)?;
        fs::write(self.path.join(witness.file_name()), data)
    }
}

impl Source for Directory {
    fn load(&self, witness: Witness, limit: usize) -> Result<Bytes, LoadError> {
        let file = match File::open(self.path.join(witness.file_name())) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::Missing(witness))
            }
            Err(source) => return Err(LoadError::Io { witness, source }),
        };

        // Read at most one byte past the limit to detect oversized witnesses without reading them
        // in full.
        let mut data = Vec::new();
        file.take((limit as u64).saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|source| LoadError::Io { witness, source })?;
        if data.len() > limit {
            return Err(LoadError::TooLarge { witness, limit });
        }
        Ok(Bytes::from(data))
    }
}

/// Witnesses held in memory.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    witnesses: [Option<Bytes>; 4],
}

impl Memory {
    /// Return a [Memory] source holding the header, the compiled proof, and the leaves. A raw proof
    /// can be added with [Memory::set].
    pub fn new(
        header: impl Into<Bytes>,
        proof: impl Into<Bytes>,
        leaves: impl Into<Bytes>,
    ) -> Self {
        Self {
            witnesses: [
                Some(header.into()),
                Some(proof.into()),
                Some(leaves.into()),
                None,
            ],
        }
    }

    /// Set (or replace) `witness`.
    pub fn set(&mut self, witness: Witness, data: impl Into<Bytes>) {
        self.witnesses[witness.index()] = Some(data.into());
    }

    /// Remove `witness`, if present.
    pub fn remove(&mut self, witness: Witness) {
        self.witnesses[witness.index()] = None;
    }
}

impl Source for Memory {
    fn load(&self, witness: Witness, limit: usize) -> Result<Bytes, LoadError> {
        let data = self.witnesses[witness.index()]
            .clone()
            .ok_or(LoadError::Missing(witness))?;
        if data.len() > limit {
            return Err(LoadError::TooLarge { witness, limit });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_witness_indices_and_names() {
        for (i, witness) in Witness::ALL.iter().enumerate() {
            assert_eq!(witness.index(), i);
        }
        assert_eq!(Witness::Proof.file_name(), "proof.bin");
        assert_eq!(Witness::Leaves.to_string(), "leaves");
        assert_eq!(Witness::RawProof.index(), 3);
        assert_eq!(Witness::RawProof.file_name(), "raw_proof.bin");
    }

    #[test]
    fn test_memory_source() {
        let mut source = Memory::new(vec![1u8; 40], vec![2u8; 64], vec![3u8; 40]);
        assert_eq!(source.load(Witness::Proof, 64).unwrap(), vec![2u8; 64]);
        assert!(matches!(
            source.load(Witness::Proof, 63),
            Err(LoadError::TooLarge {
                witness: Witness::Proof,
                limit: 63
            })
        ));

        source.remove(Witness::Leaves);
        assert!(matches!(
            source.load(Witness::Leaves, 1024),
            Err(LoadError::Missing(Witness::Leaves))
        ));
        source.set(Witness::Leaves, Bytes::new());
        assert!(source.load(Witness::Leaves, 0).unwrap().is_empty());

        assert!(matches!(
            source.load(Witness::RawProof, 1024),
            Err(LoadError::Missing(Witness::RawProof))
        ));
        source.set(Witness::RawProof, vec![4u8; 34]);
        assert_eq!(source.load(Witness::RawProof, 34).unwrap(), vec![4u8; 34]);
    }

    #[test]
    fn test_directory_source() {
        let path = env::temp_dir().join(format!("witness_directory_{}", rand::random::<u64>()));
        let directory = Directory::new(&path);
        assert!(matches!(
            directory.load(Witness::Header, 40),
            Err(LoadError::Missing(Witness::Header))
        ));

        directory.store(Witness::Header, &[7u8; 40]).unwrap();
        directory.store(Witness::Proof, &[]).unwrap();
        assert_eq!(directory.load(Witness::Header, 40).unwrap(), vec![7u8; 40]);
        assert!(directory.load(Witness::Proof, 0).unwrap().is_empty());
        assert!(matches!(
            directory.load(Witness::Header, 39),
            Err(LoadError::TooLarge {
                witness: Witness::Header,
                limit: 39
            })
        ));

        fs::remove_dir_all(&path).unwrap();
    }
}
