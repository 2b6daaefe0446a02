//! Configuration of a verification run: the hasher binding, the proof format, and witness limits.

use crate::witness::Witness;
use clap::ValueEnum;
use std::fmt;
use witness_mmr::{Blake2b, ByteCursor, Digest, Error, Hasher, Sha256};

/// Default cap on the size of each witness.
pub const DEFAULT_MAX_WITNESS_SIZE: usize = 32 * 1024;

/// Selects the [witness_mmr::Hasher] binding the MMR was built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum HasherKind {
    /// Blake2b-256 personalized with `ckb-default-hash`, leaves stored as-is.
    #[default]
    Ckb,
    /// SHA-256 with domain-separated leaves and nodes.
    Sha256,
}

impl HasherKind {
    /// Verify a proof of the given `format` with the selected binding.
    pub fn verify(
        self,
        format: ProofFormat,
        root: &Digest,
        size: u64,
        proof: &mut ByteCursor<'_>,
        leaves: &mut ByteCursor<'_>,
    ) -> Result<(), Error> {
        match self {
            HasherKind::Ckb => format.verify(&mut Blake2b, root, size, proof, leaves),
            HasherKind::Sha256 => format.verify(&mut Sha256::new(), root, size, proof, leaves),
        }
    }
}

impl fmt::Display for HasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HasherKind::Ckb => write!(f, "ckb"),
            HasherKind::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Selects how the proof witness is encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ProofFormat {
    /// Bare digests, verified in a single streaming pass ([witness_mmr::verify]).
    #[default]
    Compiled,
    /// Length-prefixed digests, collected before folding ([witness_mmr::verify_raw]).
    Raw,
}

impl ProofFormat {
    /// The witness a proof in this format is loaded from.
    pub const fn witness(self) -> Witness {
        match self {
            ProofFormat::Compiled => Witness::Proof,
            ProofFormat::Raw => Witness::RawProof,
        }
    }

    fn verify<H: Hasher>(
        self,
        hasher: &mut H,
        root: &Digest,
        size: u64,
        proof: &mut ByteCursor<'_>,
        leaves: &mut ByteCursor<'_>,
    ) -> Result<(), Error> {
        match self {
            ProofFormat::Compiled => witness_mmr::verify(hasher, root, size, proof, leaves),
            ProofFormat::Raw => witness_mmr::verify_raw(hasher, root, size, proof, leaves),
        }
    }
}

impl fmt::Display for ProofFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofFormat::Compiled => write!(f, "compiled"),
            ProofFormat::Raw => write!(f, "raw"),
        }
    }
}

/// Configuration for [crate::run].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The hasher binding the MMR was built with.
    pub hasher: HasherKind,

    /// The format of the proof, which also selects the witness it is loaded from.
    pub proof: ProofFormat,

    /// Maximum number of bytes loaded for any one witness.
    pub max_witness_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hasher: HasherKind::default(),
            proof: ProofFormat::default(),
            max_witness_size: DEFAULT_MAX_WITNESS_SIZE,
        }
    }
}
