//! Build a random MMR, prove a random subset of its leaves, and emit the witnesses (with the proof
//! in both the compiled and the raw format).

use crate::{run, Config, Directory, Failure, HasherKind, Header, Memory, ProofFormat, Witness};
use bytes::Bytes;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::{io, ops::Range};
use thiserror::Error;
use witness_mmr::{
    mem::{encode_leaves, Mmr},
    position::leaf_pos_to_num,
    Blake2b, Digest, Hasher, Sha256, DIGEST_LENGTH,
};

/// Range the number of leaves is drawn from when not specified.
pub const DEFAULT_ELEMENTS: Range<u64> = 1_000..3_000;

/// Range the number of proven leaves is drawn from when not specified.
pub const DEFAULT_SELECTED: Range<usize> = 1..100;

/// Errors that can occur when generating a [Fixture].
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot select {selected} of {elements} leaves")]
    InvalidSelection { selected: usize, elements: u64 },
    #[error("failed to build proof: {0}")]
    Mmr(#[from] witness_mmr::Error),
    #[error("generated witnesses do not verify: {0}")]
    SelfCheck(#[from] Failure),
    #[error("failed to write {witness} witness: {source}")]
    Write {
        witness: Witness,
        #[source]
        source: io::Error,
    },
}

/// Options for [generate].
#[derive(Clone, Debug)]
pub struct Options {
    /// Seed of every random choice.
    pub seed: u64,

    /// Number of leaves added to the MMR, random if None.
    pub elements: Option<u64>,

    /// Number of leaves proven, random if None.
    pub selected: Option<usize>,

    /// Binding the MMR is built with.
    pub hasher: HasherKind,
}

/// The witnesses proving a set of leaves.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub header: Header,
    pub proof: Bytes,
    pub raw_proof: Bytes,
    pub leaves: Bytes,

    /// Number of leaves in the MMR.
    pub elements: u64,

    /// Positions of the proven leaves.
    pub positions: Vec<u64>,
}

impl Fixture {
    /// Return a [Memory] source holding the witnesses.
    pub fn source(&self) -> Memory {
        let mut source = Memory::new(self.header.encode(), self.proof.clone(), self.leaves.clone());
        source.set(Witness::RawProof, self.raw_proof.clone());
        source
    }

    /// Return the leaf number (insertion index) of each proven leaf.
    pub fn leaf_numbers(&self) -> Vec<u64> {
        self.positions
            .iter()
            .filter_map(|&pos| leaf_pos_to_num(pos))
            .collect()
    }

    /// Write the witnesses to `directory`.
    pub fn store(&self, directory: &Directory) -> Result<(), Error> {
        let header = self.header.encode();
        for (witness, data) in [
            (Witness::Header, &header),
            (Witness::Proof, &self.proof),
            (Witness::Leaves, &self.leaves),
            (Witness::RawProof, &self.raw_proof),
        ] {
            directory
                .store(witness, data)
                .map_err(|source| Error::Write { witness, source })?;
        }
        Ok(())
    }
}

/// Build an MMR of random leaves and prove a random, sorted subset of them.
///
/// The witnesses are verified before being returned.
pub fn generate(options: &Options) -> Result<Fixture, Error> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let elements = options
        .elements
        .unwrap_or_else(|| rng.gen_range(DEFAULT_ELEMENTS));
    let selected = options
        .selected
        .unwrap_or_else(|| rng.gen_range(DEFAULT_SELECTED));
    if selected == 0 || selected as u64 > elements {
        return Err(Error::InvalidSelection { selected, elements });
    }

    let fixture = match options.hasher {
        HasherKind::Ckb => build(&mut Blake2b, &mut rng, elements, selected)?,
        HasherKind::Sha256 => build(&mut Sha256::new(), &mut rng, elements, selected)?,
    };
    let source = fixture.source();
    for proof in [ProofFormat::Compiled, ProofFormat::Raw] {
        let config = Config {
            hasher: options.hasher,
            proof,
            max_witness_size: usize::MAX,
        };
        run(&source, &config)?;
    }
    Ok(fixture)
}

fn build<H: Hasher>(
    hasher: &mut H,
    rng: &mut StdRng,
    elements: u64,
    selected: usize,
) -> Result<Fixture, Error> {
    let mut mmr = Mmr::new();
    let mut leaves = Vec::new();
    for _ in 0..elements {
        let mut leaf = [0u8; DIGEST_LENGTH];
        rng.fill(&mut leaf[..]);
        let leaf = Digest::from(leaf);
        leaves.push((mmr.add(hasher, &leaf), leaf));
    }

    let mut chosen: Vec<(u64, Digest)> = leaves.choose_multiple(rng, selected).copied().collect();
    chosen.sort();
    let positions: Vec<u64> = chosen.iter().map(|(pos, _)| *pos).collect();
    let proof = mmr.proof(hasher, &positions)?;

    Ok(Fixture {
        header: Header {
            size: mmr.size(),
            root: mmr.root(hasher)?,
        },
        proof: proof.encode(),
        raw_proof: proof.encode_raw(),
        leaves: encode_leaves(&chosen),
        elements,
        positions,
    })
}
