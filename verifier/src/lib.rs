//! Load MMR witnesses, verify them, and map the outcome to a status code.
//!
//! A verification consumes three witnesses (see [Witness]): a 40-byte [Header] holding the size
//! and root of the MMR, a proof stream, and a leaf stream. The proof is either compiled (bare
//! digests, [Witness::Proof]) or raw (length-prefixed digests, [Witness::RawProof]), as selected
//! by [Config::proof]. Witnesses are loaded from a [Source] (a [Directory] of files, or [Memory]),
//! each capped at [Config::max_witness_size] bytes, and then handed to [witness_mmr::verify] or
//! [witness_mmr::verify_raw].
//!
//! Every outcome maps to a [Status]:
//!
//! | code | status            |
//! |------|-------------------|
//! | 0    | success           |
//! | 1    | witness not loaded |
//! | 2    | malformed header  |
//! | 3    | buffer exhausted  |
//! | 4    | root mismatch     |
//! | 5    | invalid MMR size  |
//! | 6    | malformed proof or leaves |

use tracing::debug;
use witness_mmr::ByteCursor;

mod config;
pub use config::{Config, HasherKind, ProofFormat, DEFAULT_MAX_WITNESS_SIZE};
pub mod generate;
mod header;
pub use header::{Header, HeaderError, HEADER_LENGTH};
mod status;
pub use status::{Failure, Status};
mod witness;
pub use witness::{Directory, LoadError, Memory, Source, Witness};

/// Load every witness from `source` and verify the leaves against the header.
pub fn run<S: Source>(source: &S, config: &Config) -> Result<(), Failure> {
    let header = source.load(Witness::Header, config.max_witness_size)?;
    let header = Header::decode(&header)?;
    let proof = source.load(config.proof.witness(), config.max_witness_size)?;
    let leaves = source.load(Witness::Leaves, config.max_witness_size)?;
    debug!(
        size = header.size,
        root = %header.root,
        proof = proof.len(),
        leaves = leaves.len(),
        hasher = %config.hasher,
        format = %config.proof,
        "loaded witnesses"
    );

    config.hasher.verify(
        config.proof,
        &header.root,
        header.size,
        &mut ByteCursor::new(&proof),
        &mut ByteCursor::new(&leaves),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate, Fixture, Options};
    use std::{env, fs};
    use witness_mmr::{Digest, DIGEST_LENGTH, LEAF_RECORD_LENGTH, RAW_PROOF_ITEM_LENGTH};

    fn fixture(hasher: HasherKind) -> Fixture {
        generate(&Options {
            seed: 7,
            elements: Some(40),
            selected: Some(5),
            hasher,
        })
        .unwrap()
    }

    fn config(hasher: HasherKind) -> Config {
        Config {
            hasher,
            ..Config::default()
        }
    }

    fn raw(hasher: HasherKind) -> Config {
        Config {
            hasher,
            proof: ProofFormat::Raw,
            ..Config::default()
        }
    }

    #[test]
    fn test_run_success() {
        for hasher in [HasherKind::Ckb, HasherKind::Sha256] {
            let fixture = fixture(hasher);
            assert!(run(&fixture.source(), &config(hasher)).is_ok());
            assert!(run(&fixture.source(), &raw(hasher)).is_ok());
        }
    }

    #[test]
    fn test_run_raw_proof_format() {
        let fixture = fixture(HasherKind::Ckb);

        // Each format reads only its own proof witness.
        let mut source = fixture.source();
        source.remove(Witness::Proof);
        assert!(run(&source, &raw(HasherKind::Ckb)).is_ok());
        let mut source = fixture.source();
        source.remove(Witness::RawProof);
        assert!(run(&source, &config(HasherKind::Ckb)).is_ok());

        // A compiled proof is not a raw proof.
        let mut source = fixture.source();
        source.set(Witness::RawProof, fixture.proof.clone());
        assert!(run(&source, &raw(HasherKind::Ckb)).is_err());

        // Leaves may come in any order.
        let mut source = fixture.source();
        let mut leaves: Vec<&[u8]> = fixture.leaves.chunks(LEAF_RECORD_LENGTH).collect();
        leaves.reverse();
        source.set(Witness::Leaves, leaves.concat());
        assert!(run(&source, &raw(HasherKind::Ckb)).is_ok());
        assert_eq!(
            run(&source, &config(HasherKind::Ckb))
                .unwrap_err()
                .status(),
            Status::MalformedProof
        );

        // Tampered digest.
        let mut source = fixture.source();
        let mut tampered = fixture.raw_proof.to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        source.set(Witness::RawProof, tampered);
        assert_eq!(
            run(&source, &raw(HasherKind::Ckb)).unwrap_err().status(),
            Status::RootMismatch
        );

        // Missing item.
        let mut source = fixture.source();
        source.set(
            Witness::RawProof,
            fixture
                .raw_proof
                .slice(..fixture.raw_proof.len() - RAW_PROOF_ITEM_LENGTH),
        );
        assert_eq!(
            run(&source, &raw(HasherKind::Ckb)).unwrap_err().status(),
            Status::BufferExhausted
        );

        // Wrong item length.
        let mut source = fixture.source();
        let mut bad = fixture.raw_proof.to_vec();
        bad[0] = 31;
        source.set(Witness::RawProof, bad);
        assert_eq!(
            run(&source, &raw(HasherKind::Ckb)).unwrap_err().status(),
            Status::MalformedProof
        );
    }

    #[test]
    fn test_run_wrong_hasher() {
        let fixture = fixture(HasherKind::Ckb);
        let failure = run(&fixture.source(), &config(HasherKind::Sha256)).unwrap_err();
        assert_eq!(failure.status(), Status::RootMismatch);
    }

    #[test]
    fn test_run_missing_witness() {
        let fixture = fixture(HasherKind::Ckb);
        for config in [config(HasherKind::Ckb), raw(HasherKind::Ckb)] {
            for witness in [Witness::Header, config.proof.witness(), Witness::Leaves] {
                let mut source = fixture.source();
                source.remove(witness);
                let failure = run(&source, &config).unwrap_err();
                assert!(matches!(failure, Failure::Load(LoadError::Missing(w)) if w == witness));
                assert_eq!(failure.status(), Status::LoadFailed);
            }
        }
    }

    #[test]
    fn test_run_witness_limit() {
        let fixture = fixture(HasherKind::Ckb);
        let config = Config {
            max_witness_size: fixture.proof.len() - 1,
            ..Config::default()
        };
        let failure = run(&fixture.source(), &config).unwrap_err();
        assert!(matches!(
            failure,
            Failure::Load(LoadError::TooLarge {
                witness: Witness::Proof,
                ..
            })
        ));
    }

    #[test]
    fn test_run_malformed_header() {
        let fixture = fixture(HasherKind::Ckb);
        let mut source = fixture.source();
        source.set(Witness::Header, fixture.header.encode().slice(..HEADER_LENGTH - 1));
        let failure = run(&source, &Config::default()).unwrap_err();
        assert_eq!(failure.status(), Status::MalformedHeader);
    }

    #[test]
    fn test_run_status_codes() {
        let fixture = fixture(HasherKind::Ckb);
        let header = fixture.header;

        // Truncated proof.
        let mut source = fixture.source();
        source.set(Witness::Proof, fixture.proof.slice(..fixture.proof.len() - 1));
        let failure = run(&source, &Config::default()).unwrap_err();
        assert_eq!(failure.status(), Status::BufferExhausted);

        // Wrong root.
        let mut source = fixture.source();
        let wrong = Header {
            root: Digest::from([0u8; DIGEST_LENGTH]),
            ..header
        };
        source.set(Witness::Header, wrong.encode());
        let failure = run(&source, &Config::default()).unwrap_err();
        assert_eq!(failure.status(), Status::RootMismatch);

        // Invalid size.
        let mut source = fixture.source();
        for size in [0, 2, 5, 17] {
            source.set(Witness::Header, Header { size, ..header }.encode());
            let failure = run(&source, &Config::default()).unwrap_err();
            assert_eq!(failure.status(), Status::InvalidSize);
        }

        // Trailing proof bytes.
        let mut source = fixture.source();
        let mut proof = fixture.proof.to_vec();
        proof.push(0);
        source.set(Witness::Proof, proof);
        let failure = run(&source, &Config::default()).unwrap_err();
        assert_eq!(failure.status(), Status::MalformedProof);

        // No leaves.
        let mut source = fixture.source();
        source.set(Witness::Leaves, Vec::new());
        let failure = run(&source, &Config::default()).unwrap_err();
        assert_eq!(failure.status(), Status::MalformedProof);

        // Duplicate leaf.
        let mut source = fixture.source();
        let mut leaves = fixture.leaves[..LEAF_RECORD_LENGTH].to_vec();
        leaves.extend_from_slice(&fixture.leaves);
        source.set(Witness::Leaves, leaves);
        let failure = run(&source, &Config::default()).unwrap_err();
        assert_eq!(failure.status(), Status::MalformedProof);
    }

    #[test]
    fn test_run_from_directory() {
        let path = env::temp_dir().join(format!("witness_run_{}", rand::random::<u64>()));
        let directory = Directory::new(&path);
        let fixture = fixture(HasherKind::Sha256);
        fixture.store(&directory).unwrap();

        assert!(run(&directory, &config(HasherKind::Sha256)).is_ok());
        assert_eq!(
            run(&directory, &config(HasherKind::Ckb))
                .unwrap_err()
                .status(),
            Status::RootMismatch
        );

        fs::remove_file(path.join(Witness::Leaves.file_name())).unwrap();
        assert_eq!(
            run(&directory, &config(HasherKind::Sha256))
                .unwrap_err()
                .status(),
            Status::LoadFailed
        );
        fs::remove_dir_all(&path).unwrap();
    }
}
