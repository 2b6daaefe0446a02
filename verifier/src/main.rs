//! Verify MMR witnesses stored in a directory, or generate them.
//!
//! # Usage
//!
//! ```sh
//! cargo run --release --bin witness-verifier -- generate --dir /tmp/witness --seed 1
//! cargo run --release --bin witness-verifier -- verify --dir /tmp/witness
//! cargo run --release --bin witness-verifier -- verify --dir /tmp/witness --proof raw
//! echo $?
//! ```

use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, Level};
use witness_verifier::{
    generate::{self, Options},
    run, Config, Directory, HasherKind, ProofFormat, Status, DEFAULT_MAX_WITNESS_SIZE,
};

/// MMR witness CLI.
#[derive(Parser)]
#[command(name = "witness-verifier", version)]
pub struct App {
    /// The log level for traces. opts: (error, debug, info, warn, trace)
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,

    /// The subcommand to run
    #[command(subcommand)]
    subcommand: Subcommands,
}

#[derive(Subcommand)]
pub enum Subcommands {
    /// Verify the witnesses in a directory, exiting with the resulting status code.
    Verify(VerifyArgs),

    /// Build a random MMR and write witnesses proving some of its leaves.
    Generate(GenerateArgs),
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Directory holding header.bin, leaves.bin and proof.bin (or raw_proof.bin).
    #[arg(long)]
    dir: PathBuf,

    /// Hasher the MMR was built with.
    #[arg(long, value_enum, default_value_t = HasherKind::Ckb)]
    hasher: HasherKind,

    /// Format of the proof to verify.
    #[arg(long, value_enum, default_value_t = ProofFormat::Compiled)]
    proof: ProofFormat,

    /// Maximum size of each witness, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_WITNESS_SIZE)]
    max_witness_size: usize,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Directory to write header.bin, proof.bin, raw_proof.bin and leaves.bin to.
    #[arg(long)]
    dir: PathBuf,

    /// Seed of the generator, random if not provided.
    #[arg(long, env = "SEED")]
    seed: Option<u64>,

    /// Number of leaves in the MMR.
    #[arg(long)]
    elements: Option<u64>,

    /// Number of leaves to prove.
    #[arg(long)]
    selected: Option<usize>,

    /// Hasher to build the MMR with.
    #[arg(long, value_enum, default_value_t = HasherKind::Ckb)]
    hasher: HasherKind,
}

fn main() -> ExitCode {
    let app = App::parse();
    tracing_subscriber::fmt()
        .with_max_level(app.log_level)
        .init();

    match app.subcommand {
        Subcommands::Verify(args) => verify_command(args),
        Subcommands::Generate(args) => generate_command(args),
    }
}

fn verify_command(args: VerifyArgs) -> ExitCode {
    let directory = Directory::new(args.dir);
    let config = Config {
        hasher: args.hasher,
        proof: args.proof,
        max_witness_size: args.max_witness_size,
    };
    match run(&directory, &config) {
        Ok(()) => {
            info!(
                dir = ?directory.path(),
                hasher = %config.hasher,
                format = %config.proof,
                "verified"
            );
            Status::Success.into()
        }
        Err(err) => {
            let status = err.status();
            error!(dir = ?directory.path(), ?err, code = status.code(), "verification failed");
            status.into()
        }
    }
}

fn generate_command(args: GenerateArgs) -> ExitCode {
    let options = Options {
        seed: args.seed.unwrap_or_else(rand::random),
        elements: args.elements,
        selected: args.selected,
        hasher: args.hasher,
    };
    info!(seed = options.seed, hasher = %options.hasher, "generating");

    let directory = Directory::new(args.dir);
    let result = generate::generate(&options).and_then(|fixture| {
        fixture.store(&directory)?;
        Ok(fixture)
    });
    match result {
        Ok(fixture) => {
            info!(
                dir = ?directory.path(),
                elements = fixture.elements,
                selected = fixture.positions.len(),
                size = fixture.header.size,
                root = %fixture.header.root,
                proof = fixture.proof.len(),
                raw_proof = fixture.raw_proof.len(),
                leaves = ?fixture.leaf_numbers(),
                "wrote witnesses"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(?err, "failed to generate witnesses");
            ExitCode::FAILURE
        }
    }
}
