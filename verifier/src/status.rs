//! Mapping of verification outcomes to numeric status codes.

use crate::{header::HeaderError, witness::LoadError};
use std::process::ExitCode;
use thiserror::Error;

/// Numeric outcome of a verification, as reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    LoadFailed = 1,
    MalformedHeader = 2,
    BufferExhausted = 3,
    RootMismatch = 4,
    InvalidSize = 5,
    MalformedProof = 6,
}

impl Status {
    /// Return the numeric code of this status, used as the process exit code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}

/// Reasons a verification run can fail.
#[derive(Error, Debug)]
pub enum Failure {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("malformed header: {0}")]
    Header(#[from] HeaderError),
    #[error("verification failed: {0}")]
    Verification(#[from] witness_mmr::Error),
}

impl Failure {
    /// Return the [Status] reported for this failure.
    pub fn status(&self) -> Status {
        use witness_mmr::Error;

        match self {
            Failure::Load(_) => Status::LoadFailed,
            Failure::Header(_) => Status::MalformedHeader,
            Failure::Verification(err) => match err {
                Error::BufferExhausted { .. } | Error::MissingProofItem => {
                    Status::BufferExhausted
                }
                Error::RootMismatch => Status::RootMismatch,
                Error::InvalidMmrSize(_) => Status::InvalidSize,
                Error::Empty
                | Error::ExtraProofBytes(_)
                | Error::ExtraProofItems(_)
                | Error::InvalidProofItem(_)
                | Error::NotALeaf(_)
                | Error::LeafOutOfRange(..)
                | Error::UnorderedLeaves(_) => Status::MalformedProof,
            },
        }
    }
}
