use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single timestamp strategy gave no answer.
///
/// Only `FileSystemUnreadable` ever escapes the resolver, the others just move the cascade on to
/// the next strategy.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("implausible container timestamp {0}")]
    MetadataImplausible(i64),

    #[error("cannot read modification time of {}: {source}", path.display())]
    FileSystemUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::MetadataUnavailable(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("no timestamp: {0}")]
    Unresolved(#[from] ResolveError),

    #[error("name collision with {}", .0.display())]
    DestinationCollision(PathBuf),

    #[error("copy to {} failed: {source:#}", destination.display())]
    CopyFailure {
        destination: PathBuf,
        source: anyhow::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameFormatError {
    #[error("format is empty")]
    Empty,

    #[error("invalid format specifier in {0:?}")]
    Invalid(String),

    #[error("{0:?} cannot format a date without timezone")]
    Unrenderable(String),

    #[error("format {0:?} would produce a name containing a path separator")]
    Separator(String),

    #[error("format {0:?} would produce the name \".\" or \"..\"")]
    Reserved(String),
}
