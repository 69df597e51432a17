//! A library for reading ZIP archives

use thiserror::Error;

mod archive;
mod compression;

pub use crate::archive::{Archive, Entry};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("The record's signature {signature:#010x} does not match the expectation")]
    InvalidSignature { signature: u32 },

    #[error("The archive is violating the expected format, because: {reason}")]
    FormatError { reason: &'static str },

    /// The backwards scan over the archive tail found no end-of-central-directory
    /// record, so this is either not a ZIP file or a truncated one.
    #[error("The archive has no end-of-central-directory record")]
    MissingEndOfDirectory,

    #[error("Compression method {method} is not supported")]
    UnsupportedMethod { method: u16 },

    #[error("CRC mismatch while extracting {name}")]
    ChecksumMismatch { name: String },

    #[error("The archive contains no entry named {name}")]
    EntryNotFound { name: String },

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}
