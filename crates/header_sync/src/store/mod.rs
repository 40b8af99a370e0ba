//! Durable cache of traversed block headers.
//!
//! The on-disk format is a fixed-column CSV file: a mandatory header line
//! followed by one record per line. Loading is strict; a single malformed
//! line fails the whole load. Saving rewrites the entire file.
use thiserror::Error;

use crate::header::HeaderRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed cache row `{line}`: {reason}")]
    MalformedRow { line: String, reason: String },
}

pub trait HeaderStore {
    fn load(&self) -> Result<Vec<HeaderRecord>, StoreError>;
    fn save(&self, headers: &[HeaderRecord]) -> Result<(), StoreError>;
}

pub mod file;
