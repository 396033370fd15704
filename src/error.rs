use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Table full.")]
    TableFull { max_rows: usize },

    #[error("Page {page} out of bounds (max pages: {max_pages})")]
    PageOutOfBounds { page: usize, max_pages: usize },

    #[error("Tried to flush page {0}, which was never loaded")]
    PageNotLoaded(usize),

    #[error("Row {row} out of bounds (row count: {row_count})")]
    RowOutOfBounds { row: usize, row_count: usize },

    #[error("Malformed database file: length {len} is not a multiple of the row size {row_size}")]
    MalformedFile { len: u64, row_size: usize },

    #[error("Column '{field}' too long: {actual} bytes (max: {max})")]
    StringTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Broad classes of failure, so callers can decide whether to report, retry or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The store is at capacity. Expected during normal operation.
    Capacity,
    /// The operating system failed an open, read, write, seek or sync.
    Io,
    /// The caller broke a contract of the API (bad row or page index, invalid input).
    Contract,
    /// The backing file is not in the expected format.
    Corruption,
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::TableFull { .. } => ErrorKind::Capacity,
            DbError::Io(_) => ErrorKind::Io,
            DbError::PageOutOfBounds { .. }
            | DbError::PageNotLoaded(_)
            | DbError::RowOutOfBounds { .. }
            | DbError::StringTooLong { .. } => ErrorKind::Contract,
            DbError::MalformedFile { .. } => ErrorKind::Corruption,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Capacity
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
