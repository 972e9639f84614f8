//! Error types for CARMAN operations.
//!
//! Errors fall in two classes. Structural errors (I/O failures, corrupt or
//! malformed headers) abort a whole archive run. Content errors (payload
//! checksum mismatch, unreadable input file, unknown method) are isolated to
//! the entry they occur in. [`CarError::is_fatal`] tells them apart.

use std::io;
use thiserror::Error;

/// The main error type for CARMAN operations.
#[derive(Debug, Error)]
pub enum CarError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored header checksum disagrees with the recomputed one.
    #[error("Header checksum error for file {name}: stored {stored:#010x}, computed {computed:#010x}")]
    HeaderCorrupt {
        /// Name read from the damaged header.
        name: String,
        /// Checksum stored in the header.
        stored: u32,
        /// Checksum recomputed over the header fields.
        computed: u32,
    },

    /// Entry name has no terminator within the maximum length.
    #[error("File name exceeded maximum of {max} bytes in header")]
    NameTooLong {
        /// Maximum name length in bytes, excluding the terminator.
        max: usize,
    },

    /// Entry name cannot be stored.
    #[error("Invalid entry name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Payload CRC mismatch.
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Expected CRC value from the header.
        expected: u32,
        /// CRC computed over the decoded data.
        computed: u32,
    },

    /// Unknown compression method byte.
    #[error("Unknown compression method: {method}")]
    UnsupportedMethod {
        /// The method byte found in the header.
        method: u8,
    },

    /// Payload ended early or is otherwise undecodable.
    #[error("Corrupted data: {message}")]
    CorruptedData {
        /// Description of the corruption.
        message: String,
    },

    /// Archive file does not exist.
    #[error("Can't open archive '{path}'")]
    ArchiveNotFound {
        /// Path that was tried.
        path: String,
    },

    /// An input file could not be opened or read.
    #[error("Could not open {path}: {reason}")]
    SourceUnavailable {
        /// Path of the input file.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// Input file exceeds what a 32-bit size field can hold.
    #[error("{name} is too large to archive ({size} bytes)")]
    EntryTooLarge {
        /// Entry name.
        name: String,
        /// Actual size in bytes.
        size: u64,
    },

    /// Entry name would escape the extraction directory.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious path.
        path: String,
    },
}

/// Result type alias for CARMAN operations.
pub type Result<T> = std::result::Result<T, CarError>;

impl CarError {
    /// Create a header checksum error.
    pub fn header_corrupt(name: impl Into<String>, stored: u32, computed: u32) -> Self {
        Self::HeaderCorrupt {
            name: name.into(),
            stored,
            computed,
        }
    }

    /// Create a name-too-long error.
    pub fn name_too_long(max: usize) -> Self {
        Self::NameTooLong { max }
    }

    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: u8) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Create a corrupted data error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::CorruptedData {
            message: message.into(),
        }
    }

    /// Create an archive-not-found error.
    pub fn archive_not_found(path: impl Into<String>) -> Self {
        Self::ArchiveNotFound { path: path.into() }
    }

    /// Create a source-unavailable error.
    pub fn source_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an entry-too-large error.
    pub fn entry_too_large(name: impl Into<String>, size: u64) -> Self {
        Self::EntryTooLarge {
            name: name.into(),
            size,
        }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Whether this error aborts the whole archive run.
    ///
    /// Fatal errors leave the original archive untouched and discard the
    /// temporary output. Everything else is reported against a single entry
    /// and processing continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::HeaderCorrupt { .. }
                | Self::NameTooLong { .. }
                | Self::InvalidName { .. }
                | Self::ArchiveNotFound { .. }
        )
    }
}
