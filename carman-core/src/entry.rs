//! Archive entry metadata.
//!
//! An [`Entry`] is the metadata of one stored file: everything in its header
//! except the payload itself. Entries are never modified in place inside an
//! archive; an update writes a new entry and omits the old one.

use crate::error::{CarError, Result};
use std::path::{Component, PathBuf};

/// Maximum entry name length in bytes, not counting the NUL terminator.
pub const MAX_NAME_LEN: usize = 127;

/// Compression method used for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// No compression.
    #[default]
    Stored,
    /// LZSS compression.
    Lzss,
    /// Unknown method byte, kept so the entry can still be copied.
    Unknown(u8),
}

impl Method {
    /// Decode a method from its header byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Stored,
            2 => Self::Lzss,
            other => Self::Unknown(other),
        }
    }

    /// Header byte for this method.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Stored => 1,
            Self::Lzss => 2,
            Self::Unknown(byte) => byte,
        }
    }

    /// Get the method name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Lzss => "LZSS",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "Unknown({})", id),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// One stored file.
///
/// The name is kept twice: `name` is the printable form, and the bytes
/// returned by [`Entry::name_bytes`] are what the header stores. They differ
/// only for names that are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    /// Name of the entry within the archive, lossily decoded for display.
    pub name: String,
    raw_name: Vec<u8>,
    /// Compression method.
    pub method: Method,
    /// Uncompressed size in bytes.
    pub original_size: u32,
    /// Payload size in bytes.
    pub compressed_size: u32,
    /// CRC-32 of the uncompressed payload.
    pub original_crc: u32,
    /// CRC-32 over the serialized header fields.
    pub header_crc: u32,
}

impl Entry {
    /// Create a new entry with zeroed sizes and checksums.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            raw_name: name.clone().into_bytes(),
            name,
            ..Self::default()
        }
    }

    /// Create an entry from a name exactly as stored in a header.
    pub fn from_name_bytes(raw_name: Vec<u8>) -> Self {
        Self {
            name: String::from_utf8_lossy(&raw_name).into_owned(),
            raw_name,
            ..Self::default()
        }
    }

    /// Name bytes as stored in the header.
    pub fn name_bytes(&self) -> &[u8] {
        &self.raw_name
    }

    /// Path of the entry relative to a base directory.
    ///
    /// On Unix the stored bytes are used as is, so names that are not UTF-8
    /// still map to the file they came from.
    pub fn relative_path(&self) -> PathBuf {
        #[cfg(unix)]
        {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;
            PathBuf::from(OsStr::from_bytes(&self.raw_name))
        }
        #[cfg(not(unix))]
        {
            PathBuf::from(&self.name)
        }
    }

    /// Builder method to set compression method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Builder method to set both sizes.
    pub fn with_sizes(mut self, original_size: u32, compressed_size: u32) -> Self {
        self.original_size = original_size;
        self.compressed_size = compressed_size;
        self
    }

    /// Builder method to set the payload CRC.
    pub fn with_crc(mut self, crc: u32) -> Self {
        self.original_crc = crc;
        self
    }

    /// Whole-percent space savings, truncated the way archive listings show it.
    pub fn ratio_percent(&self) -> u32 {
        ratio_percent(self.compressed_size as u64, self.original_size as u64)
    }

    /// Check that the name can be written into a header.
    pub fn validate_name(&self) -> Result<()> {
        if self.raw_name.is_empty() {
            return Err(CarError::invalid_name(&self.name, "name is empty"));
        }
        if self.raw_name.contains(&0) {
            return Err(CarError::invalid_name(&self.name, "name contains NUL"));
        }
        if self.raw_name.len() > MAX_NAME_LEN {
            return Err(CarError::name_too_long(MAX_NAME_LEN));
        }
        Ok(())
    }

    /// Validate the entry path for extraction.
    ///
    /// Returns an error if the name is absolute or contains `..`.
    pub fn validate_path(&self) -> Result<()> {
        let path = self.relative_path();

        if path.is_absolute() {
            return Err(CarError::path_traversal(&self.name));
        }

        for component in path.components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(CarError::path_traversal(&self.name));
                }
                Component::CurDir | Component::Normal(_) => {}
            }
        }

        Ok(())
    }
}

/// `100 - floor(100 * compressed / original)`, or 0 for an empty original.
pub fn ratio_percent(compressed: u64, original: u64) -> u32 {
    if original == 0 {
        return 0;
    }
    let used = (100 * compressed / original).min(100);
    (100 - used) as u32
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<20} {:>10}  {:>10}  {:>4}%  {:08x}  {}",
            self.name,
            self.original_size,
            self.compressed_size,
            self.ratio_percent(),
            self.original_crc,
            self.method
        )
    }
}
