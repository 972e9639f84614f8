//! Destinations for decoded entries.

use crate::report::Action;
use std::io::Write;
use std::path::Path;

/// Where Extract, Print and Test send decoded payloads.
pub enum ExtractSink<'a> {
    /// One file per entry, named after the entry, under a directory.
    Directory(&'a Path),
    /// Every payload concatenated onto one writer.
    Writer(&'a mut dyn Write),
    /// Decode and verify only.
    Discard,
}

impl ExtractSink<'_> {
    /// The action reported for entries sent here.
    pub fn action(&self) -> Action {
        match self {
            Self::Directory(_) => Action::Extracting,
            Self::Writer(_) => Action::Printing,
            Self::Discard => Action::Testing,
        }
    }
}

impl std::fmt::Debug for ExtractSink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => f.debug_tuple("Directory").field(dir).finish(),
            Self::Writer(_) => f.write_str("Writer"),
            Self::Discard => f.write_str("Discard"),
        }
    }
}
