//! # CARMAN Archive
//!
//! The CAR archive format and the command engine that maintains it.
//!
//! A CAR archive is a flat sequence of entries, each a checksummed header
//! followed by its payload, closed by a single NUL byte. Payloads are either
//! stored or LZSS-compressed, whichever is smaller.
//!
//! Archives are never edited in place. Add, Replace and Delete stream the old
//! archive into a new temporary one, entry by entry, and rename it over the
//! original when done.
//!
//! ## Example
//!
//! ```rust,no_run
//! use carman_archive::{Archive, RecordingReporter, SelectorSet};
//! use std::path::PathBuf;
//!
//! let archive = Archive::new("backup.car");
//! let mut reporter = RecordingReporter::new();
//!
//! archive.add(&[PathBuf::from("notes.txt")], &mut reporter).unwrap();
//! for entry in archive.entries().unwrap() {
//!     println!("{}", entry);
//! }
//! archive.test(&SelectorSet::all(), &mut reporter).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod engine;
pub mod header;
pub mod options;
pub mod report;
pub mod selector;
pub mod sink;

// Re-exports
pub use archive::{Archive, RunSummary};
pub use engine::{Command, Destination, Engine};
pub use header::{HeaderSlot, commit_header, read_header, reserve_header, write_header, write_terminator};
pub use options::{ArchiveOptions, resolve_archive_path};
pub use report::{Action, ArchiveEvent, NullReporter, RecordingReporter, Reporter};
pub use selector::{SelectorSet, wildcard_match};
pub use sink::ExtractSink;
