//! Per-entry progress reporting.
//!
//! The engine never prints. It describes what happens to each entry through
//! a [`Reporter`], and the front end decides how to show it.

use carman_core::entry::Entry;
use carman_core::error::CarError;

/// What the engine is doing with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Compressing a new input file into the archive.
    Adding,
    /// Compressing a file over an existing entry.
    Replacing,
    /// Copying an untouched entry to the new archive.
    Copying,
    /// Leaving an entry out of the new archive.
    Deleting,
    /// Describing an entry.
    Listing,
    /// Decoding an entry to a file.
    Extracting,
    /// Decoding an entry to a writer.
    Printing,
    /// Decoding an entry and checking its CRC.
    Testing,
}

impl Action {
    /// Present-tense label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Adding => "Adding",
            Self::Replacing => "Replacing",
            Self::Copying => "Copying",
            Self::Deleting => "Deleting",
            Self::Listing => "Listing",
            Self::Extracting => "Extracting",
            Self::Printing => "Printing",
            Self::Testing => "Testing",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One reportable event.
#[derive(Debug)]
pub enum ArchiveEvent<'a> {
    /// Work on `name` is starting.
    Started {
        /// What is being done.
        action: Action,
        /// Entry or input name.
        name: &'a str,
    },
    /// Work on an entry finished successfully.
    Finished {
        /// What was done.
        action: Action,
        /// The entry as written, listed or decoded.
        entry: &'a Entry,
    },
    /// An entry or input was skipped because of a non-fatal error.
    Skipped {
        /// What was being attempted.
        action: Action,
        /// Entry or input name.
        name: &'a str,
        /// Why it was skipped.
        error: &'a CarError,
    },
}

/// Receiver of [`ArchiveEvent`]s.
pub trait Reporter {
    /// Handle one event.
    fn report(&mut self, event: &ArchiveEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _event: &ArchiveEvent<'_>) {}
}

/// Records events as owned values. Handy for tests and for front ends that
/// render after the run.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    /// Entries finished, in order.
    pub finished: Vec<(Action, Entry)>,
    /// Names skipped, with the error message.
    pub skipped: Vec<(Action, String, String)>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names finished with `action`, in order.
    pub fn names(&self, action: Action) -> Vec<&str> {
        self.finished
            .iter()
            .filter(|(a, _)| *a == action)
            .map(|(_, entry)| entry.name.as_str())
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, event: &ArchiveEvent<'_>) {
        match event {
            ArchiveEvent::Started { .. } => {}
            ArchiveEvent::Finished { action, entry } => {
                self.finished.push((*action, (*entry).clone()));
            }
            ArchiveEvent::Skipped {
                action,
                name,
                error,
            } => {
                self.skipped
                    .push((*action, name.to_string(), error.to_string()));
            }
        }
    }
}
