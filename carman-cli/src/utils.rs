//! Utility functions for the CLI.

use carman_archive::{Action, ArchiveEvent, Reporter};
use carman_core::{CarError, Entry, ratio_percent};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{IsTerminal, Write};
use std::time::Duration;

/// Title block printed above a listing.
pub const LIST_TITLE: &str = "\n                       Original  Compressed\n     Filename            Size       Size     Ratio   CRC-32   Method\n------------------     --------  ----------  -----  --------  ------";

const LIST_RULE: &str = "------------------     --------  ----------  -----";

/// Create a spinner showing the entry being processed.
///
/// The spinner is hidden when disabled or when stderr is not a terminal.
pub fn create_spinner(enable: bool) -> ProgressBar {
    if !enable || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// `N file` or `N files`.
pub fn count_line(count: usize) -> String {
    format!("{} file{}", count, if count == 1 { "" } else { "s" })
}

/// Totals row closing a listing.
pub fn totals_line(original: u64, compressed: u64) -> String {
    format!(
        "{}\n{:<20} {:>10}  {:>10}  {:>4}%",
        LIST_RULE,
        "Total",
        original,
        compressed,
        ratio_percent(compressed, original)
    )
}

/// Renders engine events on the console.
///
/// Listing lines go to `out`; per-entry outcomes and warnings go to `err`.
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
    progress: ProgressBar,
    total_original: u64,
    total_compressed: u64,
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E, progress: ProgressBar) -> Self {
        Self {
            out,
            err,
            progress,
            total_original: 0,
            total_compressed: 0,
        }
    }

    /// Summed original and compressed sizes of listed entries.
    pub fn totals(&self) -> (u64, u64) {
        (self.total_original, self.total_compressed)
    }

    pub fn finish(&self) {
        self.progress.finish_and_clear();
    }
}

fn outcome(action: Action, entry: &Entry) -> Option<String> {
    match action {
        Action::Adding | Action::Replacing => Some(format!(
            "{} {:<20} {}%",
            action,
            entry.name,
            entry.ratio_percent()
        )),
        Action::Deleting => Some(format!("{} {}", action, entry.name)),
        Action::Extracting | Action::Testing => {
            Some(format!("{} {:<20} OK", action, entry.name))
        }
        Action::Copying | Action::Printing | Action::Listing => None,
    }
}

fn skip_reason(error: &CarError) -> String {
    match error {
        CarError::CrcMismatch { .. } => "CRC error reading data".to_string(),
        other => other.to_string(),
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn report(&mut self, event: &ArchiveEvent<'_>) {
        match event {
            ArchiveEvent::Started { action, name } => {
                self.progress.set_message(format!("{} {}", action, name));
            }
            ArchiveEvent::Finished {
                action: Action::Listing,
                entry,
            } => {
                self.total_original += u64::from(entry.original_size);
                self.total_compressed += u64::from(entry.compressed_size);
                let out = &mut self.out;
                self.progress.suspend(|| {
                    let _ = writeln!(out, "{}", entry);
                });
            }
            ArchiveEvent::Finished { action, entry } => {
                if let Some(line) = outcome(*action, entry) {
                    let err = &mut self.err;
                    self.progress.suspend(|| {
                        let _ = writeln!(err, "{}", line);
                    });
                }
            }
            ArchiveEvent::Skipped {
                action,
                name,
                error,
            } => {
                let line = format!("{} {:<20} {}", action, name, skip_reason(error));
                let err = &mut self.err;
                self.progress.suspend(|| {
                    let _ = writeln!(err, "{}", line);
                });
            }
        }
    }
}
