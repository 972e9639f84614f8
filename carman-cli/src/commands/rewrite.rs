//! Add, Replace and Delete: commands that write a new archive.

use crate::utils::{ConsoleReporter, count_line, create_spinner};
use carman_archive::{Archive, ArchiveOptions, Command, SelectorSet};
use std::io;
use std::path::{Path, PathBuf};

/// A command that rewrites the archive.
pub enum Rewrite<'a> {
    /// Insert these files.
    Add(&'a [PathBuf]),
    /// Recompress selected entries from files in this directory.
    Replace(&'a Path),
    /// Drop selected entries.
    Delete,
}

pub fn cmd_rewrite(
    archive: &Path,
    rewrite: Rewrite<'_>,
    patterns: &[String],
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ArchiveOptions::new();
    if let Rewrite::Replace(dir) = &rewrite {
        options = options.with_input_dir(*dir);
    }
    let archive = Archive::new(archive).with_options(options);
    let selectors = SelectorSet::new(patterns.iter().cloned());

    let command = match rewrite {
        Rewrite::Add(files) => Command::Add(files),
        Rewrite::Replace(_) => Command::Replace,
        Rewrite::Delete => Command::Delete,
    };

    let mut reporter = ConsoleReporter::new(io::stdout(), io::stderr(), create_spinner(progress));
    let summary = archive.run(command, &selectors, &mut reporter);
    reporter.finish();
    let summary = summary?;

    if !summary.rewritten {
        tracing::info!(archive = %archive.path().display(), "archive unchanged");
    }
    println!("\n{}", count_line(summary.processed));
    Ok(())
}
