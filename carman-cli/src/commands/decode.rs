//! Extract, Print and Test: commands that decode payloads.

use crate::utils::{ConsoleReporter, count_line, create_spinner};
use carman_archive::{Archive, ArchiveOptions, SelectorSet};
use std::io::{self, Write};
use std::path::Path;

/// Where decoded entries go.
pub enum Decode<'a> {
    /// One file per entry under this directory.
    Extract(&'a Path),
    /// Standard output.
    Print,
    /// Nowhere; only checksums are verified.
    Test,
}

pub fn cmd_decode(
    archive: &Path,
    decode: Decode<'_>,
    patterns: &[String],
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ArchiveOptions::new();
    if let Decode::Extract(dir) = &decode {
        options = options.with_output_dir(*dir);
    }
    let archive = Archive::new(archive).with_options(options);
    let selectors = SelectorSet::new(patterns.iter().cloned());

    if let Decode::Print = decode {
        // Stdout carries the payload, so the spinner stays off and the
        // count goes to stderr.
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut reporter = ConsoleReporter::new(io::sink(), io::stderr(), create_spinner(false));
        let summary = archive.print(&selectors, &mut out, &mut reporter)?;
        out.flush()?;
        eprintln!("\n{}", count_line(summary.processed));
        return Ok(());
    }

    let mut reporter = ConsoleReporter::new(io::stdout(), io::stderr(), create_spinner(progress));
    let summary = match decode {
        Decode::Extract(_) => archive.extract(&selectors, &mut reporter),
        _ => archive.test(&selectors, &mut reporter),
    };
    reporter.finish();
    let summary = summary?;

    println!("\n{}", count_line(summary.processed));
    Ok(())
}
