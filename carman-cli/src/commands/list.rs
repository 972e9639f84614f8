//! List command implementation.

use crate::utils::{ConsoleReporter, LIST_TITLE, count_line, create_spinner, totals_line};
use carman_archive::{Action, Archive, RecordingReporter, SelectorSet};
use carman_core::Entry;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    name: String,
    size: u32,
    compressed_size: u32,
    ratio: u32,
    crc: String,
    method: String,
}

impl EntryJson {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.original_size,
            compressed_size: entry.compressed_size,
            ratio: entry.ratio_percent(),
            crc: format!("{:08x}", entry.original_crc),
            method: entry.method.to_string(),
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveListJson {
    archive: String,
    entries: Vec<EntryJson>,
}

pub fn cmd_list(
    archive: &Path,
    patterns: &[String],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let archive = Archive::new(archive);
    let selectors = SelectorSet::new(patterns.iter().cloned());

    if json {
        let mut recorder = RecordingReporter::new();
        archive.list(&selectors, &mut recorder)?;
        let listing = ArchiveListJson {
            archive: archive.path().display().to_string(),
            entries: recorder
                .finished
                .iter()
                .filter(|(action, _)| *action == Action::Listing)
                .map(|(_, entry)| EntryJson::from_entry(entry))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}", LIST_TITLE);
    let mut reporter = ConsoleReporter::new(io::stdout(), io::stderr(), create_spinner(false));
    let summary = archive.list(&selectors, &mut reporter)?;
    let (original, compressed) = reporter.totals();
    println!("{}", totals_line(original, compressed));
    println!("\n{}", count_line(summary.processed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carman_core::Method;

    #[test]
    fn test_entry_json() {
        let entry = Entry::new("a.txt")
            .with_method(Method::Lzss)
            .with_sizes(200, 50)
            .with_crc(0xAB);
        let json = serde_json::to_value(EntryJson::from_entry(&entry)).unwrap();
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["size"], 200);
        assert_eq!(json["compressed_size"], 50);
        assert_eq!(json["ratio"], 75);
        assert_eq!(json["crc"], "000000ab");
        assert_eq!(json["method"], "LZSS");
    }
}
