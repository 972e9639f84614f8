//! End-to-end archive scenarios on real files.

use carman_archive::{
    Action, Archive, ArchiveOptions, NullReporter, RecordingReporter, SelectorSet, read_header,
    wildcard_match,
};
use carman_core::{CarError, Crc32, Method};
use proptest::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn repetitive(len: usize) -> Vec<u8> {
    b"ABABABAB-".iter().copied().cycle().take(len).collect()
}

fn random(len: usize, mut seed: u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect()
}

fn write_inputs(dir: &Path, files: &[(&str, Vec<u8>)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, data)| {
            let path = dir.join(name);
            fs::write(&path, data).unwrap();
            path
        })
        .collect()
}

/// Walk a raw archive image and check the structural invariant.
fn walk(image: &[u8]) -> Vec<String> {
    let mut cursor = Cursor::new(image);
    let mut names = Vec::new();
    while let Some(entry) = read_header(&mut cursor).unwrap() {
        assert!(entry.compressed_size <= entry.original_size);
        if entry.method == Method::Lzss {
            assert!(entry.compressed_size < entry.original_size);
        }
        cursor.set_position(cursor.position() + u64::from(entry.compressed_size));
        names.push(entry.name);
    }
    assert_eq!(cursor.position() as usize, image.len(), "bytes after terminator");
    names
}

#[test]
fn test_add_then_list() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let inputs = write_inputs(
        dir.path(),
        &[("a.txt", repetitive(100)), ("b.bin", random(50, 7))],
    );
    let archive = Archive::new(dir.path().join("test.car"));

    let summary = archive.add(&inputs, &mut NullReporter)?;
    assert_eq!(summary.processed, 2);

    let mut reporter = RecordingReporter::new();
    let summary = archive.list(&SelectorSet::all(), &mut reporter)?;
    assert_eq!(summary.processed, 2);
    assert_eq!(reporter.names(Action::Listing), vec!["a.txt", "b.bin"]);

    let listed = &reporter.finished;
    assert!(listed[0].1.compressed_size < 100);
    assert_eq!(listed[0].1.original_crc, Crc32::compute(&repetitive(100)));
    assert!(listed[1].1.compressed_size <= 50);
    Ok(())
}

#[test]
fn test_delete_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let inputs = write_inputs(
        dir.path(),
        &[("a.txt", repetitive(100)), ("b.bin", random(50, 7))],
    );
    let archive = Archive::new(dir.path().join("test.car"));
    archive.add(&inputs, &mut NullReporter)?;

    let summary = archive.delete(&SelectorSet::new(["a.txt"]), &mut NullReporter)?;
    assert_eq!(summary.processed, 1);
    assert!(summary.rewritten);

    let names: Vec<String> = archive.entries()?.into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["b.bin"]);
    assert_eq!(walk(&fs::read(archive.path())?), vec!["b.bin"]);
    Ok(())
}

#[test]
fn test_corrupted_header_leaves_archive_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let inputs = write_inputs(
        dir.path(),
        &[("a.txt", repetitive(100)), ("b.bin", random(50, 7))],
    );
    let archive = Archive::new(dir.path().join("test.car"));
    archive.add(&inputs, &mut NullReporter)?;

    let mut image = fs::read(archive.path())?;
    // First byte of a.txt's original_size field.
    image["a.txt".len() + 2] ^= 0x01;
    fs::write(archive.path(), &image)?;

    let listed = archive.list(&SelectorSet::all(), &mut NullReporter);
    assert!(matches!(listed, Err(CarError::HeaderCorrupt { .. })));

    let deleted = archive.delete(&SelectorSet::new(["b.bin"]), &mut NullReporter);
    assert!(matches!(deleted, Err(CarError::HeaderCorrupt { .. })));
    assert_eq!(fs::read(archive.path())?, image);

    let leftovers = fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
    Ok(())
}

#[test]
fn test_replace_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let inputs = write_inputs(
        dir.path(),
        &[
            ("one.txt", repetitive(300)),
            ("two.txt", repetitive(10)),
            ("three.bin", random(64, 3)),
        ],
    );
    let archive = Archive::new(dir.path().join("r.car"));
    archive.add(&inputs, &mut NullReporter)?;

    let updated = random(200, 99);
    fs::write(dir.path().join("two.txt"), &updated)?;
    fs::remove_file(dir.path().join("one.txt"))?;

    let archive = archive.with_options(ArchiveOptions::new().with_input_dir(dir.path()));
    let mut reporter = RecordingReporter::new();
    let summary = archive.replace(&SelectorSet::new(["*.txt"]), &mut reporter)?;

    // one.txt is gone from disk, so only two.txt is replaced.
    assert_eq!(summary.processed, 1);
    assert_eq!(reporter.skipped.len(), 1);
    assert_eq!(reporter.skipped[0].1, "one.txt");

    let entries = archive.entries()?;
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["one.txt", "two.txt", "three.bin"]);
    assert_eq!(entries[1].original_size, 200);
    assert_eq!(entries[1].original_crc, Crc32::compute(&updated));
    assert_eq!(entries[0].original_crc, Crc32::compute(&repetitive(300)));
    walk(&fs::read(archive.path())?);
    Ok(())
}

#[test]
fn test_extract_roundtrip_and_checksum_error() -> Result<(), Box<dyn std::error::Error>> {
    let src = tempfile::tempdir()?;
    let files = vec![
        ("text.txt", repetitive(5000)),
        ("noise.bin", random(3000, 11)),
        ("empty", Vec::new()),
    ];
    let inputs = write_inputs(src.path(), &files);
    let archive = Archive::new(src.path().join("x.car"));
    archive.add(&inputs, &mut NullReporter)?;

    let out = tempfile::tempdir()?;
    let archive = archive.with_options(ArchiveOptions::new().with_output_dir(out.path()));
    let summary = archive.extract(&SelectorSet::all(), &mut NullReporter)?;
    assert_eq!(summary.processed, 3);
    for (name, data) in &files {
        assert_eq!(&fs::read(out.path().join(name))?, data);
    }

    // Damage the first literal of text.txt (an LZSS entry); the byte before
    // it is the control byte.
    let entries = archive.entries()?;
    assert_eq!(entries[0].method, Method::Lzss);
    let mut image = fs::read(archive.path())?;
    let first_literal = "text.txt".len() + 1 + 17 + 1;
    image[first_literal] ^= 0xFF;
    fs::write(archive.path(), &image)?;

    let out2 = tempfile::tempdir()?;
    let archive = archive.with_options(ArchiveOptions::new().with_output_dir(out2.path()));
    let mut reporter = RecordingReporter::new();
    let summary = archive.extract(&SelectorSet::all(), &mut reporter)?;
    assert_eq!(summary.processed, 2);
    assert_eq!(reporter.skipped.len(), 1);
    assert!(!out2.path().join("text.txt").exists());
    assert_eq!(fs::read(out2.path().join("noise.bin"))?, files[1].1);
    Ok(())
}

#[test]
fn test_test_command_counts_only_good_entries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let inputs = write_inputs(dir.path(), &[("s.bin", random(40, 5)), ("t.txt", repetitive(80))]);
    let archive = Archive::new(dir.path().join("t.car"));
    archive.add(&inputs, &mut NullReporter)?;

    let mut image = fs::read(archive.path())?;
    // First payload byte of s.bin, which is stored.
    image["s.bin".len() + 1 + 17] ^= 0x10;
    fs::write(archive.path(), &image)?;

    let mut reporter = RecordingReporter::new();
    let summary = archive.test(&SelectorSet::all(), &mut reporter)?;
    assert_eq!(summary.processed, 1);
    assert_eq!(reporter.names(Action::Testing), vec!["t.txt"]);
    Ok(())
}

#[test]
fn test_add_replaces_same_name_and_keeps_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let first = write_inputs(dir.path(), &[("a", repetitive(50)), ("b", repetitive(60))]);
    let archive = Archive::new(dir.path().join("o.car"));
    archive.add(&first, &mut NullReporter)?;

    let newer = tempfile::tempdir()?;
    let second = write_inputs(newer.path(), &[("b", repetitive(70)), ("c", random(5, 1))]);
    let summary = archive.add(&second, &mut NullReporter)?;
    assert_eq!(summary.processed, 2);

    // New entries come first, then the untouched old ones.
    let image = fs::read(archive.path())?;
    assert_eq!(walk(&image), vec!["b", "c", "a"]);
    assert_eq!(archive.entries()?[0].original_size, 70);
    Ok(())
}

proptest! {
    #[test]
    fn test_star_matches_everything(name in "[a-zA-Z0-9._-]{0,24}") {
        prop_assert!(wildcard_match(&name, "*"));
        prop_assert!(wildcard_match(&name, &name));
    }

    #[test]
    fn test_question_marks_match_length(name in "[a-z]{0,12}") {
        let pattern = "?".repeat(name.chars().count());
        prop_assert!(wildcard_match(&name, &pattern));
        let longer = format!("{pattern}?");
        prop_assert!(!wildcard_match(&name, &longer));
    }
}
