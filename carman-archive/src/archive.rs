//! File-level archive runs.
//!
//! [`Archive`] opens the archive file, drives the [`Engine`], and for
//! rewriting commands swaps the finished temporary archive over the original.
//! Nothing touches the original until the new archive is complete; a fatal
//! error drops the temporary file and leaves the original as it was.

use crate::engine::{Command, Destination, Engine};
use crate::header::{read_header, write_terminator};
use crate::options::{ArchiveOptions, resolve_archive_path};
use crate::report::{NullReporter, Reporter};
use crate::selector::SelectorSet;
use carman_core::entry::Entry;
use carman_core::error::{CarError, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Outcome of one archive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Entries the command processed.
    pub processed: usize,
    /// Whether a new archive replaced the old one.
    pub rewritten: bool,
}

/// An archive on disk.
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    options: ArchiveOptions,
}

impl Archive {
    /// Refer to the archive at `path`, appending `.car` to a bare name that
    /// does not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: resolve_archive_path(path.as_ref()),
            options: ArchiveOptions::default(),
        }
    }

    /// Builder method to set the run options.
    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolved archive path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run options.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Run one command.
    pub fn run(
        &self,
        mut command: Command<'_>,
        selectors: &SelectorSet,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary> {
        debug!(archive = %self.path.display(), ?command, "starting run");
        let mut source = self.open_source(&command)?;
        let mut engine = Engine::new(&self.options, reporter);

        if !command.rewrites() {
            let processed = engine.process(&mut command, selectors, source.as_mut(), None)?;
            return Ok(RunSummary {
                processed,
                rewritten: false,
            });
        }

        let temp_dir = self.options.temp_dir_for(&self.path);
        let temp = tempfile::Builder::new()
            .prefix(".carman-")
            .suffix(".tmp")
            .tempfile_in(&temp_dir)?;
        let mut dest = BufWriter::new(temp);

        let processed = engine.process(
            &mut command,
            selectors,
            source.as_mut(),
            Some(&mut dest as &mut dyn Destination),
        )?;
        if processed == 0 {
            debug!("no entries processed, archive left untouched");
            return Ok(RunSummary {
                processed,
                rewritten: false,
            });
        }

        let temp = seal(dest)?;
        drop(source);
        temp.persist(&self.path).map_err(|e| CarError::Io(e.error))?;
        info!(
            archive = %self.path.display(),
            processed,
            "archive rewritten"
        );

        Ok(RunSummary {
            processed,
            rewritten: true,
        })
    }

    /// Add files, superseding entries with the same names.
    pub fn add(&self, inputs: &[PathBuf], reporter: &mut dyn Reporter) -> Result<RunSummary> {
        self.run(Command::Add(inputs), &SelectorSet::all(), reporter)
    }

    /// Recompress selected entries from the input directory.
    pub fn replace(&self, selectors: &SelectorSet, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        self.run(Command::Replace, selectors, reporter)
    }

    /// Remove selected entries.
    pub fn delete(&self, selectors: &SelectorSet, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        self.run(Command::Delete, selectors, reporter)
    }

    /// Report selected entries.
    pub fn list(&self, selectors: &SelectorSet, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        self.run(Command::List, selectors, reporter)
    }

    /// Decode selected entries into the output directory.
    pub fn extract(&self, selectors: &SelectorSet, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        self.run(Command::Extract, selectors, reporter)
    }

    /// Decode selected entries onto `out`.
    pub fn print(
        &self,
        selectors: &SelectorSet,
        out: &mut dyn Write,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary> {
        self.run(Command::Print(out), selectors, reporter)
    }

    /// Decode selected entries and verify their CRCs.
    pub fn test(&self, selectors: &SelectorSet, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        self.run(Command::Test, selectors, reporter)
    }

    /// Read every header without decoding payloads.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let Some(mut reader) = self.open_source(&Command::List)? else {
            return Ok(Vec::new());
        };
        let mut entries = Vec::new();
        while let Some(entry) = read_header(&mut reader)? {
            reader.seek(SeekFrom::Current(i64::from(entry.compressed_size)))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Number of entries processed by a List over everything.
    pub fn count(&self) -> Result<usize> {
        Ok(self
            .run(Command::List, &SelectorSet::all(), &mut NullReporter)?
            .processed)
    }

    fn open_source(&self, command: &Command<'_>) -> Result<Option<BufReader<File>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if matches!(command, Command::Add(_)) {
                    Ok(None)
                } else {
                    Err(CarError::archive_not_found(self.path.display().to_string()))
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Write the terminator and cut the file there.
///
/// A Stored fallback or a rolled-back input may leave stale bytes past the
/// terminator.
fn seal(mut dest: BufWriter<NamedTempFile>) -> Result<NamedTempFile> {
    write_terminator(&mut dest)?;
    let end = dest.stream_position()?;
    dest.flush()?;
    let temp = dest.into_inner().map_err(|e| CarError::Io(e.into_error()))?;
    temp.as_file().set_len(end)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use std::fs;

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::new(dir.path().join("nothing"));
        assert_eq!(archive.path(), dir.path().join("nothing.car"));

        let result = archive.list(&SelectorSet::all(), &mut NullReporter);
        assert!(matches!(result, Err(CarError::ArchiveNotFound { .. })));
        assert!(archive.entries().unwrap().is_empty());
    }

    #[test]
    fn test_add_creates_archive() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("hello.txt");
        fs::write(&input, b"hello, hello, hello, hello").unwrap();

        let archive = Archive::new(dir.path().join("new"));
        let summary = archive.add(&[input], &mut NullReporter).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                rewritten: true
            }
        );
        assert!(dir.path().join("new.car").exists());
        assert_eq!(archive.count().unwrap(), 1);
    }

    #[test]
    fn test_no_op_rewrite_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.txt");
        fs::write(&input, b"aaaa").unwrap();
        let archive = Archive::new(dir.path().join("t.car"));
        archive.add(&[input], &mut NullReporter).unwrap();
        let before = fs::read(archive.path()).unwrap();

        let summary = archive
            .delete(&SelectorSet::new(["zzz"]), &mut NullReporter)
            .unwrap();
        assert_eq!(summary.processed, 0);
        assert!(!summary.rewritten);
        assert_eq!(fs::read(archive.path()).unwrap(), before);

        // No temporary files left next to the archive.
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_seal_drops_stale_tail() {
        let dir = tempfile::tempdir().unwrap();
        let mut dest = BufWriter::new(NamedTempFile::new_in(dir.path()).unwrap());
        dest.write_all(&[0xAA; 40]).unwrap();
        dest.seek(SeekFrom::Start(12)).unwrap();

        let temp = seal(dest).unwrap();
        let image = fs::read(temp.path()).unwrap();
        assert_eq!(image.len(), 13);
        assert_eq!(image[12], 0);
        assert!(image[..12].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_incompressible_input_leaves_nothing_after_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let mut seed = 0x2545F491u32;
        let noise: Vec<u8> = (0..3000)
            .map(|_| {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                seed as u8
            })
            .collect();
        let input = dir.path().join("noise.bin");
        fs::write(&input, &noise).unwrap();

        let archive = Archive::new(dir.path().join("n.car"));
        archive.add(&[input], &mut NullReporter).unwrap();

        // Stored payload, the terminator, and nothing after it.
        let image = fs::read(archive.path()).unwrap();
        assert_eq!(image.len(), "noise.bin".len() + 1 + 17 + noise.len() + 1);
        assert_eq!(image.last(), Some(&0));
        assert_eq!(archive.entries().unwrap()[0].method, carman_core::Method::Stored);
    }

    #[test]
    fn test_truncated_archive_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("t.txt");
        fs::write(&input, b"some text, some text, some text, some text").unwrap();
        let archive = Archive::new(dir.path().join("t.car"));
        archive.add(&[input], &mut NullReporter).unwrap();

        let image = fs::read(archive.path()).unwrap();
        for cut in [image.len() - 1, image.len() - 5] {
            fs::write(archive.path(), &image[..cut]).unwrap();
            let result = archive.list(&SelectorSet::all(), &mut NullReporter);
            assert!(matches!(result, Err(CarError::Io(_))), "cut at {cut}");
            assert!(archive.entries().is_err());
        }
    }

    #[test]
    fn test_print_to_writer() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("p.txt");
        fs::write(&input, b"printed payload").unwrap();
        let archive = Archive::new(dir.path().join("p.car"));
        archive.add(&[input], &mut NullReporter).unwrap();

        let mut out = Vec::new();
        let mut reporter = RecordingReporter::new();
        let summary = archive
            .print(&SelectorSet::all(), &mut out, &mut reporter)
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(out, b"printed payload");
    }
}
