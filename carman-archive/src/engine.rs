//! The archive command engine.
//!
//! Every command is one sequential pass over the existing archive. For each
//! entry the engine decides to copy it, skip it, replace it with fresh
//! content, or decode it to a sink:
//!
//! | Command   | Selected entry                          | Other entry |
//! |-----------|-----------------------------------------|-------------|
//! | Add       | dropped (new copy already written)      | copied      |
//! | Replace   | recompressed from disk, or copied       | copied      |
//! | Delete    | dropped                                 | copied      |
//! | List      | reported                                | skipped     |
//! | Extract   | decoded to a file                       | skipped     |
//! | Print     | decoded to a writer                     | skipped     |
//! | Test      | decoded and verified                    | skipped     |
//!
//! Add, Replace and Delete write a complete new archive to a [`Destination`];
//! the caller swaps it in afterwards.

use crate::header::{HeaderSlot, commit_header, read_header, reserve_header, write_header};
use crate::options::ArchiveOptions;
use crate::report::{Action, ArchiveEvent, Reporter};
use crate::selector::SelectorSet;
use crate::sink::ExtractSink;
use carman_core::crc::Crc32;
use carman_core::entry::{Entry, Method};
use carman_core::error::{CarError, Result};
use carman_lzss::{EncodeOutcome, LzssDecoder, LzssEncoder};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const COPY_BUFFER_SIZE: usize = 8192;

/// A seekable output for a rewritten archive.
pub trait Destination: Write + Seek {}

impl<T: Write + Seek + ?Sized> Destination for T {}

/// An archive command.
pub enum Command<'a> {
    /// Add files, superseding entries with the same name.
    Add(&'a [PathBuf]),
    /// Recompress selected entries from files named after them.
    Replace,
    /// Remove selected entries.
    Delete,
    /// Describe selected entries.
    List,
    /// Decode selected entries into the output directory.
    Extract,
    /// Decode selected entries onto a writer.
    Print(&'a mut dyn Write),
    /// Decode selected entries and verify their CRCs.
    Test,
}

impl Command<'_> {
    /// Whether the command produces a new archive.
    pub fn rewrites(&self) -> bool {
        matches!(self, Self::Add(_) | Self::Replace | Self::Delete)
    }

    /// Command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Extract => "extract",
            Self::Print(_) => "print",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Debug for Command<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add(inputs) => f.debug_tuple("Add").field(inputs).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Codec contexts and collaborators for one archive run.
pub struct Engine<'a> {
    options: &'a ArchiveOptions,
    reporter: &'a mut dyn Reporter,
    encoder: LzssEncoder,
    decoder: LzssDecoder,
}

impl<'a> Engine<'a> {
    /// Create an engine for one run.
    pub fn new(options: &'a ArchiveOptions, reporter: &'a mut dyn Reporter) -> Self {
        Self {
            options,
            reporter,
            encoder: LzssEncoder::new(),
            decoder: LzssDecoder::new(),
        }
    }

    /// Run `command` over `source` and return the number of entries it
    /// processed.
    ///
    /// `source` is `None` only when adding to an archive that does not exist
    /// yet. Rewriting commands need a `dest`; on return it is positioned
    /// after the last entry written, ready for the terminator.
    pub fn process<R: Read + Seek>(
        &mut self,
        command: &mut Command<'_>,
        selectors: &SelectorSet,
        source: Option<&mut R>,
        mut dest: Option<&mut dyn Destination>,
    ) -> Result<usize> {
        if command.rewrites() && dest.is_none() {
            return Err(missing_destination(command));
        }

        let mut processed = 0;
        let mut inserted: Vec<String> = Vec::new();

        if let (Command::Add(inputs), Some(dest)) = (&*command, dest.as_deref_mut()) {
            for path in inputs.iter() {
                if let Some(entry) = self.add_input(path, &inserted, dest)? {
                    inserted.push(entry.name);
                    processed += 1;
                }
            }
        }

        let Some(source) = source else {
            return Ok(processed);
        };
        let archive_len = stream_len(source)?;

        while let Some(entry) = read_header(source)? {
            let selected = match command {
                Command::Add(_) => inserted.contains(&entry.name),
                _ => selectors.matches(&entry.name),
            };

            match (&mut *command, dest.as_deref_mut()) {
                (Command::Add(_), Some(dest)) => {
                    if selected {
                        debug!(name = %entry.name, "superseded by added file");
                        skip_payload(source, &entry, archive_len)?;
                    } else {
                        self.copy_entry(source, dest, &entry)?;
                    }
                }
                (Command::Delete, Some(dest)) => {
                    if selected {
                        skip_payload(source, &entry, archive_len)?;
                        debug!(name = %entry.name, "deleted");
                        self.finished(Action::Deleting, &entry);
                        processed += 1;
                    } else {
                        self.copy_entry(source, dest, &entry)?;
                    }
                }
                (Command::Replace, Some(dest)) => {
                    if selected {
                        if self.replace_entry(source, dest, &entry, archive_len)? {
                            processed += 1;
                        }
                    } else {
                        self.copy_entry(source, dest, &entry)?;
                    }
                }
                (Command::List, _) => {
                    if selected {
                        self.finished(Action::Listing, &entry);
                        processed += 1;
                    }
                    skip_payload(source, &entry, archive_len)?;
                }
                (Command::Extract, _) => {
                    let options = self.options;
                    let mut sink = ExtractSink::Directory(&options.output_dir);
                    processed += self.visit(source, &entry, selected, &mut sink, archive_len)?;
                }
                (Command::Print(writer), _) => {
                    let mut sink = ExtractSink::Writer(&mut **writer);
                    processed += self.visit(source, &entry, selected, &mut sink, archive_len)?;
                }
                (Command::Test, _) => {
                    let mut sink = ExtractSink::Discard;
                    processed += self.visit(source, &entry, selected, &mut sink, archive_len)?;
                }
                (other, None) => return Err(missing_destination(other)),
            }
        }

        Ok(processed)
    }

    fn visit<R: Read + Seek>(
        &mut self,
        source: &mut R,
        entry: &Entry,
        selected: bool,
        sink: &mut ExtractSink<'_>,
        archive_len: u64,
    ) -> Result<usize> {
        if selected {
            Ok(usize::from(self.extract_entry(source, entry, sink, archive_len)?))
        } else {
            skip_payload(source, entry, archive_len)?;
            Ok(0)
        }
    }

    fn add_input(
        &mut self,
        path: &Path,
        inserted: &[String],
        dest: &mut dyn Destination,
    ) -> Result<Option<Entry>> {
        let display = path.display().to_string();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            let error = CarError::invalid_name(&display, "not a file name");
            self.skipped(Action::Adding, &display, &error);
            return Ok(None);
        };

        self.started(Action::Adding, &name);
        if inserted.contains(&name) {
            let error = CarError::invalid_name(&name, "duplicate file name");
            self.skipped(Action::Adding, &display, &error);
            return Ok(None);
        }
        if let Err(error) = Entry::new(name.as_str()).validate_name() {
            self.skipped(Action::Adding, &display, &error);
            return Ok(None);
        }

        let (mut file, len) = match open_with_len(path) {
            Ok(opened) => opened,
            Err(e) => {
                let error = CarError::source_unavailable(&display, e);
                self.skipped(Action::Adding, &display, &error);
                return Ok(None);
            }
        };
        self.insert(dest, Entry::new(name), &mut file, len, Action::Adding)
    }

    /// Returns whether the entry was replaced. An entry whose replacement
    /// cannot be read is copied unchanged.
    fn replace_entry<R: Read + Seek>(
        &mut self,
        source: &mut R,
        dest: &mut dyn Destination,
        entry: &Entry,
        archive_len: u64,
    ) -> Result<bool> {
        self.started(Action::Replacing, &entry.name);
        let inserted = match entry.validate_path() {
            Ok(()) => {
                let path = self.options.input_dir.join(entry.relative_path());
                match open_with_len(&path) {
                    Ok((mut file, len)) => {
                        let fresh = Entry::from_name_bytes(entry.name_bytes().to_vec());
                        self.insert(dest, fresh, &mut file, len, Action::Replacing)?
                    }
                    Err(e) => {
                        let error = CarError::source_unavailable(path.display().to_string(), e);
                        self.skipped(Action::Replacing, &entry.name, &error);
                        None
                    }
                }
            }
            Err(error) => {
                self.skipped(Action::Replacing, &entry.name, &error);
                None
            }
        };

        if inserted.is_some() {
            skip_payload(source, entry, archive_len)?;
            Ok(true)
        } else {
            self.copy_entry(source, dest, entry)?;
            Ok(false)
        }
    }

    /// Write `input` as a new entry: try LZSS, fall back to storing.
    fn insert<I: Read + Seek>(
        &mut self,
        dest: &mut dyn Destination,
        entry: Entry,
        input: &mut I,
        len: u64,
        action: Action,
    ) -> Result<Option<Entry>> {
        let Ok(size) = u32::try_from(len) else {
            let error = CarError::entry_too_large(&entry.name, len);
            self.skipped(action, &entry.name, &error);
            return Ok(None);
        };

        let mut entry = entry.with_method(Method::Lzss).with_sizes(size, 0);
        let slot = reserve_header(dest, &mut entry)?;

        match self.write_payload(dest, &slot, input, &mut entry) {
            Ok(()) => {}
            Err(error) if !error.is_fatal() => {
                dest.seek(SeekFrom::Start(slot.offset))?;
                self.skipped(action, &entry.name, &error);
                return Ok(None);
            }
            Err(error) => return Err(error),
        }

        commit_header(dest, &slot, &mut entry)?;
        debug!(
            name = %entry.name,
            method = %entry.method,
            original = entry.original_size,
            compressed = entry.compressed_size,
            "inserted"
        );
        self.finished(action, &entry);
        Ok(Some(entry))
    }

    fn write_payload<I: Read + Seek>(
        &mut self,
        dest: &mut dyn Destination,
        slot: &HeaderSlot,
        input: &mut I,
        entry: &mut Entry,
    ) -> Result<()> {
        let size = entry.original_size;
        let outcome = self
            .encoder
            .compress(&mut (&mut *input).take(u64::from(size)), dest, size)?;

        match outcome {
            EncodeOutcome::Compressed {
                compressed_size,
                crc,
            } => {
                entry.method = Method::Lzss;
                entry.compressed_size = compressed_size;
                entry.original_crc = crc;
            }
            EncodeOutcome::Incompressible => {
                dest.seek(SeekFrom::Start(slot.payload_start))?;
                input.seek(SeekFrom::Start(0))?;
                let (copied, crc) = copy_with_crc(&mut (&mut *input).take(u64::from(size)), dest)?;
                if copied != u64::from(size) {
                    return Err(CarError::corrupted(format!(
                        "input yielded {} bytes, expected {}",
                        copied, size
                    )));
                }
                entry.method = Method::Stored;
                entry.compressed_size = size;
                entry.original_crc = crc;
            }
        }
        Ok(())
    }

    fn copy_entry<R: Read>(
        &mut self,
        source: &mut R,
        dest: &mut dyn Destination,
        entry: &Entry,
    ) -> Result<()> {
        let mut header = entry.clone();
        write_header(dest, &mut header)?;

        let expected = u64::from(entry.compressed_size);
        let copied = io::copy(&mut (&mut *source).take(expected), dest)?;
        if copied != expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("archive ended inside {}", entry.name),
            )
            .into());
        }
        debug!(name = %entry.name, "copied");
        self.finished(Action::Copying, entry);
        Ok(())
    }

    /// Returns whether the entry decoded cleanly. The source is left at the
    /// next header either way.
    fn extract_entry<R: Read + Seek>(
        &mut self,
        source: &mut R,
        entry: &Entry,
        sink: &mut ExtractSink<'_>,
        archive_len: u64,
    ) -> Result<bool> {
        let action = sink.action();
        self.started(action, &entry.name);

        let end = payload_end(source, entry, archive_len)?;
        let result = self.decode_to_sink(source, entry, sink);
        source.seek(SeekFrom::Start(end))?;

        match result {
            Ok(()) => {
                self.finished(action, entry);
                Ok(true)
            }
            Err(error) if !error.is_fatal() => {
                self.skipped(action, &entry.name, &error);
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    fn decode_to_sink<R: Read>(
        &mut self,
        source: &mut R,
        entry: &Entry,
        sink: &mut ExtractSink<'_>,
    ) -> Result<()> {
        match sink {
            ExtractSink::Directory(dir) => {
                entry.validate_path()?;
                let path = dir.join(entry.relative_path());
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        CarError::source_unavailable(parent.display().to_string(), e)
                    })?;
                }
                let file = File::create(&path)
                    .map_err(|e| CarError::source_unavailable(path.display().to_string(), e))?;

                let mut out = BufWriter::new(file);
                let result = self
                    .decode_payload(source, entry, &mut out)
                    .and_then(|()| out.flush().map_err(CarError::from));
                drop(out);
                if result.is_err() {
                    // Never leave a partial or unverified file behind.
                    let _ = fs::remove_file(&path);
                }
                result
            }
            ExtractSink::Writer(writer) => {
                self.decode_payload(source, entry, &mut **writer)?;
                writer.flush()?;
                Ok(())
            }
            ExtractSink::Discard => self.decode_payload(source, entry, &mut io::sink()),
        }
    }

    fn decode_payload<R: Read, W: Write + ?Sized>(
        &mut self,
        source: &mut R,
        entry: &Entry,
        out: &mut W,
    ) -> Result<()> {
        let computed = match entry.method {
            Method::Stored => {
                let expected = u64::from(entry.original_size);
                let (copied, crc) = copy_with_crc(&mut (&mut *source).take(expected), out)?;
                if copied != expected || entry.compressed_size != entry.original_size {
                    return Err(CarError::corrupted(format!(
                        "stored payload of {} is {} bytes, header says {}",
                        entry.name, copied, entry.compressed_size
                    )));
                }
                crc
            }
            Method::Lzss => self.decoder.expand(
                &mut (&mut *source).take(u64::from(entry.compressed_size)),
                out,
                entry.original_size,
            )?,
            Method::Unknown(byte) => return Err(CarError::unsupported_method(byte)),
        };

        if computed != entry.original_crc {
            return Err(CarError::crc_mismatch(entry.original_crc, computed));
        }
        Ok(())
    }

    fn started(&mut self, action: Action, name: &str) {
        self.reporter.report(&ArchiveEvent::Started { action, name });
    }

    fn finished(&mut self, action: Action, entry: &Entry) {
        self.reporter
            .report(&ArchiveEvent::Finished { action, entry });
    }

    fn skipped(&mut self, action: Action, name: &str, error: &CarError) {
        debug!(name, %error, "{} skipped", action);
        self.reporter.report(&ArchiveEvent::Skipped {
            action,
            name,
            error,
        });
    }
}

fn missing_destination(command: &Command<'_>) -> CarError {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} needs an output archive", command.name()),
    )
    .into()
}

fn stream_len<R: Seek + ?Sized>(source: &mut R) -> io::Result<u64> {
    let position = source.stream_position()?;
    let len = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(position))?;
    Ok(len)
}

/// Offset just past the payload of `entry`, which must lie within the archive.
fn payload_end<R: Seek + ?Sized>(source: &mut R, entry: &Entry, archive_len: u64) -> Result<u64> {
    let end = source.stream_position()? + u64::from(entry.compressed_size);
    if end > archive_len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("archive ends inside the payload of {}", entry.name),
        )
        .into());
    }
    Ok(end)
}

fn skip_payload<R: Seek + ?Sized>(source: &mut R, entry: &Entry, archive_len: u64) -> Result<()> {
    let end = payload_end(source, entry, archive_len)?;
    source.seek(SeekFrom::Start(end))?;
    Ok(())
}

fn open_with_len(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let meta = file.metadata()?;
    if !meta.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
    }
    Ok((file, meta.len()))
}

/// Copy everything from `reader`, returning the byte count and its CRC.
fn copy_with_crc<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(u64, u32)> {
    let mut crc = Crc32::new();
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buffer[..n])?;
        crc.update(&buffer[..n]);
        total += n as u64;
    }
    Ok((total, crc.finalize()))
}
