//! Archive run configuration.

use std::path::{Path, PathBuf};

/// Default archive file extension, appended to bare names.
pub const DEFAULT_EXTENSION: &str = "car";

/// Where an archive run reads and writes files other than the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Directory Replace looks in for files named after entries.
    pub input_dir: PathBuf,
    /// Directory Extract writes into. Created if missing.
    pub output_dir: PathBuf,
    /// Directory for the temporary archive. `None` uses the archive's own
    /// directory so the final rename stays on one filesystem.
    pub temp_dir: Option<PathBuf>,
}

impl ArchiveOptions {
    /// Options rooted at the current directory.
    pub fn new() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            temp_dir: None,
        }
    }

    /// Builder method to set the replacement input directory.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Builder method to set the extraction directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to set the temporary archive directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Directory the temporary archive is created in for `archive`.
    pub fn temp_dir_for(&self, archive: &Path) -> PathBuf {
        if let Some(dir) = &self.temp_dir {
            return dir.clone();
        }
        match archive.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the archive path the way users type it.
///
/// If `path` does not exist and its file name has no extension, `.car` is
/// appended.
pub fn resolve_archive_path(path: &Path) -> PathBuf {
    if path.exists() || path.extension().is_some() {
        return path.to_path_buf();
    }
    path.with_extension(DEFAULT_EXTENSION)
}
