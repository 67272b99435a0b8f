//! Line-oriented access to kernel pseudo-files.
//!
//! Parsers in the sensor crates never open files themselves; they pull lines
//! through a [`LineSource`] so tests can substitute synthetic content.

use crate::{Result, SensorError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Something that can hand out the lines of a file.
///
/// Lines are returned in file order with their terminators stripped.
pub trait LineSource {
    /// Read up to `count` lines starting at the zero-based line `offset`.
    ///
    /// `None` reads to the end of the file. Returns fewer lines than
    /// requested, without error, when the file is shorter.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::SourceUnavailable`] if the file cannot be
    /// opened or read.
    fn read_window(&self, path: &Path, offset: usize, count: Option<usize>) -> Result<Vec<String>>;

    /// Read every line of the file.
    ///
    /// # Errors
    ///
    /// Same as [`LineSource::read_window`].
    fn read_all(&self, path: &Path) -> Result<Vec<String>> {
        self.read_window(path, 0, None)
    }
}

/// [`LineSource`] backed by the real filesystem.
///
/// The file handle is scoped to a single call and dropped before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLineSource;

impl LineSource for FsLineSource {
    fn read_window(&self, path: &Path, offset: usize, count: Option<usize>) -> Result<Vec<String>> {
        let file = File::open(path).map_err(|e| SensorError::source_unavailable(path, e))?;
        let reader = BufReader::new(file);

        let window = reader.lines().skip(offset);
        let lines: std::io::Result<Vec<String>> = match count {
            Some(n) => window.take(n).collect(),
            None => window.collect(),
        };
        let lines = lines.map_err(|e| SensorError::source_unavailable(path, e))?;

        tracing::trace!(path = %path.display(), offset, ?count, read = lines.len(), "read lines");
        Ok(lines)
    }
}
