//! The fast interval accessor.
//!
//! [`LineCacheIntervals`] scans the interval file once at construction, recording
//! the byte offset at which each record starts. Access to the `i`-th interval is then
//! a seek and a single line read. No file handle is kept open between lookups, so the
//! accessor can be shared before worker processes or threads are spawned.
//!
//! Gzip-compressed files can't be seeked into, so their records are held in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::PathBuf;

use super::{parse_interval, Interval};
use crate::error::SeqDistError;
use crate::io::InputStream;
use crate::traits::IntervalAccess;

#[derive(Clone, Debug)]
enum LineStore {
    /// Byte offsets to the start of each record line.
    Offsets(Vec<u64>),
    /// Decompressed record lines.
    InMemory(Vec<String>),
}

/// Random access to a BED-like file's records by line index.
///
/// Empty lines and lines starting with `#` are not records, and are not counted.
#[derive(Clone, Debug)]
pub struct LineCacheIntervals {
    filepath: PathBuf,
    store: LineStore,
}

fn is_record(line: &[u8]) -> bool {
    line.iter().any(|b| !b.is_ascii_whitespace()) && !line.starts_with(b"#")
}

impl LineCacheIntervals {
    /// Build the line index for `filepath`.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, SeqDistError> {
        let filepath = filepath.into();
        let input = InputStream::new(&filepath);

        let store = if input.is_gzipped()? {
            let lines = input
                .read_lines()?
                .into_iter()
                .filter(|line| is_record(line.as_bytes()))
                .collect();
            LineStore::InMemory(lines)
        } else {
            let mut reader = BufReader::new(File::open(&filepath)?);
            let mut offsets = Vec::new();
            let mut buffer = Vec::new();
            let mut offset = 0u64;
            loop {
                buffer.clear();
                let bytes_read = reader.read_until(b'\n', &mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                if is_record(&buffer) {
                    offsets.push(offset);
                }
                offset += bytes_read as u64;
            }
            LineStore::Offsets(offsets)
        };

        Ok(Self { filepath, store })
    }

    /// Read the raw record line at `index`.
    fn line(&self, index: usize) -> Result<String, SeqDistError> {
        let len = self.len();
        let out_of_bounds = SeqDistError::IndexOutOfBounds { index, len };
        match &self.store {
            LineStore::Offsets(offsets) => {
                let offset = *offsets.get(index).ok_or(out_of_bounds)?;
                let mut file = File::open(&self.filepath)?;
                file.seek(SeekFrom::Start(offset))?;
                let mut reader = BufReader::new(file);
                let mut line = String::new();
                reader.read_line(&mut line)?;
                Ok(line)
            }
            LineStore::InMemory(lines) => lines.get(index).cloned().ok_or(out_of_bounds),
        }
    }
}

impl IntervalAccess for LineCacheIntervals {
    fn len(&self) -> usize {
        match &self.store {
            LineStore::Offsets(offsets) => offsets.len(),
            LineStore::InMemory(lines) => lines.len(),
        }
    }

    fn get(&self, index: usize) -> Result<Interval, SeqDistError> {
        parse_interval(&self.line(index)?)
    }
}
