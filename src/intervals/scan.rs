//! The reference (scanning) interval accessor.
//!
//! [`ScanIntervals`] reads from the start of the file on every access, so retrieving
//! the `i`-th interval is `O(i)`. It is mainly useful for validating
//! [`LineCacheIntervals`](super::LineCacheIntervals).

use std::io::BufRead;
use std::path::PathBuf;

use super::{parse_interval, Interval};
use crate::error::SeqDistError;
use crate::io::InputStream;
use crate::traits::IntervalAccess;

/// Sequential access to a BED-like file's records.
#[derive(Clone, Debug)]
pub struct ScanIntervals {
    input: InputStream,
    len: usize,
}

fn is_record(line: &str) -> bool {
    !line.trim().is_empty() && !line.starts_with('#')
}

impl ScanIntervals {
    /// Count the records of `filepath`.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, SeqDistError> {
        let input = InputStream::new(filepath);
        let mut len = 0;
        for line in input.reader()?.lines() {
            if is_record(&line?) {
                len += 1;
            }
        }
        Ok(Self { input, len })
    }

    /// Iterate over all intervals, in file order.
    pub fn iter(
        &self,
    ) -> Result<impl Iterator<Item = Result<Interval, SeqDistError>>, SeqDistError> {
        let lines = self.input.reader()?.lines();
        Ok(lines.filter_map(|line| match line {
            Ok(line) if is_record(&line) => Some(parse_interval(&line)),
            Ok(_) => None,
            Err(e) => Some(Err(e.into())),
        }))
    }
}

impl IntervalAccess for ScanIntervals {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> Result<Interval, SeqDistError> {
        self.iter()?
            .nth(index)
            .unwrap_or(Err(SeqDistError::IndexOutOfBounds {
                index,
                len: self.len,
            }))
    }
}
