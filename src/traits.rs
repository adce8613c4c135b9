//! Traits used by the seqdist library.
//!

use crate::{error::SeqDistError, intervals::Interval, io::tsv::TsvConfig, Position};

/// Random access to the intervals of an interval file.
pub trait IntervalAccess {
    /// The number of intervals.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Retrieve the `index`-th (0-based) interval. Out of range indices
    /// return [`SeqDistError::IndexOutOfBounds`].
    fn get(&self, index: usize) -> Result<Interval, SeqDistError>;
}

/// An [`Extractor`] computes a batch of features for a slice of intervals, where the
/// first axis of the output is the batch axis.
pub trait Extractor {
    type Output;
    fn extract(&self, intervals: &[Interval]) -> Result<Self::Output, SeqDistError>;
}

/// The [`Sequences`] trait defines an abstraction over per-basepair genomic data, such
/// as a reference genome's nucleotides.
pub trait Sequences {
    type Container<'a>
    where
        Self: 'a;

    /// Retrieve all sequence names.
    fn seqnames(&self) -> Vec<String>;

    /// Retrieve the whole sequence for `seqname`.
    fn get_sequence(&self, seqname: &str) -> Result<Self::Container<'_>, SeqDistError>;

    /// Apply a function to the bytes of the region `[start, end)` of `seqname`.
    fn region_map<V, F>(
        &self,
        func: &F,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<V, SeqDistError>
    where
        F: Fn(&[u8]) -> V;

    /// Get the length of a particular sequence.
    fn get_sequence_length(&self, seqname: &str) -> Result<Position, SeqDistError>;
}

/// Defines how to serialize something to TSV.
pub trait TsvSerialize {
    // Serialize something to a TSV [`String`].
    fn to_tsv(&self, config: &TsvConfig) -> String;
}
