//! Types and methods for working with per-basepair nucleotide sequence data.
//!
//! Currently this requires the [`noodles::fasta`] module, but their API is unstable
//! and may be a source of future pain.

use bytes::Bytes;
use genomap::GenomeMap;
use indexmap::IndexMap;
use noodles::core::Region;
use noodles::fasta::indexed_reader;
use noodles::fasta::{io::BufReadSeek, reader, record::Sequence, IndexedReader};
use std::cell::Ref;
use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, Range};
use std::path::PathBuf;
use std::str;

use super::lazy::LazyLoader;
use crate::error::SeqDistError;
use crate::traits::Sequences;
use crate::Position;

/// A newtype around raw nucleotide [`Bytes`], for making it more
/// display and other operations more convenient.
#[derive(Clone, Debug, PartialEq)]
pub struct Nucleotides(Bytes);

impl fmt::Display for Nucleotides {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Deref for Nucleotides {
    type Target = Bytes;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&Sequence> for Nucleotides {
    fn from(sequence: &Sequence) -> Self {
        let seq = Bytes::from(sequence.as_ref().to_vec());
        Nucleotides(seq)
    }
}

impl<'a> From<&'a str> for Nucleotides {
    fn from(s: &'a str) -> Self {
        let bytes = Bytes::from(s.as_bytes().to_vec());
        Nucleotides(bytes)
    }
}

impl Nucleotides {
    /// Get the length of the nucleotide sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether this is an empty object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate that `[start, end)` lies within a sequence of `length`, returning it as a
/// slicing [`Range`].
pub fn try_range(
    start: Position,
    end: Position,
    length: Position,
) -> Result<Range<usize>, SeqDistError> {
    if start > end {
        return Err(SeqDistError::InvalidGenomicRange(start, end));
    }
    if end > length {
        return Err(SeqDistError::InvalidGenomicRangeForSequence(
            start, end, length,
        ));
    }
    Ok(start as usize..end as usize)
}

fn sequence_length(seqname: &str, len: usize) -> Result<Position, SeqDistError> {
    Position::try_from(len).map_err(|_| SeqDistError::SequenceTooLong(seqname.to_string()))
}

/// [`NucleotideSequences`] for storing a whole genome's nucleotide sequence
/// data in-memory.
pub struct NucleotideSequences {
    data: GenomeMap<Nucleotides>,
}

impl fmt::Debug for NucleotideSequences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NucleotideSequences").finish_non_exhaustive()
    }
}

impl NucleotideSequences {
    /// Load an entire FASTA file into memory, into a [`NucleotideSequences`] object.
    ///
    /// # Arguments
    /// * `filepath`: a path to the (possible gzipped) FASTA file.
    /// * `seqnames`: an optional subset of sequences to load.
    pub fn from_fasta(
        filepath: impl Into<PathBuf>,
        seqnames: Option<Vec<String>>,
    ) -> Result<Self, SeqDistError> {
        let data = parse_fasta(filepath, seqnames)?;
        Ok(Self { data })
    }

    /// Retrieve an [`IndexMap`] of the sequence names and their lengths.
    pub fn seqlens(&self) -> Result<IndexMap<String, Position>, SeqDistError> {
        self.data
            .iter()
            .map(|(k, v)| Ok((k.clone(), sequence_length(k, v.len())?)))
            .collect()
    }
}

impl Sequences for NucleotideSequences {
    type Container<'a> = &'a Nucleotides;

    fn seqnames(&self) -> Vec<String> {
        self.data.iter().map(|(k, _)| k.clone()).collect()
    }

    fn get_sequence(&self, seqname: &str) -> Result<Self::Container<'_>, SeqDistError> {
        self.data
            .get(seqname)
            .ok_or(SeqDistError::MissingSequenceName(seqname.to_string()))
    }

    fn region_map<V, F>(
        &self,
        func: &F,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<V, SeqDistError>
    where
        F: Fn(&[u8]) -> V,
    {
        let seq = self.get_sequence(seqname)?;
        let range = try_range(start, end, sequence_length(seqname, seq.len())?)?;
        Ok(func(&seq[range]))
    }

    fn get_sequence_length(&self, seqname: &str) -> Result<Position, SeqDistError> {
        sequence_length(seqname, self.get_sequence(seqname)?.len())
    }
}

/// A region key: sequence name, and 0-based, right-exclusive start and end.
pub type RegionKey = (String, Position, Position);

/// The 1-based, closed noodles [`Region`] for a 0-based, right-exclusive range.
fn fasta_region(seqname: &str, start: Position, end: Position) -> Result<Region, SeqDistError> {
    let first = noodles::core::Position::new(start as usize + 1);
    let last = noodles::core::Position::new(end as usize);
    match (first, last) {
        (Some(first), Some(last)) if start < end => {
            Ok(Region::new(seqname.as_bytes().to_vec(), first..=last))
        }
        _ => Err(SeqDistError::InvalidGenomicRange(start, end)),
    }
}

/// Lazily read regions from an indexed FASTA file. Only the requested region is read
/// from disk, and only the most recently read region is held in memory.
#[derive(Debug)]
pub struct LazyNucleotideSequences {
    seqlens: IndexMap<String, Position>,
    lazy: LazyLoader<IndexedReader<Box<dyn BufReadSeek>>, Nucleotides, RegionKey>,
}

impl LazyNucleotideSequences {
    /// Create a new `LazyNucleotideSequences`, which can lazily retrieve regions
    /// and whole sequences from an indexed FASTA file.
    ///
    /// # Arguments
    /// * `filepath` - the path to the (optionally bgzipped) FASTA file, with a `.fai` index.
    /// * `seqnames` - optional vector of sequences to consider.
    pub fn new(
        filepath: impl Into<PathBuf>,
        seqnames: Option<Vec<String>>,
    ) -> Result<Self, SeqDistError> {
        let filepath = filepath.into();
        let reader = indexed_reader::Builder::default().build_from_path(filepath)?;
        let allowed_seqnames = option_vec_to_hashset(seqnames);

        let mut seqlens = IndexMap::new();
        for r in reader.index().iter() {
            let name = String::from_utf8(r.name().to_vec())?;
            if allowed_seqnames
                .as_ref()
                .map_or(true, |seqnames| seqnames.contains(&name))
            {
                let length = Position::try_from(r.length())
                    .map_err(|_| SeqDistError::SequenceTooLong(name.clone()))?;
                seqlens.insert(name, length);
            }
        }

        // keys are checked against `seqlens` before they reach the loader
        let lazy = LazyLoader::new(reader, |reader, key: &RegionKey| {
            let (seqname, start, end) = key;
            if start == end {
                return Ok(Nucleotides(Bytes::new()));
            }
            let region = fasta_region(seqname, *start, *end)?;
            let record = reader.query(&region)?;
            Ok(record.sequence().into())
        });

        Ok(Self { seqlens, lazy })
    }

    /// Check of the lazy-loading cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lazy.is_empty()
    }

    /// Clear the lazy-loading cache.
    pub fn clear(&self) {
        self.lazy.clear()
    }

    /// Get an [`IndexMap`] of the sequence names and their lengths.
    pub fn seqlens(&self) -> IndexMap<String, Position> {
        self.seqlens.clone()
    }

    /// The region currently held in memory, if any.
    pub fn loaded_region(&self) -> Option<RegionKey> {
        self.lazy.loaded_key()
    }

    /// Return a `bool` indicating whether the whole of `seqname` is cached.
    pub fn is_loaded(&self, seqname: &str) -> bool {
        self.seqlens.get(seqname).map_or(false, |length| {
            self.lazy.is_loaded(&(seqname.to_string(), 0, *length))
        })
    }
}

impl Sequences for LazyNucleotideSequences {
    type Container<'a> = Ref<'a, Nucleotides>;

    fn seqnames(&self) -> Vec<String> {
        self.seqlens.keys().cloned().collect()
    }

    fn get_sequence(&self, seqname: &str) -> Result<Self::Container<'_>, SeqDistError> {
        let length = self.get_sequence_length(seqname)?;
        self.lazy.get_data(&(seqname.to_string(), 0, length))
    }

    fn region_map<V, F>(
        &self,
        func: &F,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<V, SeqDistError>
    where
        F: Fn(&[u8]) -> V,
    {
        // check the range against the index before reading anything
        try_range(start, end, self.get_sequence_length(seqname)?)?;
        let seq = self.lazy.get_data(&(seqname.to_string(), start, end))?;
        Ok(func(&seq))
    }

    fn get_sequence_length(&self, seqname: &str) -> Result<Position, SeqDistError> {
        self.seqlens
            .get(seqname)
            .ok_or(SeqDistError::MissingSequenceName(seqname.to_string()))
            .copied()
    }
}

// Convert an `Option<Vec<String>>` into a `Option<HashSet<String>>`
fn option_vec_to_hashset(x: Option<Vec<String>>) -> Option<HashSet<String>> {
    x.map(HashSet::from_iter)
}

/// Use the [`noodles`] library to parse a FASTA file.
pub fn parse_fasta(
    filepath: impl Into<PathBuf>,
    seqnames: Option<Vec<String>>,
) -> Result<GenomeMap<Nucleotides>, SeqDistError> {
    let seqnames_set = option_vec_to_hashset(seqnames);

    let filepath = filepath.into();

    let mut reader = reader::Builder.build_from_path(filepath)?;

    let mut sequences = GenomeMap::new();

    for result in reader.records() {
        let record = result?;
        let name = String::from_utf8(record.definition().name().to_vec())?;
        if seqnames_set
            .as_ref()
            .map_or(true, |keep_seqnames| keep_seqnames.contains(&name))
        {
            let seq = Bytes::from(record.sequence().as_ref().to_vec());
            sequences.insert(&name, Nucleotides(seq))?;
        }
    }

    Ok(sequences)
}
