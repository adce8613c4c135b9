//! Functionality for working with per-basepair reference sequence data.
//!
//! The reference genome is read either through an indexed FASTA file (see
//! [`nucleotide::LazyNucleotideSequences`]), which reads only the requested region off disk,
//! or loaded entirely into memory (see [`nucleotide::NucleotideSequences`]) when there is no
//! `.fai` index alongside the FASTA file. The [`SequenceExtractor`] one-hot encodes the
//! reference sequence under a batch of intervals.

pub mod lazy;
pub mod nucleotide;

use log::debug;
use ndarray::{Array2, Array3, ArrayView2, Axis};
use std::path::{Path, PathBuf};

use crate::error::SeqDistError;
use crate::intervals::Interval;
use crate::traits::{Extractor, Sequences};
use crate::Position;
use nucleotide::{LazyNucleotideSequences, NucleotideSequences};

/// The one-hot alphabet, in column order.
pub const ALPHABET: [u8; 4] = *b"ACGT";

/// Number of one-hot columns.
pub const NUM_SEQ_CHARS: usize = ALPHABET.len();

fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// One-hot encode a nucleotide sequence into a `(len, 4)` array, with columns in
/// `A, C, G, T` order. Encoding is case-insensitive; any other character (e.g. `N`)
/// is encoded as a row of zeros.
pub fn one_hot_encode(seq: &[u8]) -> Array2<f32> {
    let mut encoded = Array2::zeros((seq.len(), NUM_SEQ_CHARS));
    for (i, base) in seq.iter().enumerate() {
        if let Some(j) = base_index(*base) {
            encoded[[i, j]] = 1.0;
        }
    }
    encoded
}

/// Decode a one-hot `(len, 4)` array back into a sequence. All-zero rows decode to `N`.
pub fn one_hot_decode(encoded: &ArrayView2<f32>) -> String {
    encoded
        .outer_iter()
        .map(|row| {
            row.iter()
                .position(|v| *v > 0.0)
                .map_or('N', |j| ALPHABET[j] as char)
        })
        .collect()
}

/// A reference genome, either accessed lazily through a FASTA index or held in memory.
#[derive(Debug)]
pub enum ReferenceGenome {
    Indexed(LazyNucleotideSequences),
    InMemory(NucleotideSequences),
}

/// The `.fai` index path for a FASTA file.
fn fai_path(filepath: &Path) -> PathBuf {
    let mut fai = filepath.as_os_str().to_owned();
    fai.push(".fai");
    PathBuf::from(fai)
}

impl ReferenceGenome {
    /// Open a FASTA file. If an index (`<file>.fai`) exists, sequences are loaded
    /// lazily; otherwise the whole file is read into memory.
    pub fn open(filepath: impl Into<PathBuf>) -> Result<Self, SeqDistError> {
        let filepath = filepath.into();
        if fai_path(&filepath).exists() {
            debug!("opening indexed FASTA file {}", filepath.display());
            Ok(ReferenceGenome::Indexed(LazyNucleotideSequences::new(
                filepath, None,
            )?))
        } else {
            debug!(
                "no FASTA index for {}; loading all sequences into memory",
                filepath.display()
            );
            Ok(ReferenceGenome::InMemory(NucleotideSequences::from_fasta(
                filepath, None,
            )?))
        }
    }

    /// Apply `func` to the nucleotides of `[start, end)` on `seqname`.
    pub fn region_map<V, F>(
        &self,
        func: &F,
        seqname: &str,
        start: Position,
        end: Position,
    ) -> Result<V, SeqDistError>
    where
        F: Fn(&[u8]) -> V,
    {
        match self {
            ReferenceGenome::Indexed(seqs) => seqs.region_map(func, seqname, start, end),
            ReferenceGenome::InMemory(seqs) => seqs.region_map(func, seqname, start, end),
        }
    }
}

/// Extracts one-hot encoded reference sequence for intervals.
#[derive(Debug)]
pub struct SequenceExtractor {
    reference: ReferenceGenome,
}

impl SequenceExtractor {
    /// Create a new [`SequenceExtractor`] from a FASTA file path.
    pub fn new(fasta_file: impl Into<PathBuf>) -> Result<Self, SeqDistError> {
        Ok(Self {
            reference: ReferenceGenome::open(fasta_file)?,
        })
    }

    pub fn from_reference(reference: ReferenceGenome) -> Self {
        Self { reference }
    }

    /// One-hot encode the sequence under a single interval, shape `(width, 4)`.
    pub fn extract_one(&self, interval: &Interval) -> Result<Array2<f32>, SeqDistError> {
        self.reference.region_map(
            &one_hot_encode,
            &interval.seqname,
            interval.start,
            interval.end,
        )
    }
}

impl Extractor for SequenceExtractor {
    type Output = Array3<f32>;

    /// Extract a `(n, width, 4)` batch. All intervals must have the width of the
    /// first interval.
    fn extract(&self, intervals: &[Interval]) -> Result<Self::Output, SeqDistError> {
        let width = intervals.first().map_or(0, |i| i.width());
        let mut batch = Array3::zeros((intervals.len(), width as usize, NUM_SEQ_CHARS));
        for (i, interval) in intervals.iter().enumerate() {
            if interval.width() != width {
                return Err(SeqDistError::IntervalWidthMismatch {
                    expected: width,
                    found: interval.width(),
                });
            }
            let encoded = self.extract_one(interval)?;
            batch.index_axis_mut(Axis(0), i).assign(&encoded);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::{random_sequence, temp_text_file};
    use ndarray::array;

    #[test]
    fn test_one_hot_encode() {
        let encoded = one_hot_encode(b"ACgtN");
        assert_eq!(
            encoded,
            array![
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn test_one_hot_decode() {
        let seq = random_sequence(250);
        let encoded = one_hot_encode(seq.as_bytes());
        assert_eq!(encoded.sum(), 250.0);
        assert_eq!(one_hot_decode(&encoded.view()), seq);
        assert_eq!(one_hot_decode(&one_hot_encode(b"ANa").view()), "ANA");
    }

    #[test]
    fn test_extract_indexed() {
        let extractor = SequenceExtractor::new("tests_data/sequences/test_case_01.fa").unwrap();
        assert!(matches!(extractor.reference, ReferenceGenome::Indexed(_)));
        let intervals = vec![Interval::new("chr1", 0, 4), Interval::new("chr1", 3, 7)];
        let batch = extractor.extract(&intervals).unwrap();
        assert_eq!(batch.shape(), &[2, 4, 4]);
        // TTCA, ACTA
        assert_eq!(one_hot_decode(&batch.index_axis(Axis(0), 0)), "TTCA");
        assert_eq!(one_hot_decode(&batch.index_axis(Axis(0), 1)), "ACTA");
    }

    #[test]
    fn test_extract_in_memory() {
        let fasta = temp_text_file(">chr9\nACGTN\nacgt\n");
        let extractor = SequenceExtractor::new(fasta.path()).unwrap();
        assert!(matches!(extractor.reference, ReferenceGenome::InMemory(_)));
        let encoded = extractor
            .extract_one(&Interval::new("chr9", 3, 7))
            .unwrap();
        assert_eq!(one_hot_decode(&encoded.view()), "TNAC");
    }

    #[test]
    fn test_extract_mixed_widths() {
        let extractor = SequenceExtractor::new("tests_data/sequences/test_case_01.fa").unwrap();
        let intervals = vec![Interval::new("chr1", 0, 4), Interval::new("chr1", 0, 5)];
        assert!(matches!(
            extractor.extract(&intervals),
            Err(SeqDistError::IntervalWidthMismatch {
                expected: 4,
                found: 5
            })
        ));
    }
}
