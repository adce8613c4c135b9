//! The [`SeqDistError`] `enum` definition and error messages.
//!
use crate::Position;
use genomap::GenomeMapError;
use std::num::{ParseFloatError, ParseIntError};
use std::string::FromUtf8Error;
use thiserror::Error;

/// The [`SeqDistError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum SeqDistError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("TSV reading error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    // File parsing related errors
    #[error("Integer parsing error: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("Float parsing error: {0}")]
    ParseFloatError(#[from] ParseFloatError),
    #[error("Sequence name is not valid UTF8: {0}")]
    FromUtf8Error(#[from] FromUtf8Error),
    #[error("Bed-like file has too few columns ({0}). The first three columns must be sequence name, and start and end positions.\nLine: {1}")]
    BedTooFewColumns(usize, String),
    #[error("Column had type '{found_value}' but expected type '{expected_type}'.\nLine: {line}")]
    InvalidColumnType {
        expected_type: String,
        found_value: String,
        line: String,
    },
    #[error("Invalid strand '{0}': must be either '+', '-', or '.'")]
    InvalidStrand(String),
    #[error("GTF line {0} has {1} columns, but exactly 9 are required.")]
    GtfWrongColumnCount(u64, usize),

    // Sequence errors
    #[error("Sequence name '{0}' is not in the reference genome")]
    MissingSequenceName(String),
    #[error("Range [{0}, {1}] is invalid for sequence of length {2}")]
    InvalidGenomicRangeForSequence(Position, Position, Position),
    #[error("Range invalid: start ({0}) must be less than end ({1})")]
    InvalidGenomicRange(Position, Position),
    #[error("Sequence '{0}' is too long for a 32-bit position")]
    SequenceTooLong(String),
    #[error("Error encountered in genomap::GenomeMap")]
    GenomeMapError(#[from] GenomeMapError),

    // Configuration errors
    #[error("Target file has {targets} entries, but the interval file has {intervals}")]
    TargetLengthMismatch { targets: usize, intervals: usize },
    #[error("Landmarks do not match the pipeline artifact: configured {configured:?}, artifact was fit on {artifact:?}")]
    LandmarkMismatch {
        configured: Vec<String>,
        artifact: Vec<String>,
    },
    #[error("Invalid pipeline artifact: {0}")]
    InvalidPipelineArtifact(String),
    #[error("Unsupported pipeline artifact version {0}")]
    UnsupportedArtifactVersion(u32),
    #[error("Unknown landmark '{0}'")]
    UnknownLandmark(String),

    // Lookup errors
    #[error("Expected the interval to be {expected} wide. Received end - start = {found}")]
    IntervalWidthMismatch { expected: Position, found: Position },
    #[error("No '{landmark}' landmark found on sequence '{seqname}' (strand: {strand})")]
    MissingLandmark {
        landmark: String,
        seqname: String,
        strand: String,
    },
    #[error("Index {index} is out of bounds for {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },

    // Command line tool related errors
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}
