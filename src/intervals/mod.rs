//! Genomic intervals and random-access interval files.
//!
//! Intervals are read from BED-like TSV files, with the columns
//! `chrom start end [name [score [strand]]]`. Two [`IntervalAccess`] implementations
//! are provided:
//!
//!  - [`LineCacheIntervals`]: builds a line offset index once, so that retrieving the
//!    `i`-th interval is a single seek and line read.
//!  - [`ScanIntervals`]: a reference implementation that reads the file from the start
//!    on each access.
//!
//! [`IntervalAccess`]: crate::traits::IntervalAccess

pub mod linecache;
pub mod scan;

pub use linecache::LineCacheIntervals;
pub use scan::ScanIntervals;

use std::fmt;
use std::str::FromStr;

use crate::error::SeqDistError;
use crate::io::parsers::parse_column;
use crate::io::tsv::TsvConfig;
use crate::traits::TsvSerialize;
use crate::{Distance, Position};

/// Nucleotide strand enum type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse a strand column, where `.` indicates an unknown strand.
    pub fn parse_optional(column: &str) -> Result<Option<Strand>, SeqDistError> {
        match column {
            "." => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for Strand {
    type Err = SeqDistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            _ => Err(SeqDistError::InvalidStrand(s.to_string())),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// A genomic interval, 0-indexed and right-exclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub name: Option<String>,
    pub score: Option<f64>,
    pub strand: Option<Strand>,
}

impl Interval {
    /// Create a new interval without name, score, or strand.
    pub fn new(seqname: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            seqname: seqname.into(),
            start,
            end,
            name: None,
            score: None,
            strand: None,
        }
    }

    /// Set the strand (builder-style).
    pub fn with_strand(mut self, strand: Option<Strand>) -> Self {
        self.strand = strand;
        self
    }

    pub fn width(&self) -> Position {
        self.end.saturating_sub(self.start)
    }

    /// The midpoint, `floor((start + end) / 2)`.
    pub fn midpoint(&self) -> Distance {
        (self.start as Distance + self.end as Distance) / 2
    }

    /// The strand as a string, `.` if unknown.
    pub fn strand_str(&self) -> String {
        self.strand.map_or(".".to_string(), |s| s.to_string())
    }
}

/// Parses a BED-like line into an [`Interval`]. At least the three range columns are
/// required; the name, score, and strand columns are optional, and `.` indicates a
/// missing score or strand.
pub fn parse_interval(line: &str) -> Result<Interval, SeqDistError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < 3 {
        return Err(SeqDistError::BedTooFewColumns(
            columns.len(),
            line.to_string(),
        ));
    }

    let seqname = columns[0].to_string();
    let start: Position = parse_column(columns[1], line)?;
    let end: Position = parse_column(columns[2], line)?;
    let name = columns.get(3).map(|s| s.to_string());
    let score = match columns.get(4) {
        None | Some(&".") => None,
        Some(column) => Some(parse_column::<f64>(column, line)?),
    };
    let strand = match columns.get(5) {
        None => None,
        Some(column) => Strand::parse_optional(column)?,
    };

    Ok(Interval {
        seqname,
        start,
        end,
        name,
        score,
        strand,
    })
}

impl TsvSerialize for Interval {
    /// Serialize as a six column BED line, with missing values as `no_value_string`.
    fn to_tsv(&self, config: &TsvConfig) -> String {
        let missing = || config.no_value_string.clone();
        [
            self.seqname.clone(),
            self.start.to_string(),
            self.end.to_string(),
            self.name.clone().unwrap_or_else(missing),
            self.score.map_or_else(missing, |s| s.to_string()),
            self.strand.map_or_else(missing, |s| s.to_string()),
        ]
        .join("\t")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BED_TSV;

    #[test]
    fn test_parse_bed6() {
        let interval = parse_interval("chr22\t100\t201\tpeak1\t0.5\t-\n").unwrap();
        assert_eq!(interval.seqname, "chr22");
        assert_eq!(interval.width(), 101);
        assert_eq!(interval.name.as_deref(), Some("peak1"));
        assert_eq!(interval.score, Some(0.5));
        assert_eq!(interval.strand, Some(Strand::Reverse));
        assert_eq!(interval.midpoint(), 150);
    }

    #[test]
    fn test_parse_bed3_and_missing() {
        let interval = parse_interval("chr1\t0\t101").unwrap();
        assert_eq!(interval.strand, None);
        assert_eq!(interval.name, None);

        let interval = parse_interval("chr1\t0\t101\tx\t.\t.").unwrap();
        assert_eq!(interval.score, None);
        assert_eq!(interval.strand, None);
        assert_eq!(interval.strand_str(), ".");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_interval("chr1\t0"),
            Err(SeqDistError::BedTooFewColumns(2, _))
        ));
        assert!(matches!(
            parse_interval("chr1\tzero\t10"),
            Err(SeqDistError::InvalidColumnType { .. })
        ));
        assert!(matches!(
            parse_interval("chr1\t0\t10\tx\t1\t*"),
            Err(SeqDistError::InvalidStrand(_))
        ));
    }

    #[test]
    fn test_to_tsv() {
        let line = "chr22\t100\t201\tpeak1\t0.5\t-";
        assert_eq!(parse_interval(line).unwrap().to_tsv(&BED_TSV), line);
        let interval = Interval::new("chr1", 0, 101).with_strand(Some(Strand::Forward));
        assert_eq!(interval.to_tsv(&BED_TSV), "chr1\t0\t101\t.\t.\t+");
    }

    #[test]
    fn test_midpoint_floors() {
        let interval = Interval::new("chr1", 0, 101);
        assert_eq!(interval.midpoint(), 50);
    }
}
