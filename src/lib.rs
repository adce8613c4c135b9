//! # seqdist
//!
//! A data loader that turns BED-like genomic intervals into model-ready records: a one-hot
//! encoded DNA sequence, plus spline-encoded distances from the interval midpoint to the nearest
//! gene landmark (transcription start sites, exon boundaries, codons, etc).
//!
//! The main entry point is [`SeqDistDataset`], which is configured by a [`DatasetConfig`] and
//! provides indexed access to [`Record`] values.
//!
//! ```no_run
//! use seqdist::prelude::*;
//!
//! let config = DatasetConfig::new(
//!     "intervals.bed",
//!     "hg38_chr22.fa",
//!     "gencode.v24.annotation_chr22.gtf",
//!     "position_transformer.json",
//! );
//! let dataset = SeqDistDataset::new(config)?;
//! let record = dataset.get(0)?;
//! assert_eq!(record.inputs.seq.shape(), &[101, 4]);
//! # Ok::<(), SeqDistError>(())
//! ```
//!
//! [`SeqDistDataset`]: crate::dataset::SeqDistDataset
//! [`DatasetConfig`]: crate::dataset::DatasetConfig
//! [`Record`]: crate::dataset::Record

pub mod commands;
pub mod dataset;
pub mod error;
pub mod intervals;
pub mod io;
pub mod landmarks;
pub mod reporting;
pub mod sequences;
pub mod test_utilities;
pub mod traits;
pub mod transform;

/// Genomic coordinate type, 0-based for intervals.
pub type Position = u32;

/// Signed distance (in basepairs) between two genomic positions.
pub type Distance = i64;

pub use error::SeqDistError;

pub const INTERNAL_ERROR_MESSAGE: &str = "
An internal error has occurred. Please file a GitHub issue with a
minimal reproducible example.";

pub mod prelude {
    pub use crate::dataset::{DatasetConfig, GenomicRanges, Inputs, Record, SeqDistDataset};
    pub use crate::error::SeqDistError;
    pub use crate::intervals::{Interval, LineCacheIntervals, ScanIntervals, Strand};
    pub use crate::io::parsers::gtf::{read_gtf, GeneFeature, GtfRecord};
    pub use crate::landmarks::{DistToClosestLandmarkExtractor, Landmark, ALL_LANDMARKS};
    pub use crate::sequences::{one_hot_encode, ReferenceGenome, SequenceExtractor};
    pub use crate::traits::{Extractor, IntervalAccess};
    pub use crate::transform::{sign_log, sign_log_inverse, DistanceTransformer};
}
