//! The sequence-and-distance dataset.
//!
//! [`SeqDistDataset`] combines an interval file, a reference genome, a gene annotation and
//! a fitted distance transformer into indexed [`Record`]s: a one-hot encoded sequence, plus
//! spline encoded distances to the closest gene landmarks.
//!
//! Construction parses the GTF, opens the interval index and loads the transformer and
//! targets. The reference genome and the landmark tables are only built on the first
//! [`SeqDistDataset::get`], so that a dataset can be created (and cloned, e.g. once per
//! worker) cheaply.

use indexmap::IndexMap;
use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SeqDistError;
use crate::intervals::{Interval, LineCacheIntervals, ScanIntervals};
use crate::io::parsers::gtf::{filter_protein_coding, normalize_seqnames, ProteinCodingFilter};
use crate::io::{read_gtf, GeneFeature, Targets};
use crate::landmarks::{
    landmark_features, DistToClosestLandmarkExtractor, Landmark, ALL_LANDMARKS,
};
use crate::sequences::SequenceExtractor;
use crate::traits::{Extractor, IntervalAccess};
use crate::transform::DistanceTransformer;
use crate::Position;

/// The required width of every interval.
pub const SEQ_WIDTH: Position = 101;

fn default_true() -> bool {
    true
}

fn default_landmarks() -> Vec<Landmark> {
    ALL_LANDMARKS.to_vec()
}

/// The configuration of a [`SeqDistDataset`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// BED-like file of intervals, each [`SEQ_WIDTH`] wide.
    pub intervals_file: PathBuf,
    /// Reference genome FASTA file. If a `.fai` index exists, it is used.
    pub fasta_file: PathBuf,
    /// Gene annotation GTF file.
    pub gtf_file: PathBuf,
    /// The fitted distance transformer (JSON pipeline artifact).
    pub transformer_file: PathBuf,
    /// Keep only protein coding GTF records.
    #[serde(default = "default_true")]
    pub filter_protein_coding: bool,
    /// Optional file of one target value per interval.
    #[serde(default)]
    pub target_file: Option<PathBuf>,
    /// Index the interval file by line offset, rather than scanning it on each lookup.
    #[serde(default = "default_true")]
    pub use_linecache: bool,
    #[serde(default = "default_landmarks")]
    pub landmarks: Vec<Landmark>,
    #[serde(default = "default_true")]
    pub use_strand: bool,
}

impl DatasetConfig {
    /// A configuration with the required files, and default options.
    pub fn new(
        intervals_file: impl Into<PathBuf>,
        fasta_file: impl Into<PathBuf>,
        gtf_file: impl Into<PathBuf>,
        transformer_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            intervals_file: intervals_file.into(),
            fasta_file: fasta_file.into(),
            gtf_file: gtf_file.into(),
            transformer_file: transformer_file.into(),
            filter_protein_coding: true,
            target_file: None,
            use_linecache: true,
            landmarks: default_landmarks(),
            use_strand: true,
        }
    }

    pub fn with_target_file(mut self, target_file: impl Into<PathBuf>) -> Self {
        self.target_file = Some(target_file.into());
        self
    }

    pub fn with_linecache(mut self, use_linecache: bool) -> Self {
        self.use_linecache = use_linecache;
        self
    }

    pub fn with_protein_coding_filter(mut self, filter_protein_coding: bool) -> Self {
        self.filter_protein_coding = filter_protein_coding;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, SeqDistError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeqDistError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// The location of a record, as `chr`, 0-based `start` and exclusive `end`.
#[derive(Clone, Debug, PartialEq)]
pub struct GenomicRanges {
    pub chr: String,
    pub start: Position,
    pub end: Position,
    /// The interval name, or the record index if the interval has none.
    pub id: String,
    /// `+`, `-`, or `.`.
    pub strand: String,
}

impl GenomicRanges {
    pub fn from_interval(interval: &Interval, index: usize) -> Self {
        Self {
            chr: interval.seqname.clone(),
            start: interval.start,
            end: interval.end,
            id: interval.name.clone().unwrap_or_else(|| index.to_string()),
            strand: interval.strand_str(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub ranges: GenomicRanges,
}

/// The model inputs of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Inputs {
    /// One-hot encoded sequence, `(SEQ_WIDTH, 4)`.
    pub seq: Array2<f32>,
    /// Spline encoded distances, keyed by `dist_<landmark>`.
    pub dist: IndexMap<String, Array1<f32>>,
}

/// One example of the dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub inputs: Inputs,
    /// The target, as a length one array, if targets are configured.
    pub targets: Option<Array1<f64>>,
    pub metadata: Metadata,
}

/// The extractors, which are created on first access.
#[derive(Debug)]
struct Extractors {
    seq: SequenceExtractor,
    dist: DistToClosestLandmarkExtractor,
}

/// Indexed access to [`Record`]s built from intervals.
///
/// A dataset is not `Sync`: its extractors hold caches that are not thread safe. For
/// parallel loading, give each worker its own [`Clone`] of the dataset, which shares the
/// parsed inputs but starts with fresh, uninitialized extractors.
pub struct SeqDistDataset {
    config: DatasetConfig,
    /// Attribute-free GTF features, only those that configured landmarks use.
    genes: Arc<Vec<GeneFeature>>,
    intervals: Arc<dyn IntervalAccess + Send + Sync>,
    transformer: Arc<DistanceTransformer>,
    targets: Option<Arc<Targets>>,
    protein_coding: ProteinCodingFilter,
    extractors: OnceCell<Extractors>,
}

impl SeqDistDataset {
    /// Create a new dataset. This parses the GTF file, indexes the intervals, and loads
    /// the transformer and targets, but opens no reference genome.
    pub fn new(config: DatasetConfig) -> Result<Self, SeqDistError> {
        let mut genes = read_gtf(&config.gtf_file)?;
        info!(
            "read {} GTF records from {}",
            genes.len(),
            config.gtf_file.display()
        );
        let protein_coding = if config.filter_protein_coding {
            filter_protein_coding(&mut genes)
        } else {
            ProteinCodingFilter::Skipped
        };
        if let ProteinCodingFilter::Filtered { field, kept, dropped } = &protein_coding {
            info!(
                "kept {} protein coding GTF records ('{}'), dropped {}",
                kept, field, dropped
            );
        }
        normalize_seqnames(&mut genes);
        let genes = landmark_features(genes, &config.landmarks);
        debug!("kept {} GTF features for landmarks", genes.len());

        let intervals: Arc<dyn IntervalAccess + Send + Sync> = if config.use_linecache {
            Arc::new(LineCacheIntervals::new(&config.intervals_file)?)
        } else {
            Arc::new(ScanIntervals::new(&config.intervals_file)?)
        };
        info!(
            "indexed {} intervals from {}",
            intervals.len(),
            config.intervals_file.display()
        );

        let transformer = DistanceTransformer::new(&config.landmarks, &config.transformer_file)?;

        let targets = match &config.target_file {
            Some(target_file) => {
                let targets = Targets::from_path(target_file)?;
                if targets.len() != intervals.len() {
                    return Err(SeqDistError::TargetLengthMismatch {
                        targets: targets.len(),
                        intervals: intervals.len(),
                    });
                }
                Some(Arc::new(targets))
            }
            None => None,
        };

        Ok(Self {
            config,
            genes: Arc::new(genes),
            intervals,
            transformer: Arc::new(transformer),
            targets,
            protein_coding,
            extractors: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// The outcome of protein coding filtering of the GTF records.
    pub fn protein_coding_filter(&self) -> &ProteinCodingFilter {
        &self.protein_coding
    }

    /// The number of records (intervals).
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the extractors have been created, i.e. whether [`SeqDistDataset::get`]
    /// has been called on this instance.
    pub fn is_initialized(&self) -> bool {
        self.extractors.get().is_some()
    }

    fn extractors(&self) -> Result<&Extractors, SeqDistError> {
        if let Some(extractors) = self.extractors.get() {
            return Ok(extractors);
        }
        debug!(
            "initializing sequence extractor for {}",
            self.config.fasta_file.display()
        );
        let seq = SequenceExtractor::new(&self.config.fasta_file)?;
        debug!("initializing landmark distance extractor");
        let dist = DistToClosestLandmarkExtractor::new(
            &self.genes,
            &self.config.landmarks,
            self.config.use_strand,
        );
        Ok(self.extractors.get_or_init(|| Extractors { seq, dist }))
    }

    /// Build the record at `index`.
    pub fn get(&self, index: usize) -> Result<Record, SeqDistError> {
        let extractors = self.extractors()?;

        let interval = self.intervals.get(index)?;
        if interval.width() != SEQ_WIDTH {
            return Err(SeqDistError::IntervalWidthMismatch {
                expected: SEQ_WIDTH,
                found: interval.width(),
            });
        }
        let batch = std::slice::from_ref(&interval);

        let seq = extractors.seq.extract(batch)?.index_axis_move(Axis(0), 0);
        let raw = extractors.dist.extract(batch)?;
        let dist = self
            .transformer
            .transform(&raw)?
            .into_iter()
            .map(|(name, features)| (name, features.index_axis_move(Axis(0), 0)))
            .collect();

        let targets = match &self.targets {
            Some(targets) => Some(Array1::from_elem(1, targets.get(index)?)),
            None => None,
        };

        Ok(Record {
            inputs: Inputs { seq, dist },
            targets,
            metadata: Metadata {
                ranges: GenomicRanges::from_interval(&interval, index),
            },
        })
    }

    /// Iterate over all records, in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Record, SeqDistError>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }
}

impl fmt::Debug for SeqDistDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqDistDataset")
            .field("config", &self.config)
            .field("len", &self.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Clone for SeqDistDataset {
    /// Share the parsed inputs, but not the extractors.
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            genes: Arc::clone(&self.genes),
            intervals: Arc::clone(&self.intervals),
            transformer: Arc::clone(&self.transformer),
            targets: self.targets.clone(),
            protein_coding: self.protein_coding.clone(),
            extractors: OnceCell::new(),
        }
    }
}
