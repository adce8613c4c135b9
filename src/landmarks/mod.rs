//! Gene landmarks and distances to them.
//!
//! A [`Landmark`] is a reference point on a gene model, like a transcription start site
//! or an exon-intron boundary. Landmark positions are taken from GTF records: each
//! landmark type corresponds to a GTF feature type and one of its ends (see
//! [`Landmark::feature`] and [`Landmark::anchor`]). The [`LandmarkTable`] indexes
//! these positions by sequence name and strand, and the
//! [`DistToClosestLandmarkExtractor`] finds the nearest one to an interval's midpoint.

pub mod distance;

pub use distance::DistToClosestLandmarkExtractor;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SeqDistError;
use crate::intervals::Strand;
use crate::io::{GeneFeature, GtfRecord};
use crate::Distance;

/// Which end of a feature, relative to the feature's strand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// The 5' end: GTF `start` on the forward (or unknown) strand, `end` on the reverse.
    FivePrime,
    /// The 3' end: GTF `end` on the forward (or unknown) strand, `start` on the reverse.
    ThreePrime,
}

/// A gene landmark type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Tss,
    Polya,
    ExonIntron,
    IntronExon,
    StartCodon,
    StopCodon,
    GeneStart,
    GeneEnd,
}

/// All landmarks, in their canonical column order.
pub const ALL_LANDMARKS: [Landmark; 8] = [
    Landmark::Tss,
    Landmark::Polya,
    Landmark::ExonIntron,
    Landmark::IntronExon,
    Landmark::StartCodon,
    Landmark::StopCodon,
    Landmark::GeneStart,
    Landmark::GeneEnd,
];

impl Landmark {
    pub fn name(&self) -> &'static str {
        match self {
            Landmark::Tss => "tss",
            Landmark::Polya => "polya",
            Landmark::ExonIntron => "exon_intron",
            Landmark::IntronExon => "intron_exon",
            Landmark::StartCodon => "start_codon",
            Landmark::StopCodon => "stop_codon",
            Landmark::GeneStart => "gene_start",
            Landmark::GeneEnd => "gene_end",
        }
    }

    /// The GTF feature type this landmark is derived from.
    pub fn feature(&self) -> &'static str {
        match self {
            Landmark::Tss | Landmark::Polya => "transcript",
            Landmark::ExonIntron | Landmark::IntronExon => "exon",
            Landmark::StartCodon => "start_codon",
            Landmark::StopCodon => "stop_codon",
            Landmark::GeneStart | Landmark::GeneEnd => "gene",
        }
    }

    /// The feature end this landmark sits at.
    pub fn anchor(&self) -> Anchor {
        match self {
            Landmark::Tss
            | Landmark::IntronExon
            | Landmark::StartCodon
            | Landmark::GeneStart => Anchor::FivePrime,
            Landmark::Polya | Landmark::ExonIntron | Landmark::StopCodon | Landmark::GeneEnd => {
                Anchor::ThreePrime
            }
        }
    }

    /// The 1-based landmark position of a GTF feature, if it has this landmark's
    /// feature type.
    pub fn position(&self, record: &GeneFeature) -> Option<Distance> {
        if record.feature != self.feature() {
            return None;
        }
        let reverse = record.strand == Some(Strand::Reverse);
        let position = match (self.anchor(), reverse) {
            (Anchor::FivePrime, false) | (Anchor::ThreePrime, true) => record.start,
            (Anchor::ThreePrime, false) | (Anchor::FivePrime, true) => record.end,
        };
        Some(position as Distance)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Landmark {
    type Err = SeqDistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_LANDMARKS
            .into_iter()
            .find(|landmark| landmark.name() == s)
            .ok_or(SeqDistError::UnknownLandmark(s.to_string()))
    }
}

/// Drop the attributes of GTF records, keeping only the features that `landmarks` are
/// derived from.
pub fn landmark_features(records: Vec<GtfRecord>, landmarks: &[Landmark]) -> Vec<GeneFeature> {
    records
        .into_iter()
        .filter(|record| landmarks.iter().any(|l| l.feature() == record.feature))
        .map(GeneFeature::from)
        .collect()
}

/// Landmark positions on one sequence, split by strand. Each list is sorted and
/// deduplicated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrandedPositions {
    pub forward: Vec<Distance>,
    pub reverse: Vec<Distance>,
    /// Features with an unknown strand.
    pub unstranded: Vec<Distance>,
    merged: Vec<Distance>,
}

impl StrandedPositions {
    fn push(&mut self, strand: Option<Strand>, position: Distance) {
        match strand {
            Some(Strand::Forward) => self.forward.push(position),
            Some(Strand::Reverse) => self.reverse.push(position),
            None => self.unstranded.push(position),
        }
    }

    fn finalize(&mut self) {
        for positions in [&mut self.forward, &mut self.reverse, &mut self.unstranded] {
            positions.sort_unstable();
            positions.dedup();
        }
        let mut merged: Vec<Distance> = self
            .forward
            .iter()
            .chain(&self.reverse)
            .chain(&self.unstranded)
            .copied()
            .collect();
        merged.sort_unstable();
        merged.dedup();
        self.merged = merged;
    }

    /// Positions on a single strand.
    pub fn strand(&self, strand: Strand) -> &[Distance] {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    /// All positions, regardless of strand, sorted and deduplicated.
    pub fn all(&self) -> &[Distance] {
        &self.merged
    }
}

/// Per landmark type, the landmark positions indexed by sequence name and strand.
#[derive(Clone, Debug, Default)]
pub struct LandmarkTable {
    positions: IndexMap<Landmark, IndexMap<String, StrandedPositions>>,
}

impl LandmarkTable {
    /// Build the table for `landmarks` from GTF features.
    pub fn from_features(records: &[GeneFeature], landmarks: &[Landmark]) -> Self {
        let mut positions: IndexMap<Landmark, IndexMap<String, StrandedPositions>> = landmarks
            .iter()
            .map(|landmark| (*landmark, IndexMap::new()))
            .collect();

        for record in records {
            for (landmark, by_seqname) in positions.iter_mut() {
                if let Some(position) = landmark.position(record) {
                    by_seqname
                        .entry(record.seqname.clone())
                        .or_default()
                        .push(record.strand, position);
                }
            }
        }

        for by_seqname in positions.values_mut() {
            for stranded in by_seqname.values_mut() {
                stranded.finalize();
            }
        }
        Self { positions }
    }

    /// The positions of `landmark` on `seqname`.
    pub fn get(&self, landmark: Landmark, seqname: &str) -> Option<&StrandedPositions> {
        self.positions.get(&landmark)?.get(seqname)
    }

    /// The landmarks in this table, in column order.
    pub fn landmarks(&self) -> Vec<Landmark> {
        self.positions.keys().copied().collect()
    }

    /// The total number of landmark positions of one type.
    pub fn count(&self, landmark: Landmark) -> usize {
        self.positions.get(&landmark).map_or(0, |by_seqname| {
            by_seqname
                .values()
                .map(|s| s.forward.len() + s.reverse.len() + s.unstranded.len())
                .sum()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parsers::gtf::parse_attributes;

    pub(crate) fn gene_feature(
        seqname: &str,
        feature: &str,
        start: u32,
        end: u32,
        strand: Option<Strand>,
    ) -> GeneFeature {
        GeneFeature {
            seqname: seqname.to_string(),
            feature: feature.to_string(),
            start,
            end,
            strand,
        }
    }

    #[test]
    fn test_landmark_names_roundtrip() {
        for landmark in ALL_LANDMARKS {
            assert_eq!(landmark.name().parse::<Landmark>().unwrap(), landmark);
        }
        assert!(matches!(
            "cds".parse::<Landmark>(),
            Err(SeqDistError::UnknownLandmark(_))
        ));
    }

    #[test]
    fn test_landmark_positions_strand_aware() {
        let fwd = gene_feature("chr1", "exon", 100, 200, Some(Strand::Forward));
        let rev = gene_feature("chr1", "exon", 100, 200, Some(Strand::Reverse));
        assert_eq!(Landmark::IntronExon.position(&fwd), Some(100));
        assert_eq!(Landmark::ExonIntron.position(&fwd), Some(200));
        assert_eq!(Landmark::IntronExon.position(&rev), Some(200));
        assert_eq!(Landmark::ExonIntron.position(&rev), Some(100));
        assert_eq!(Landmark::Tss.position(&fwd), None);
    }

    #[test]
    fn test_table_dedup_and_sort() {
        let records = vec![
            gene_feature("chr1", "transcript", 500, 900, Some(Strand::Forward)),
            gene_feature("chr1", "transcript", 100, 900, Some(Strand::Forward)),
            gene_feature("chr1", "transcript", 500, 700, Some(Strand::Forward)),
            gene_feature("chr1", "transcript", 300, 400, Some(Strand::Reverse)),
            gene_feature("chr2", "gene", 1, 10, None),
        ];
        let table = LandmarkTable::from_features(&records, &[Landmark::Tss, Landmark::GeneEnd]);
        let tss = table.get(Landmark::Tss, "chr1").unwrap();
        assert_eq!(tss.forward, vec![100, 500]);
        assert_eq!(tss.reverse, vec![400]);
        assert_eq!(tss.all(), vec![100, 400, 500]);
        assert_eq!(table.count(Landmark::Tss), 3);
        assert_eq!(table.get(Landmark::GeneEnd, "chr2").unwrap().unstranded, vec![10]);
        assert!(table.get(Landmark::GeneEnd, "chr1").is_none());
        assert_eq!(table.landmarks(), vec![Landmark::Tss, Landmark::GeneEnd]);
    }

    #[test]
    fn test_landmark_features() {
        let record = |feature: &str| GtfRecord {
            seqname: "chr1".to_string(),
            source: "test".to_string(),
            feature: feature.to_string(),
            start: 10,
            end: 20,
            strand: Some(Strand::Forward),
            attributes: parse_attributes("gene_id \"G\"; gene_type \"protein_coding\";"),
        };
        let records = vec![record("gene"), record("CDS"), record("exon"), record("UTR")];

        let features = landmark_features(records.clone(), &ALL_LANDMARKS);
        let kept: Vec<&str> = features.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(kept, vec!["gene", "exon"]);
        assert_eq!(features[0], gene_feature("chr1", "gene", 10, 20, Some(Strand::Forward)));

        let features = landmark_features(records, &[Landmark::Tss]);
        assert!(features.is_empty());
    }
}
