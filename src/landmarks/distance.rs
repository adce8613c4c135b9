//! Distances from intervals to their closest gene landmarks.

use log::debug;
use ndarray::Array2;

use super::{Landmark, LandmarkTable};
use crate::error::SeqDistError;
use crate::intervals::{Interval, Strand};
use crate::io::GeneFeature;
use crate::traits::Extractor;
use crate::Distance;

/// Find the signed distance `position - 1 - midpoint` with the smallest absolute value,
/// over 1-based landmark `positions` (sorted ascending).
///
/// Ties are broken towards the landmark with the smaller coordinate, i.e. the negative
/// distance wins. Returns `None` if `positions` is empty.
pub fn nearest_distance(positions: &[Distance], midpoint: Distance) -> Option<Distance> {
    let distance = |position: Distance| position - 1 - midpoint;
    // first landmark at or after the midpoint (in 0-based coordinates)
    let split = positions.partition_point(|p| distance(*p) < 0);
    let left = split.checked_sub(1).map(|i| distance(positions[i]));
    let right = positions.get(split).map(|p| distance(*p));
    match (left, right) {
        (Some(left), Some(right)) if right.abs() < left.abs() => Some(right),
        (Some(left), _) => Some(left),
        (None, right) => right,
    }
}

/// Extract distances to the closest genomic landmark of each configured type.
///
/// The output of [`Extractor::extract`] is a `(n_intervals, n_landmarks)` array, with
/// columns in the order of [`DistToClosestLandmarkExtractor::columns`].
#[derive(Clone, Debug)]
pub struct DistToClosestLandmarkExtractor {
    table: LandmarkTable,
    columns: Vec<Landmark>,
    use_strand: bool,
}

impl DistToClosestLandmarkExtractor {
    /// Build the extractor from (already filtered) GTF features.
    ///
    /// # Arguments
    /// * `records`: GTF features to take landmark positions from.
    /// * `landmarks`: the landmark types, in output column order.
    /// * `use_strand`: if `true`, only landmarks on the interval's strand are
    ///   considered (when the interval strand is known), and distances for reverse
    ///   strand intervals are negated, so that negative is always upstream.
    pub fn new(records: &[GeneFeature], landmarks: &[Landmark], use_strand: bool) -> Self {
        let table = LandmarkTable::from_features(records, landmarks);
        for landmark in landmarks {
            debug!(
                "indexed {} '{}' landmark positions",
                table.count(*landmark),
                landmark
            );
        }
        Self {
            table,
            columns: landmarks.to_vec(),
            use_strand,
        }
    }

    pub fn columns(&self) -> &[Landmark] {
        &self.columns
    }

    pub fn use_strand(&self) -> bool {
        self.use_strand
    }

    pub fn table(&self) -> &LandmarkTable {
        &self.table
    }

    /// The signed distance from the interval midpoint to the closest `landmark`.
    ///
    /// Missing landmarks (none on the interval's sequence, or strand) are an error,
    /// never a default distance.
    pub fn find_closest(
        &self,
        landmark: Landmark,
        interval: &Interval,
    ) -> Result<Distance, SeqDistError> {
        let strand = interval.strand.filter(|_| self.use_strand);
        let missing = || SeqDistError::MissingLandmark {
            landmark: landmark.to_string(),
            seqname: interval.seqname.clone(),
            strand: interval.strand_str(),
        };

        let stranded = self
            .table
            .get(landmark, &interval.seqname)
            .ok_or_else(missing)?;
        let positions = match strand {
            Some(strand) => stranded.strand(strand),
            None => stranded.all(),
        };

        let distance = nearest_distance(positions, interval.midpoint()).ok_or_else(missing)?;
        Ok(match strand {
            Some(Strand::Reverse) => -distance,
            _ => distance,
        })
    }
}

impl Extractor for DistToClosestLandmarkExtractor {
    type Output = Array2<f64>;

    fn extract(&self, intervals: &[Interval]) -> Result<Self::Output, SeqDistError> {
        let mut distances = Array2::zeros((intervals.len(), self.columns.len()));
        for (i, interval) in intervals.iter().enumerate() {
            for (j, landmark) in self.columns.iter().enumerate() {
                distances[[i, j]] = self.find_closest(*landmark, interval)? as f64;
            }
        }
        Ok(distances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::tests::gene_feature;
    use crate::landmarks::ALL_LANDMARKS;
    use ndarray::array;

    fn interval(start: u32, end: u32, strand: Option<Strand>) -> Interval {
        Interval::new("chr1", start, end).with_strand(strand)
    }

    #[test]
    fn test_nearest_distance() {
        // midpoint 150; the 1-based landmark at 151 is distance 0
        assert_eq!(nearest_distance(&[51, 151, 300], 150), Some(0));
        assert_eq!(nearest_distance(&[51, 240], 150), Some(89));
        assert_eq!(nearest_distance(&[51], 150), Some(-100));
        assert_eq!(nearest_distance(&[1000], 150), Some(849));
        assert_eq!(nearest_distance(&[], 150), None);
    }

    #[test]
    fn test_nearest_distance_tie() {
        // landmarks equally far (50bp) on either side of the midpoint: the smaller
        // coordinate wins
        assert_eq!(nearest_distance(&[101, 201], 150), Some(-50));
    }

    #[test]
    fn test_find_closest_reverse_strand() {
        let records = vec![
            gene_feature("chr1", "gene", 101, 400, Some(Strand::Reverse)),
            gene_feature("chr1", "gene", 10, 201, Some(Strand::Reverse)),
        ];
        // reverse strand gene ends are the GTF starts: 101 and 10
        let extractor = DistToClosestLandmarkExtractor::new(&records, &[Landmark::GeneEnd], true);
        let d = extractor
            .find_closest(Landmark::GeneEnd, &interval(100, 201, Some(Strand::Reverse)))
            .unwrap();
        assert_eq!(d, 50);

        // reverse strand gene starts are the GTF ends: 400 (+99) and 201 (-100)
        let extractor =
            DistToClosestLandmarkExtractor::new(&records, &[Landmark::GeneStart], true);
        let query = interval(250, 351, Some(Strand::Reverse));
        assert_eq!(query.midpoint(), 300);
        assert_eq!(extractor.find_closest(Landmark::GeneStart, &query).unwrap(), -99);
    }

    #[test]
    fn test_find_closest_exact_tie_is_deterministic() {
        let records = vec![
            gene_feature("chr1", "transcript", 101, 500, Some(Strand::Forward)),
            gene_feature("chr1", "transcript", 201, 500, Some(Strand::Forward)),
            gene_feature("chr1", "transcript", 101, 500, Some(Strand::Reverse)),
            gene_feature("chr1", "transcript", 101, 201, Some(Strand::Reverse)),
        ];
        let extractor = DistToClosestLandmarkExtractor::new(&records, &[Landmark::Tss], true);
        // forward TSS at 101 and 201, midpoint 150: -50 and +50, the upstream one wins
        let fwd = interval(100, 201, Some(Strand::Forward));
        assert_eq!(extractor.find_closest(Landmark::Tss, &fwd).unwrap(), -50);
        // reverse TSS at 500 and 201, midpoint 350 (end - 1 - 350 = 149, 201 - 1 - 350 = -150)
        let rev = interval(300, 401, Some(Strand::Reverse));
        assert_eq!(rev.midpoint(), 350);
        assert_eq!(extractor.find_closest(Landmark::Tss, &rev).unwrap(), -149);
        // reverse TSS at 101 and 201 around midpoint 150: tie resolves to the smaller
        // coordinate (-50), which is then negated for the reverse strand
        let records = vec![
            gene_feature("chr1", "transcript", 1, 101, Some(Strand::Reverse)),
            gene_feature("chr1", "transcript", 1, 201, Some(Strand::Reverse)),
        ];
        let extractor = DistToClosestLandmarkExtractor::new(&records, &[Landmark::Tss], true);
        let rev = interval(100, 201, Some(Strand::Reverse));
        assert_eq!(extractor.find_closest(Landmark::Tss, &rev).unwrap(), 50);
    }

    #[test]
    fn test_find_closest_strand_handling() {
        let records = vec![
            gene_feature("chr1", "gene", 1001, 2000, Some(Strand::Forward)),
            gene_feature("chr1", "gene", 161, 900, Some(Strand::Reverse)),
        ];
        let extractor = DistToClosestLandmarkExtractor::new(&records, &[Landmark::GeneEnd], true);

        // forward: only the forward gene end (2000) is a candidate
        let fwd = interval(100, 201, Some(Strand::Forward));
        assert_eq!(extractor.find_closest(Landmark::GeneEnd, &fwd).unwrap(), 1849);
        // reverse: gene end is the GTF start (161): 161 - 1 - 150 = 10, negated
        let rev = interval(100, 201, Some(Strand::Reverse));
        assert_eq!(extractor.find_closest(Landmark::GeneEnd, &rev).unwrap(), -10);
        // unknown strand: both strands are candidates, no negation
        let unknown = interval(100, 201, None);
        assert_eq!(extractor.find_closest(Landmark::GeneEnd, &unknown).unwrap(), 10);

        // strand-unaware: all candidates, and no negation
        let unaware = DistToClosestLandmarkExtractor::new(&records, &[Landmark::GeneEnd], false);
        assert_eq!(unaware.find_closest(Landmark::GeneEnd, &rev).unwrap(), 10);
    }

    #[test]
    fn test_find_closest_missing() {
        let records = vec![gene_feature("chr1", "gene", 1001, 2000, Some(Strand::Forward))];
        let extractor = DistToClosestLandmarkExtractor::new(&records, &ALL_LANDMARKS, true);

        // no landmarks on the reverse strand
        let rev = interval(100, 201, Some(Strand::Reverse));
        assert!(matches!(
            extractor.find_closest(Landmark::GeneStart, &rev),
            Err(SeqDistError::MissingLandmark { .. })
        ));
        // no landmarks on the sequence
        let other = Interval::new("chr2", 100, 201);
        assert!(matches!(
            extractor.find_closest(Landmark::GeneStart, &other),
            Err(SeqDistError::MissingLandmark { .. })
        ));
        // no exons at all
        let fwd = interval(100, 201, Some(Strand::Forward));
        assert!(matches!(
            extractor.find_closest(Landmark::ExonIntron, &fwd),
            Err(SeqDistError::MissingLandmark { .. })
        ));
    }

    #[test]
    fn test_extract_batch() {
        let records = vec![
            gene_feature("chr1", "gene", 51, 250, Some(Strand::Forward)),
            gene_feature("chr1", "gene", 301, 380, Some(Strand::Reverse)),
        ];
        let extractor = DistToClosestLandmarkExtractor::new(
            &records,
            &[Landmark::GeneStart, Landmark::GeneEnd],
            true,
        );
        let intervals = vec![
            interval(100, 201, Some(Strand::Forward)),
            interval(250, 351, Some(Strand::Reverse)),
        ];
        let distances = extractor.extract(&intervals).unwrap();
        assert_eq!(distances.shape(), &[2, 2]);
        // forward, midpoint 150: start 51 -> -100, end 250 -> 99
        // reverse, midpoint 300: start 380 -> 79 -> -79, end 301 -> 0 -> 0
        assert_eq!(distances, array![[-100.0, 99.0], [-79.0, 0.0]]);
    }
}
