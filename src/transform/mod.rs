//! The frozen transformation from raw landmark distances to model features.
//!
//! A [`DistanceTransformer`] is loaded from a fitted [`PipelineArtifact`] (a JSON file),
//! and applies, per landmark column:
//!
//!  1. Imputation: missing (`NaN`) distances are replaced by the fitted statistic.
//!  2. The sign-preserving log transform, [`sign_log`].
//!  3. Min-max scaling with the fitted data range.
//!  4. B-spline basis encoding (see [`splines::BSpline`]).
//!
//! The pipeline is fit out of band; it is only ever replayed here.

pub mod splines;

use indexmap::IndexMap;
use log::debug;
use ndarray::{Array2, ArrayView1, Axis, ErrorKind, ShapeError};
use num_traits::{Float, FloatConst};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::SeqDistError;
use crate::landmarks::Landmark;
use splines::BSpline;

/// The `format` tag of pipeline artifact files.
pub const ARTIFACT_FORMAT: &str = "seqdist-position-transformer";

/// The artifact schema version this library reads and writes.
pub const ARTIFACT_VERSION: u32 = 1;

/// The prefix of the distance feature keys, e.g. `dist_tss`.
pub const DIST_PREFIX: &str = "dist_";

/// Sign-preserving log transform, `sign(x) * log10(|x| + 1)`.
pub fn sign_log<F: Float>(x: F) -> F {
    let magnitude = (x.abs() + F::one()).log10();
    if x < F::zero() {
        -magnitude
    } else {
        magnitude
    }
}

/// The inverse of [`sign_log`], `sign(x) * (10^|x| - 1)`.
pub fn sign_log_inverse<F: Float + FloatConst>(x: F) -> F {
    let magnitude = (x.abs() * F::LN_10()).exp() - F::one();
    if x < F::zero() {
        -magnitude
    } else {
        magnitude
    }
}

/// The fitted imputation step: per-column replacement values for missing data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    /// How the statistics were fit (e.g. `mean`). Informational only.
    pub strategy: String,
    pub statistics: Vec<f64>,
}

impl Imputer {
    pub fn impute(&self, column: usize, x: f64) -> f64 {
        if x.is_nan() {
            self.statistics[column]
        } else {
            x
        }
    }
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// The fitted min-max scaling step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default)]
    pub clip: bool,
}

impl MinMaxScaler {
    /// Scale a value of `column`. A constant column (zero data range) is only shifted.
    pub fn scale(&self, column: usize, x: f64) -> f64 {
        let (range_min, range_max) = self.feature_range;
        let data_range = self.data_max[column] - self.data_min[column];
        let data_range = if data_range == 0.0 { 1.0 } else { data_range };
        let scale = (range_max - range_min) / data_range;
        let scaled = x * scale + (range_min - self.data_min[column] * scale);
        if self.clip {
            scaled.max(range_min).min(range_max)
        } else {
            scaled
        }
    }
}

/// The B-spline encoding settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplineConfig {
    pub n_bases: usize,
    pub spline_order: usize,
    pub start: f64,
    pub end: f64,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            n_bases: 10,
            spline_order: 3,
            start: 0.0,
            end: 1.0,
        }
    }
}

/// The serialized, fitted distance transformation pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format: String,
    pub version: u32,
    /// The landmark names, in the column order the pipeline was fit on.
    pub landmarks: Vec<String>,
    pub imputer: Imputer,
    pub minmax_scaler: MinMaxScaler,
    #[serde(default)]
    pub splines: SplineConfig,
}

impl PipelineArtifact {
    /// Read and validate an artifact from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeqDistError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let artifact: PipelineArtifact = serde_json::from_reader(reader)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Read and validate an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SeqDistError> {
        let artifact: PipelineArtifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> Result<String, SeqDistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the schema beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), SeqDistError> {
        if self.format != ARTIFACT_FORMAT {
            return Err(SeqDistError::InvalidPipelineArtifact(format!(
                "unknown format '{}', expected '{}'",
                self.format, ARTIFACT_FORMAT
            )));
        }
        if self.version != ARTIFACT_VERSION {
            return Err(SeqDistError::UnsupportedArtifactVersion(self.version));
        }

        let n = self.landmarks.len();
        if n == 0 {
            return Err(SeqDistError::InvalidPipelineArtifact(
                "no landmarks".to_string(),
            ));
        }
        let lengths = [
            ("imputer.statistics", self.imputer.statistics.len()),
            ("minmax_scaler.data_min", self.minmax_scaler.data_min.len()),
            ("minmax_scaler.data_max", self.minmax_scaler.data_max.len()),
        ];
        for (field, len) in lengths {
            if len != n {
                return Err(SeqDistError::InvalidPipelineArtifact(format!(
                    "'{}' has {} entries, but there are {} landmarks",
                    field, len, n
                )));
            }
        }

        let mut values = self
            .imputer
            .statistics
            .iter()
            .chain(&self.minmax_scaler.data_min)
            .chain(&self.minmax_scaler.data_max);
        if values.any(|x| !x.is_finite()) {
            return Err(SeqDistError::InvalidPipelineArtifact(
                "imputer and scaler values must be finite".to_string(),
            ));
        }
        let (range_min, range_max) = self.minmax_scaler.feature_range;
        if !(range_min < range_max) {
            return Err(SeqDistError::InvalidPipelineArtifact(format!(
                "invalid feature range ({}, {})",
                range_min, range_max
            )));
        }
        Ok(())
    }

    /// The artifact's landmarks, parsed.
    pub fn parse_landmarks(&self) -> Result<Vec<Landmark>, SeqDistError> {
        self.landmarks.iter().map(|name| name.parse()).collect()
    }
}

fn check_columns(n_landmarks: usize, raw: &Array2<f64>) -> Result<(), SeqDistError> {
    if raw.ncols() != n_landmarks {
        return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
    }
    Ok(())
}

/// Applies a fitted [`PipelineArtifact`] to raw distance matrices.
#[derive(Clone, Debug)]
pub struct DistanceTransformer {
    landmarks: Vec<Landmark>,
    imputer: Imputer,
    scaler: MinMaxScaler,
    spline: BSpline,
}

impl DistanceTransformer {
    /// Load the transformer from an artifact file, checking that it was fit on exactly
    /// `landmarks`, in the same order.
    pub fn new(landmarks: &[Landmark], path: impl AsRef<Path>) -> Result<Self, SeqDistError> {
        debug!("loading pipeline artifact {}", path.as_ref().display());
        Self::from_artifact(landmarks, PipelineArtifact::from_path(path)?)
    }

    /// Build the transformer from an artifact, validating it first.
    pub fn from_artifact(
        landmarks: &[Landmark],
        artifact: PipelineArtifact,
    ) -> Result<Self, SeqDistError> {
        artifact.validate()?;
        let artifact_landmarks = artifact.parse_landmarks()?;
        if artifact_landmarks != landmarks {
            return Err(SeqDistError::LandmarkMismatch {
                configured: landmarks.iter().map(|l| l.to_string()).collect(),
                artifact: artifact.landmarks,
            });
        }
        let SplineConfig {
            n_bases,
            spline_order,
            start,
            end,
        } = artifact.splines;
        Ok(Self {
            landmarks: artifact_landmarks,
            imputer: artifact.imputer,
            scaler: artifact.minmax_scaler,
            spline: BSpline::new(n_bases, spline_order, start, end)?,
        })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn n_bases(&self) -> usize {
        self.spline.n_bases()
    }

    /// The output key of each landmark, e.g. `dist_tss`.
    pub fn feature_names(&self) -> Vec<String> {
        self.landmarks
            .iter()
            .map(|l| format!("{}{}", DIST_PREFIX, l))
            .collect()
    }

    /// Impute, sign-log transform and scale a single column.
    fn scale_column(&self, column: usize, values: ArrayView1<f64>) -> Vec<f64> {
        values
            .iter()
            .map(|x| {
                let x = sign_log(self.imputer.impute(column, *x));
                self.scaler.scale(column, x)
            })
            .collect()
    }

    /// Transform a `(n, n_landmarks)` raw distance matrix into one `(n, n_bases)`
    /// spline encoded array per landmark, keyed by [`DistanceTransformer::feature_names`].
    pub fn transform(
        &self,
        raw: &Array2<f64>,
    ) -> Result<IndexMap<String, Array2<f32>>, SeqDistError> {
        check_columns(self.landmarks.len(), raw)?;
        let features = self
            .feature_names()
            .into_iter()
            .zip(raw.axis_iter(Axis(1)))
            .enumerate()
            .map(|(j, (name, column))| {
                let scaled = self.scale_column(j, column);
                (name, self.spline.encode(&ArrayView1::from(scaled.as_slice())))
            })
            .collect();
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::ALL_LANDMARKS;
    use crate::test_utilities::{assert_float_eq, temp_text_file, NRANDOM_VALUES};
    use ndarray::array;
    use rand::Rng;

    fn artifact_json(landmarks: &[&str], data_min: f64, data_max: f64) -> String {
        let n = landmarks.len();
        let fill = |x: f64| vec![x; n];
        serde_json::json!({
            "format": ARTIFACT_FORMAT,
            "version": 1,
            "landmarks": landmarks,
            "imputer": {"strategy": "mean", "statistics": fill(0.0)},
            "minmax_scaler": {
                "feature_range": [0.0, 1.0],
                "data_min": fill(data_min),
                "data_max": fill(data_max),
                "clip": false
            }
        })
        .to_string()
    }

    #[test]
    fn test_sign_log() {
        assert_eq!(sign_log(0.0_f64), 0.0);
        assert_float_eq(sign_log(9.0), 1.0, 1e-12);
        assert_float_eq(sign_log(-99.0), -2.0, 1e-12);
        assert_float_eq(sign_log_inverse(-2.0), -99.0, 1e-9);
        assert_eq!(sign_log_inverse(0.0_f32), 0.0);
    }

    #[test]
    fn test_sign_log_roundtrip_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..NRANDOM_VALUES {
            let x: f64 = rng.gen_range(-1e6..1e6);
            let y = sign_log(x);
            assert_eq!(y.signum(), x.signum());
            assert_float_eq(sign_log_inverse(y), x, 1e-6 * x.abs().max(1.0));
        }
    }

    #[test]
    fn test_artifact_defaults() {
        let artifact = PipelineArtifact::from_json(&artifact_json(&["tss"], -3.0, 3.0)).unwrap();
        assert_eq!(artifact.splines, SplineConfig::default());
        assert!(!artifact.minmax_scaler.clip);
        assert_eq!(artifact.parse_landmarks().unwrap(), vec![Landmark::Tss]);
    }

    #[test]
    fn test_artifact_schema_errors() {
        let mut value: serde_json::Value =
            serde_json::from_str(&artifact_json(&["tss", "polya"], -3.0, 3.0)).unwrap();

        let mut bad_format = value.clone();
        bad_format["format"] = "sklearn-pickle".into();
        assert!(matches!(
            PipelineArtifact::from_json(&bad_format.to_string()),
            Err(SeqDistError::InvalidPipelineArtifact(_))
        ));

        let mut bad_version = value.clone();
        bad_version["version"] = 2.into();
        assert!(matches!(
            PipelineArtifact::from_json(&bad_version.to_string()),
            Err(SeqDistError::UnsupportedArtifactVersion(2))
        ));

        let mut short = value.clone();
        short["minmax_scaler"]["data_max"] = serde_json::json!([3.0]);
        assert!(matches!(
            PipelineArtifact::from_json(&short.to_string()),
            Err(SeqDistError::InvalidPipelineArtifact(_))
        ));

        value.as_object_mut().unwrap().remove("imputer");
        assert!(matches!(
            PipelineArtifact::from_json(&value.to_string()),
            Err(SeqDistError::JsonError(_))
        ));
    }

    #[test]
    fn test_landmark_mismatch() {
        let artifact =
            PipelineArtifact::from_json(&artifact_json(&["polya", "tss"], -3.0, 3.0)).unwrap();
        // same landmarks, different order
        let result =
            DistanceTransformer::from_artifact(&[Landmark::Tss, Landmark::Polya], artifact);
        assert!(matches!(result, Err(SeqDistError::LandmarkMismatch { .. })));

        let artifact = PipelineArtifact::from_json(&artifact_json(&["cds"], -3.0, 3.0)).unwrap();
        assert!(matches!(
            DistanceTransformer::from_artifact(&[Landmark::Tss], artifact),
            Err(SeqDistError::UnknownLandmark(_))
        ));
    }

    #[test]
    fn test_from_artifact_validates() {
        let mut artifact =
            PipelineArtifact::from_json(&artifact_json(&["tss", "polya"], -3.0, 3.0)).unwrap();
        artifact.imputer.statistics.pop();
        assert!(matches!(
            DistanceTransformer::from_artifact(&[Landmark::Tss, Landmark::Polya], artifact),
            Err(SeqDistError::InvalidPipelineArtifact(_))
        ));

        let mut artifact =
            PipelineArtifact::from_json(&artifact_json(&["tss"], -3.0, 3.0)).unwrap();
        artifact.minmax_scaler.data_min.clear();
        assert!(matches!(
            DistanceTransformer::from_artifact(&[Landmark::Tss], artifact),
            Err(SeqDistError::InvalidPipelineArtifact(_))
        ));
    }

    #[test]
    fn test_transformer_from_path() {
        let names: Vec<&str> = ALL_LANDMARKS.iter().map(|l| l.name()).collect();
        let file = temp_text_file(&artifact_json(&names, -3.0, 3.0));
        let transformer = DistanceTransformer::new(&ALL_LANDMARKS, file.path()).unwrap();
        assert_eq!(transformer.landmarks(), &ALL_LANDMARKS);
        assert_eq!(transformer.n_bases(), 10);
        assert_eq!(transformer.feature_names()[0], "dist_tss");
        assert_eq!(transformer.feature_names()[7], "dist_gene_end");
    }

    #[test]
    fn test_transform() {
        let artifact = PipelineArtifact::from_json(&artifact_json(&["tss"], -3.0, 3.0)).unwrap();
        let transformer = DistanceTransformer::from_artifact(&[Landmark::Tss], artifact).unwrap();
        // 0 -> 0.5 after scaling; 999 -> 1.0; -999 -> 0.0; NaN is imputed as 0
        let raw = array![[0.0], [999.0], [-999.0], [f64::NAN]];
        let features = transformer.transform(&raw).unwrap();
        assert_eq!(features.len(), 1);
        let tss = &features["dist_tss"];
        assert_eq!(tss.shape(), &[4, 10]);
        assert_float_eq(tss[[0, 4]] as f64, 23.0 / 48.0, 1e-5);
        assert_eq!(tss.row(0), tss.row(3));
        for (row, x) in [(1, 1.0), (2, 0.0)] {
            for (value, expected) in tss.row(row).iter().zip(transformer.spline.basis(x).iter()) {
                assert_float_eq(*value as f64, *expected as f64, 1e-5);
            }
        }
        for row in tss.outer_iter() {
            assert_float_eq(row.sum() as f64, 1.0, 1e-5);
        }
    }

    #[test]
    fn test_transform_wrong_columns() {
        let artifact = PipelineArtifact::from_json(&artifact_json(&["tss"], -3.0, 3.0)).unwrap();
        let transformer = DistanceTransformer::from_artifact(&[Landmark::Tss], artifact).unwrap();
        assert!(matches!(
            transformer.transform(&array![[1.0, 2.0]]),
            Err(SeqDistError::ShapeError(_))
        ));
    }

    #[test]
    fn test_minmax_scaler() {
        let scaler = MinMaxScaler {
            feature_range: (0.0, 1.0),
            data_min: vec![-2.0, 5.0],
            data_max: vec![2.0, 5.0],
            clip: false,
        };
        assert_float_eq(scaler.scale(0, 0.0), 0.5, 1e-12);
        assert_float_eq(scaler.scale(0, 4.0), 1.5, 1e-12);
        // constant column: unit scale, shifted to the range minimum
        assert_float_eq(scaler.scale(1, 5.0), 0.0, 1e-12);
        let clipped = MinMaxScaler {
            clip: true,
            ..scaler
        };
        assert_float_eq(clipped.scale(0, 4.0), 1.0, 1e-12);
    }

    #[test]
    fn test_artifact_json_roundtrip() {
        let artifact =
            PipelineArtifact::from_json(&artifact_json(&["tss", "polya"], -3.0, 3.0)).unwrap();
        let reloaded = PipelineArtifact::from_json(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, artifact);
    }
}
