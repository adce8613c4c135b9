//! B-spline basis encoding of scalar features.
//!
//! A value in `[start, end]` is expanded into `n_bases` non-negative basis function
//! values that sum to one. The knots are equally spaced, and extend past the domain on
//! both sides so that every basis function is complete on `[start, end]`.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::SeqDistError;

/// Fraction of the domain the knot range is widened by on each side.
const DOMAIN_PADDING: f64 = 0.001;

/// The knot vector for `n_bases` B-spline basis functions of degree `order` on
/// `[start, end]`.
pub fn get_knots(
    n_bases: usize,
    order: usize,
    start: f64,
    end: f64,
) -> Result<Vec<f32>, SeqDistError> {
    if order < 1 || n_bases < order + 1 {
        return Err(SeqDistError::InvalidPipelineArtifact(format!(
            "spline basis with {} bases is too small for spline order {}",
            n_bases, order
        )));
    }
    if !(start < end) {
        return Err(SeqDistError::InvalidPipelineArtifact(format!(
            "spline domain start ({}) must be less than end ({})",
            start, end
        )));
    }

    let padding = (end - start) * DOMAIN_PADDING;
    let (start, end) = (start - padding, end + padding);

    let m = order - 1;
    let nk = n_bases - m;
    let dist = (end - start) / (nk - 1) as f64;
    let n_knots = nk + 2 * m + 2;
    let first = start - dist * (m + 1) as f64;
    let last = end + dist * (m + 1) as f64;
    let step = (last - first) / (n_knots - 1) as f64;

    Ok((0..n_knots)
        .map(|i| (first + step * i as f64) as f32)
        .collect())
}

/// A B-spline basis over a closed domain.
#[derive(Clone, Debug, PartialEq)]
pub struct BSpline {
    knots: Vec<f32>,
    n_bases: usize,
    order: usize,
    start: f64,
    end: f64,
}

impl BSpline {
    /// Create a new basis of `n_bases` functions of degree `order` on `[start, end]`.
    pub fn new(n_bases: usize, order: usize, start: f64, end: f64) -> Result<Self, SeqDistError> {
        let knots = get_knots(n_bases, order, start, end)?;
        Ok(Self {
            knots,
            n_bases,
            order,
            start,
            end,
        })
    }

    pub fn knots(&self) -> &[f32] {
        &self.knots
    }

    pub fn n_bases(&self) -> usize {
        self.n_bases
    }

    /// Evaluate all basis functions at `x`, with the Cox-de Boor recursion. Values
    /// outside of the domain are truncated to it first.
    pub fn basis(&self, x: f64) -> Array1<f32> {
        let x = x.max(self.start).min(self.end);
        let t: Vec<f64> = self.knots.iter().map(|k| *k as f64).collect();
        let n = t.len();

        // degree zero: indicator of the knot span
        let mut b: Vec<f64> = t
            .windows(2)
            .map(|span| if span[0] <= x && x < span[1] { 1.0 } else { 0.0 })
            .collect();

        for p in 1..=self.order {
            for i in 0..(n - 1 - p) {
                let mut value = 0.0;
                let left = t[i + p] - t[i];
                if left > 0.0 {
                    value += (x - t[i]) / left * b[i];
                }
                let right = t[i + p + 1] - t[i + 1];
                if right > 0.0 {
                    value += (t[i + p + 1] - x) / right * b[i + 1];
                }
                b[i] = value;
            }
        }

        b.truncate(self.n_bases);
        b.into_iter().map(|v| v as f32).collect()
    }

    /// Encode a column of values into an `(n, n_bases)` array.
    pub fn encode(&self, values: &ArrayView1<f64>) -> Array2<f32> {
        let mut encoded = Array2::zeros((values.len(), self.n_bases));
        for (mut row, x) in encoded.outer_iter_mut().zip(values.iter()) {
            row.assign(&self.basis(*x));
        }
        encoded
    }
}
