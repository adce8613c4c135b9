//! Regression targets, stored as one numeric value per line.

use std::path::PathBuf;

use super::parsers::parse_column;
use crate::error::SeqDistError;
use crate::io::InputStream;

/// Per-interval target values, where line `i` of the file is the target
/// for interval `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Targets {
    values: Vec<f64>,
}

impl Targets {
    /// Read a (possibly gzipped) target file.
    pub fn from_path(filepath: impl Into<PathBuf>) -> Result<Self, SeqDistError> {
        let lines = InputStream::new(filepath).read_lines()?;
        let values = lines
            .iter()
            .map(|line| parse_column::<f64>(line.trim(), line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the target for the `index`-th interval.
    pub fn get(&self, index: usize) -> Result<f64, SeqDistError> {
        self.values
            .get(index)
            .copied()
            .ok_or(SeqDistError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }
}

impl From<Vec<f64>> for Targets {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::Targets;
    use crate::{error::SeqDistError, test_utilities::temp_text_file};

    #[test]
    fn test_targets_from_path() {
        let file = temp_text_file("1\n0\n3.5\n");
        let targets = Targets::from_path(file.path()).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets.get(2).unwrap(), 3.5);
        assert!(matches!(
            targets.get(3),
            Err(SeqDistError::IndexOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_targets_invalid_value() {
        let file = temp_text_file("1\nabc\n");
        assert!(matches!(
            Targets::from_path(file.path()),
            Err(SeqDistError::InvalidColumnType { .. })
        ));
    }
}
