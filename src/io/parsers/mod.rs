//! Parsers for the text formats the data loader consumes.
//!
//! BED-like interval lines are parsed by [`crate::intervals::parse_interval`], since
//! interval access is line-oriented (see [`crate::intervals::LineCacheIntervals`]). GTF
//! annotation is read in bulk by [`gtf::read_gtf`].

pub mod gtf;

use crate::error::SeqDistError;

/// Parse a single column into type `T`, reporting the whole line on failure.
pub fn parse_column<T: std::str::FromStr>(column: &str, line: &str) -> Result<T, SeqDistError>
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    column
        .parse::<T>()
        .map_err(|_| SeqDistError::InvalidColumnType {
            expected_type: std::any::type_name::<T>().to_string(), // Provides the expected type name
            found_value: column.to_string(),
            line: line.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::parse_column;
    use crate::error::SeqDistError;

    #[test]
    fn test_parse_column() {
        let value: u32 = parse_column("101", "chr1\t101").unwrap();
        assert_eq!(value, 101);
        let result = parse_column::<u32>("-1", "chr1\t-1");
        assert!(matches!(
            result,
            Err(SeqDistError::InvalidColumnType { found_value, .. }) if found_value == "-1"
        ));
    }
}
