//! Essential TSV parsing and serializing functionality. Parsing wraps the [`csv`] crate's
//! reader, configured for the tab-delimited, unquoted formats used in genomics.

use csv::{Reader, ReaderBuilder};
use lazy_static::lazy_static;
use std::path::PathBuf;

use crate::error::SeqDistError;
use crate::io::InputStream;
use crate::traits::TsvSerialize;

lazy_static! {
    /// The standard BED format TSV configuration.
    pub static ref BED_TSV: TsvConfig = TsvConfig {
        no_value_string: ".".to_string(),
    };
}

/// This is an extensible type to handle common
/// TSV output configurations, e.g. what to print
/// for `None`.
pub struct TsvConfig {
    pub no_value_string: String,
}

/// Build a TSV reader which ignores comment lines and works on gzip-compressed
/// files. Quoting is disabled, since e.g. GTF attribute values carry literal
/// double quotes, and rows may be ragged.
pub fn build_tsv_reader(
    filepath: impl Into<PathBuf>,
) -> Result<Reader<Box<dyn std::io::Read>>, SeqDistError> {
    let input = InputStream::new(filepath);
    let stream = input.reader()?;

    let reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .quoting(false)
        .flexible(true)
        .from_reader(Box::new(stream) as Box<dyn std::io::Read>);
    Ok(reader)
}

impl TsvSerialize for String {
    #![allow(unused_variables)]
    fn to_tsv(&self, config: &TsvConfig) -> String {
        self.clone()
    }
}

impl<U: TsvSerialize> TsvSerialize for Option<U> {
    fn to_tsv(&self, config: &TsvConfig) -> String {
        self.as_ref()
            .map_or(config.no_value_string.clone(), |x| x.to_tsv(config))
    }
}

impl TsvSerialize for f64 {
    #![allow(unused_variables)]
    fn to_tsv(&self, config: &TsvConfig) -> String {
        self.to_string()
    }
}

impl<U: TsvSerialize> TsvSerialize for Vec<U> {
    fn to_tsv(&self, config: &TsvConfig) -> String {
        self.iter()
            .map(|x| x.to_tsv(config))
            .collect::<Vec<_>>()
            .join("\t")
    }
}
