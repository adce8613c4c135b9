//! GTF gene annotation parsing.
//!
//! GTF is a nine column TSV format (1-based, right-inclusive coordinates), with a final
//! `key "value";` attribute column. Only what is needed to build gene landmarks is kept:
//! the sequence name, feature type, coordinates, strand, and attributes (which are used
//! to filter by gene biotype).

use indexmap::IndexMap;
use log::warn;
use std::path::PathBuf;

use super::parse_column;
use crate::error::SeqDistError;
use crate::intervals::Strand;
use crate::io::tsv::build_tsv_reader;
use crate::Position;

/// Attribute names that may carry the gene biotype, in order of preference
/// (GENCODE uses `gene_type`, Ensembl `gene_biotype`).
pub const BIOTYPE_ATTRIBUTES: [&str; 2] = ["gene_type", "gene_biotype"];

pub const PROTEIN_CODING: &str = "protein_coding";

/// A single GTF row.
#[derive(Clone, Debug, PartialEq)]
pub struct GtfRecord {
    pub seqname: String,
    pub source: String,
    pub feature: String,
    /// 1-based start position.
    pub start: Position,
    /// 1-based, inclusive end position.
    pub end: Position,
    pub strand: Option<Strand>,
    pub attributes: IndexMap<String, String>,
}

impl GtfRecord {
    /// Build a record from the nine split columns of a GTF line.
    pub fn from_columns(columns: &[&str], line_number: u64) -> Result<Self, SeqDistError> {
        if columns.len() != 9 {
            return Err(SeqDistError::GtfWrongColumnCount(line_number, columns.len()));
        }
        let line = columns.join("\t");
        Ok(GtfRecord {
            seqname: columns[0].to_string(),
            source: columns[1].to_string(),
            feature: columns[2].to_string(),
            start: parse_column(columns[3], &line)?,
            end: parse_column(columns[4], &line)?,
            strand: Strand::parse_optional(columns[6])?,
            attributes: parse_attributes(columns[8]),
        })
    }

    /// Retrieve an attribute value by key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }
}

/// The coordinates of a GTF record, without its source or attributes. This is all that
/// landmark positions are built from.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneFeature {
    pub seqname: String,
    pub feature: String,
    /// 1-based start position.
    pub start: Position,
    /// 1-based, inclusive end position.
    pub end: Position,
    pub strand: Option<Strand>,
}

impl From<GtfRecord> for GeneFeature {
    fn from(record: GtfRecord) -> Self {
        GeneFeature {
            seqname: record.seqname,
            feature: record.feature,
            start: record.start,
            end: record.end,
            strand: record.strand,
        }
    }
}

/// Parse a GTF attribute column, e.g. `gene_id "ENSG01"; gene_type "protein_coding";`.
/// When a key is repeated (e.g. `tag`), the first value is kept.
pub fn parse_attributes(column: &str) -> IndexMap<String, String> {
    let mut attributes = IndexMap::new();
    for pair in column.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair
            .split_once(char::is_whitespace)
            .unwrap_or((pair, ""));
        attributes
            .entry(key.to_string())
            .or_insert_with(|| value.trim().trim_matches('"').to_string());
    }
    attributes
}

/// Read all records from a (possibly gzipped) GTF file. Comment lines starting
/// with `#` are skipped.
pub fn read_gtf(filepath: impl Into<PathBuf>) -> Result<Vec<GtfRecord>, SeqDistError> {
    let mut reader = build_tsv_reader(filepath)?;
    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let line_number = row.position().map_or(0, |pos| pos.line());
        let columns: Vec<&str> = row.iter().collect();
        records.push(GtfRecord::from_columns(&columns, line_number)?);
    }
    Ok(records)
}

/// The outcome of protein-coding filtering.
#[derive(Clone, Debug, PartialEq)]
pub enum ProteinCodingFilter {
    /// Records were filtered on the biotype attribute `field`.
    Filtered {
        field: &'static str,
        kept: usize,
        dropped: usize,
    },
    /// No biotype attribute was found, so all records were kept.
    Skipped,
}

/// Retain only records annotated as protein coding. The biotype attribute is
/// the first of [`BIOTYPE_ATTRIBUTES`] present on any record; if none is
/// present, nothing is filtered and a warning is logged.
pub fn filter_protein_coding(records: &mut Vec<GtfRecord>) -> ProteinCodingFilter {
    let field = BIOTYPE_ATTRIBUTES
        .into_iter()
        .find(|key| records.iter().any(|r| r.attributes.contains_key(*key)));

    match field {
        Some(field) => {
            let before = records.len();
            records.retain(|r| r.attribute(field) == Some(PROTEIN_CODING));
            ProteinCodingFilter::Filtered {
                field,
                kept: records.len(),
                dropped: before - records.len(),
            }
        }
        None => {
            warn!(
                "GTF doesn't have the field 'gene_type' or 'gene_biotype'. Considering genomic \
                 landmarks of all genes, not just protein coding ones."
            );
            ProteinCodingFilter::Skipped
        }
    }
}

/// Add a `chr` prefix to any sequence name that does not contain `chr`, returning
/// the number of records renamed.
pub fn normalize_seqnames(records: &mut [GtfRecord]) -> usize {
    let mut renamed = 0;
    for record in records.iter_mut() {
        if !record.seqname.contains("chr") {
            record.seqname = format!("chr{}", record.seqname);
            renamed += 1;
        }
    }
    if renamed > 0 {
        warn!(
            "{} GTF records had sequence names without 'chr'; a 'chr' prefix was added.",
            renamed
        );
    }
    renamed
}
