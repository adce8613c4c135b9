//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod parsers;
pub mod targets;
pub mod tsv;

pub use file::{InputStream, OutputStream};
pub use parsers::gtf::{read_gtf, GeneFeature, GtfRecord};
pub use targets::Targets;
pub use tsv::BED_TSV;
