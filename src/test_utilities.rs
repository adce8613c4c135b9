//! Test cases and test utility functions.
//!

use flate2::write::GzEncoder;
use flate2::Compression;
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::io::Write;
use tempfile::NamedTempFile;

use crate::{intervals::Interval, Position};

// Stochastic test defaults
//
// This is the random number of values to use in tests.
// The tradeoff is catching stochastic errors vs test time.
pub const NRANDOM_VALUES: usize = 10000;

// number of chromosome sequences
pub const NCHROM: usize = 22;

// chromosome sizes
pub const MIN_CHROM_LEN: Position = 50_000_000;
pub const MAX_CHROM_LEN: Position = 250_000_000;

/// The fixed interval width used by the data loader.
pub const WIDTH: Position = 101;

/// Build a random range start/end of width [`WIDTH`] on a sequence of `chrom_len`.
/// 0-indexed, right exclusive
pub fn random_range(chrom_len: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let start = rng.gen_range(0..chrom_len - WIDTH + 1);
    (start, start + WIDTH)
}

/// Build random sequence lengths
pub fn random_seqlen() -> Position {
    let mut rng = thread_rng();
    rng.gen_range(MIN_CHROM_LEN..=MAX_CHROM_LEN)
}

/// Sample a random chromosome
pub fn random_chrom() -> String {
    let mut rng = thread_rng();
    format!("chr{}", rng.gen_range(1..NCHROM + 1))
}

/// Build a random [`Interval`] with a random strand.
pub fn random_interval() -> Interval {
    let mut rng = thread_rng();
    let (start, end) = random_range(random_seqlen());
    let strand = ["+", "-", "."].choose(&mut rng).copied().unwrap_or(".");
    Interval::new(random_chrom(), start, end)
        .with_strand(crate::intervals::Strand::parse_optional(strand).unwrap())
}

/// Build the text of a random BED6 file with `n` records.
pub fn random_bed_text(n: usize) -> String {
    let mut text = String::new();
    for i in 0..n {
        let interval = random_interval();
        text.push_str(&format!(
            "{}\t{}\t{}\tpeak{}\t0\t{}\n",
            interval.seqname,
            interval.start,
            interval.end,
            i,
            interval.strand_str()
        ));
    }
    text
}

/// Build a random nucleotide sequence of length `len`.
pub fn random_sequence(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| *b"ACGT".choose(&mut rng).unwrap_or(&b'N') as char)
        .collect()
}

/// Write `contents` to a new temporary file.
pub fn temp_text_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("could not create temporary file");
    file.write_all(contents.as_bytes())
        .expect("could not write temporary file");
    file.flush().expect("could not flush temporary file");
    file
}

/// Write gzip-compressed `contents` to a new temporary file.
pub fn temp_gzip_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("could not create temporary file");
    let mut encoder = GzEncoder::new(
        file.reopen().expect("could not reopen temporary file"),
        Compression::default(),
    );
    encoder
        .write_all(contents.as_bytes())
        .expect("could not write temporary file");
    encoder.finish().expect("could not finish gzip stream");
    file
}

/// Assert two floats are equal within `tol`.
pub fn assert_float_eq(left: f64, right: f64, tol: f64) {
    assert!(
        (left - right).abs() <= tol,
        "assertion failed: {} != {} (tolerance {})",
        left,
        right,
        tol
    );
}
