//! The `seqdist` command line tool's commands.

use std::io::Write;
use std::path::PathBuf;

use crate::{
    dataset::{DatasetConfig, GenomicRanges, SeqDistDataset},
    intervals::ScanIntervals,
    io::{
        parsers::gtf::{filter_protein_coding, normalize_seqnames, ProteinCodingFilter},
        read_gtf,
        tsv::TsvConfig,
        OutputStream, BED_TSV,
    },
    landmarks::{landmark_features, DistToClosestLandmarkExtractor, Landmark},
    reporting::{CommandOutput, Report},
    sequences::one_hot_decode,
    traits::TsvSerialize,
    SeqDistError,
};

impl TsvSerialize for GenomicRanges {
    #![allow(unused_variables)]
    fn to_tsv(&self, config: &TsvConfig) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.chr, self.start, self.end, self.id, self.strand
        )
    }
}

fn output_stream(output: Option<&PathBuf>, header: Vec<String>) -> OutputStream {
    output.map_or(OutputStream::new_stdout(Some(header.clone())), |file| {
        OutputStream::new(file, Some(header))
    })
}

fn report_protein_coding(report: &mut Report, outcome: &ProteinCodingFilter) {
    match outcome {
        ProteinCodingFilter::Filtered { field, dropped, .. } if *dropped > 0 => {
            report.add_issue(format!(
                "{} GTF records were dropped, since their '{}' was not protein_coding",
                dropped, field
            ))
        }
        ProteinCodingFilter::Skipped => report.add_issue(
            "landmarks of all genes were used, since the GTF has no biotype attribute"
                .to_string(),
        ),
        _ => {}
    }
}

/// Write the raw signed distance from each interval to the closest landmarks.
///
/// Intervals of any width are accepted. Missing landmarks are written as `.`.
pub fn seqdist_distances(
    gtf: &PathBuf,
    intervals: &PathBuf,
    landmarks: &[Landmark],
    use_strand: bool,
    filter_genes: bool,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<usize>, SeqDistError> {
    let mut report = Report::new();

    let mut genes = read_gtf(gtf)?;
    if filter_genes {
        let outcome = filter_protein_coding(&mut genes);
        report_protein_coding(&mut report, &outcome);
    }
    let renamed = normalize_seqnames(&mut genes);
    if renamed > 0 {
        report.add_issue(format!(
            "{} GTF records had 'chr' added to their sequence name",
            renamed
        ));
    }
    let genes = landmark_features(genes, landmarks);
    let extractor = DistToClosestLandmarkExtractor::new(&genes, landmarks, use_strand);

    let mut header: Vec<String> = ["chrom", "start", "end", "name", "score", "strand"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(landmarks.iter().map(|l| l.to_string()));
    let output_stream = output_stream(output, header);
    let mut writer = output_stream.writer()?;

    let mut written = 0;
    let mut missing = 0;
    for interval in ScanIntervals::new(intervals)?.iter()? {
        let interval = interval?;
        let mut distances = Vec::with_capacity(landmarks.len());
        for landmark in landmarks {
            match extractor.find_closest(*landmark, &interval) {
                Ok(distance) => distances.push(Some(distance as f64)),
                Err(SeqDistError::MissingLandmark { .. }) => {
                    missing += 1;
                    distances.push(None);
                }
                Err(e) => return Err(e),
            }
        }
        writeln!(
            writer,
            "{}\t{}",
            interval.to_tsv(&BED_TSV),
            distances.to_tsv(&BED_TSV)
        )?;
        written += 1;
    }

    if missing > 0 {
        report.add_issue(format!(
            "{} distances could not be computed, since no landmark was on the interval's sequence (or strand)",
            missing
        ));
    }
    Ok(CommandOutput::new(written, report))
}

/// Write every record of a dataset as TSV: the ranges, the target, the decoded
/// sequence, then each spline encoded distance feature, comma separated.
pub fn seqdist_dump(
    config: DatasetConfig,
    output: Option<&PathBuf>,
) -> Result<CommandOutput<usize>, SeqDistError> {
    let mut report = Report::new();
    let dataset = SeqDistDataset::new(config)?;
    if dataset.config().filter_protein_coding {
        report_protein_coding(&mut report, dataset.protein_coding_filter());
    }

    let mut header: Vec<String> = ["chrom", "start", "end", "id", "strand", "target", "seq"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(
        dataset
            .config()
            .landmarks
            .iter()
            .map(|l| format!("dist_{}", l)),
    );
    let output_stream = output_stream(output, header);
    let mut writer = output_stream.writer()?;

    let mut written = 0;
    for record in dataset.iter() {
        let record = record?;
        let target = record
            .targets
            .as_ref()
            .and_then(|targets| targets.first().copied());
        let seq = one_hot_decode(&record.inputs.seq.view());
        let features: Vec<String> = record
            .inputs
            .dist
            .values()
            .map(|basis| {
                basis
                    .iter()
                    .map(|x| x.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            record.metadata.ranges.to_tsv(&BED_TSV),
            target.to_tsv(&BED_TSV),
            seq,
            features.join("\t")
        )?;
        written += 1;
    }
    Ok(CommandOutput::new(written, report))
}
