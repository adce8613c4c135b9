use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use seqdist::{
    commands::{seqdist_distances, seqdist_dump},
    prelude::{DatasetConfig, Landmark, SeqDistError, ALL_LANDMARKS},
    reporting::CommandOutput,
};

const INFO: &str = "\
seqdist: one-hot sequence and gene landmark distance features for genomic intervals
usage: seqdist [--help] <subcommand>

Subcommands:

  distances: signed distances from each interval to the closest gene landmarks.

  dump: write every record of a dataset (sequence, targets, and spline encoded
        distance features) as TSV.

";

#[derive(Parser)]
#[clap(name = "seqdist")]
#[clap(about = INFO)]
struct Cli {
    /// increase logging verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Distances {
        /// a GTF gene annotation file
        #[arg(long, required = true)]
        gtf: PathBuf,

        /// an input BED-like TSV file
        #[arg(long, required = true)]
        intervals: PathBuf,

        /// comma-separated landmarks (default: all)
        #[arg(long, value_delimiter = ',')]
        landmarks: Vec<Landmark>,

        /// consider landmarks on both strands, and do not flip distances of
        /// reverse strand intervals
        #[arg(long)]
        ignore_strand: bool,

        /// use landmarks of all genes, not just protein coding ones
        #[arg(long)]
        all_genes: bool,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    Dump {
        /// an input BED-like TSV file of 101bp intervals
        #[arg(long, required = true)]
        intervals: PathBuf,

        /// the reference genome FASTA file (indexed, if a .fai file exists)
        #[arg(long, required = true)]
        fasta: PathBuf,

        /// a GTF gene annotation file
        #[arg(long, required = true)]
        gtf: PathBuf,

        /// the fitted distance transformer JSON file
        #[arg(long, required = true)]
        transformer: PathBuf,

        /// an optional file of one target value per interval
        #[arg(long)]
        targets: Option<PathBuf>,

        /// use landmarks of all genes, not just protein coding ones
        #[arg(long)]
        all_genes: bool,

        /// scan the interval file on each lookup rather than indexing it
        #[arg(long)]
        no_linecache: bool,

        /// an optional output file (standard output will be used if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(debug: u8) {
    let level = match debug {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn run() -> Result<(), SeqDistError> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match &cli.command {
        Some(Commands::Distances {
            gtf,
            intervals,
            landmarks,
            ignore_strand,
            all_genes,
            output,
        }) => {
            let landmarks = if landmarks.is_empty() {
                ALL_LANDMARKS.to_vec()
            } else {
                landmarks.clone()
            };
            seqdist_distances(
                gtf,
                intervals,
                &landmarks,
                !*ignore_strand,
                !*all_genes,
                output.as_ref(),
            )
        }
        Some(Commands::Dump {
            intervals,
            fasta,
            gtf,
            transformer,
            targets,
            all_genes,
            no_linecache,
            output,
        }) => {
            let mut config = DatasetConfig::new(intervals, fasta, gtf, transformer)
                .with_protein_coding_filter(!*all_genes)
                .with_linecache(!*no_linecache);
            config.target_file = targets.clone();
            seqdist_dump(config, output.as_ref())
        }
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };
    let CommandOutput { value, report } = result?;
    for issue in report.issues() {
        warn!("{}", issue);
    }
    info!("wrote {} records", value);
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
