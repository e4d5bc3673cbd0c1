// Clippy allows
#![allow(clippy::too_many_arguments)]

//! `classify`: classify BED peak intervals against a GFF3 gene model.
//!
//! Usage: classify <PEAKS> <FEATURES> [OPTIONS]

use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

use peak_classifier::config;
use peak_classifier::error::{ClassifierError, EXIT_USAGE};
use peak_classifier::ioutil;
use peak_classifier::pipeline::{self, PipelineConfig};

#[derive(Parser)]
#[command(name = "classify")]
#[command(author = "Manish Kumar Bobbili")]
#[command(version)]
#[command(
    about = "Classify BED peak intervals against a GFF3 gene model",
    long_about = None
)]
struct Cli {
    /// Input peaks BED file (use - for stdin)
    peaks: PathBuf,

    /// Input features GFF3 file (must be a real, uncompressed file:
    /// the gene-hierarchy walk needs to seek, which rules out stdin and
    /// piped decompression)
    features: PathBuf,

    /// Output TSV path (default: stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Path to an external intersection tool. When set, Stage B shells
    /// out to it instead of running the inline merge-join.
    #[arg(long = "tool")]
    tool: Option<PathBuf>,

    /// Upstream-window offset(s), in bp, for "potential promoter"
    /// synthesis. May be given more than once; each offset produces its
    /// own `upstream-<offset>` feature per gene.
    #[arg(long = "upstream", value_name = "BP")]
    upstream_offsets: Vec<u64>,

    /// Maximum distance, in bp, at which the intergenic fallback
    /// attributes an unmatched peak to its nearest gene.
    #[arg(long, default_value_t = 10_000)]
    max_intergenic_distance: u64,

    /// Restrict gene-hierarchy synthesis and classification to this GFF3
    /// feature type. May be given more than once; unset means no filter.
    #[arg(long = "feature-type", value_name = "NAME")]
    feature_type: Vec<String>,

    /// Normalize zero-length BED intervals (start == end) to 1bp, to
    /// match bedtools behavior.
    #[arg(long)]
    bedtools_compatible: bool,

    /// External SAM-like viewer binary, for .bam/.cram peaks input.
    #[arg(long)]
    bam_viewer: Option<PathBuf>,

    /// Extra arguments passed to the viewer. A non-empty value forces
    /// the viewer even for a plain .sam peaks input.
    #[arg(long, default_value = "")]
    bam_viewer_args: String,

    /// Raise the tracing log level (stackable: -v, -vv).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            process::exit(EXIT_USAGE);
        }
    };

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.features.as_os_str() == "-" {
        eprintln!("classify: features input must be a seekable file, not stdin");
        process::exit(EXIT_USAGE);
    }

    match run(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("classify: {e}");
            process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<(), ClassifierError> {
    config::set_bedtools_compatible(cli.bedtools_compatible);

    let mut upstream_offsets = cli.upstream_offsets.clone();
    upstream_offsets.sort_unstable();

    let feature_type_filter =
        (!cli.feature_type.is_empty()).then(|| cli.feature_type.iter().cloned().collect());

    let cfg = PipelineConfig {
        upstream_offsets,
        max_intergenic_distance: cli.max_intergenic_distance,
        feature_type_filter,
        external_tool: cli.tool.clone(),
    };

    let peaks = ioutil::open_read(&cli.peaks, cli.bam_viewer.as_deref(), &cli.bam_viewer_args)?;
    // `peaks` is consumed by `pipeline::run`; if it wraps a decompressor
    // child, that child's exit status is not separately checked here.
    let features = open_seekable_gff(&cli.features)?;

    let mut output = ioutil::open_write(&cli.output)?;
    pipeline::run(peaks, &cli.peaks, features, &mut output, &cfg)?;
    output.finish("output")?;

    Ok(())
}

/// Open `path` as a plain, seekable GFF3 file. The gene-hierarchy walk
/// in [`pipeline::run`] needs `Seek` on its GFF reader, which a pipe
/// (stdin, or a decompressor's stdout) cannot provide, so this bypasses
/// the general stream-open contract rather than buffering a
/// genome-scale annotation file fully into memory to fake one.
fn open_seekable_gff(path: &std::path::Path) -> Result<BufReader<File>, ClassifierError> {
    let file = File::open(path)?;
    Ok(BufReader::new(file))
}
