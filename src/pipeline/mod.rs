//! Peak classification pipeline: Stage A synthesizes an augmented
//! record stream from a gene hierarchy, Stage B joins peaks against it,
//! Stage C derives a classification token per peak (§4.1, §9).

pub mod annotate;
pub mod join;
pub mod synth;

pub use annotate::AnnotatedRow;
pub use join::PeakJoin;
pub use synth::{AugmentedRecord, GeneSummary, SynthConfig};

use crate::bed::BedReader;
use crate::error::ClassifierError;
use crate::gff::GffReader;
use crate::overlap::GenomicRecord;
use std::collections::HashSet;
use std::io::{BufRead, Seek, Write};
use std::path::Path;

/// Knobs the CLI exposes over the three stages.
pub struct PipelineConfig {
    pub upstream_offsets: Vec<u64>,
    pub max_intergenic_distance: u64,
    pub feature_type_filter: Option<HashSet<String>>,
    pub external_tool: Option<std::path::PathBuf>,
}

/// Run Stage A, B, and C end to end: synthesize augmented records from
/// `gff`, join `peaks` against them (inline unless `cfg.external_tool`
/// names a collaborator binary), classify, and write one TSV row per
/// classified peak to `output`. Any BED header on `peaks` is replayed
/// verbatim ahead of the classified rows.
pub fn run<R1, R2, W>(
    peaks: R1,
    peaks_path: &Path,
    gff: R2,
    output: &mut W,
    cfg: &PipelineConfig,
) -> Result<(), ClassifierError>
where
    R1: BufRead,
    R2: BufRead + Seek,
    W: Write,
{
    let mut peak_reader = BedReader::new(peaks);
    let header = peak_reader.skip_header()?;
    header.replay(output)?;

    let mut gff_reader = GffReader::new(gff);
    let synth_cfg = SynthConfig {
        upstream_offsets: cfg.upstream_offsets.clone(),
        feature_type_filter: cfg.feature_type_filter.clone(),
    };
    let synth_out = synth::synthesize(&mut gff_reader, &synth_cfg)?;

    let scratch_file = synth_out.scratch.reopen()?;
    let mut augmented_reader = synth::AugmentedReader::new(std::io::BufReader::new(scratch_file));

    let joins = match &cfg.external_tool {
        Some(tool) => join::external::run(tool, peaks_path, synth_out.scratch.path(), &mut peak_reader)?,
        None => join::merge_join(&mut peak_reader, &mut augmented_reader)?,
    };

    let rows = annotate::annotate(joins, &synth_out.genes, cfg.max_intergenic_distance);
    for row in &rows {
        write_row(output, row)?;
    }

    Ok(())
}

/// `chrom, start, end, classification, gene_name, distance` (`.` when
/// the row did not come from the intergenic fallback).
fn write_row<W: Write>(w: &mut W, row: &AnnotatedRow) -> Result<(), ClassifierError> {
    let distance = row
        .distance
        .map(|d| d.to_string())
        .unwrap_or_else(|| ".".to_string());
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        row.peak.chrom(),
        row.peak.start_1based() - 1,
        row.peak.end_1based(),
        row.classification,
        row.gene_name,
        distance
    )?;
    Ok(())
}
