//! The external-tool adapter for Stage B: when a caller supplies a
//! collaborator binary (§5's "externally orchestrated" variant), it is
//! invoked once with both input paths rather than the inline merge-join
//! running in-process, and its stdout is parsed into the same
//! [`PeakJoin`] shape the inline path produces.
//!
//! Grounded on `commands/intersect_engine.rs`'s external-tool
//! invocation (`Command::new` + piped stdout, non-zero exit mapped to a
//! fatal error) generalized from bedtools' own `-wa -wb` convention:
//! this adapter expects the collaborator to emit one line per
//! overlapping pair, peak columns first, then the six augmented-record
//! columns `synth.rs` writes to its scratch file.

use super::PeakJoin;
use crate::bed::{BedFeature, BedOutcome, BedReader};
use crate::error::ClassifierError;
use crate::overlap::{overlap, GenomicRecord, Overlap};
use crate::pipeline::synth::AugmentedRecord;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

type PeakKey = (String, u64, u64);

/// Parse one line of the collaborator's stdout into the peak it
/// pertains to and the augmented record it overlapped. Malformed lines
/// are skipped rather than treated as fatal, since a collaborator's
/// logging or blank trailing lines are not this adapter's business.
fn parse_line(line: &str) -> Option<(PeakKey, AugmentedRecord)> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < 9 {
        return None;
    }
    let key = (
        cols[0].to_string(),
        cols[1].parse().ok()?,
        cols[2].parse().ok()?,
    );
    let feature = AugmentedRecord {
        chrom: cols[3].to_string(),
        start: cols[4].parse().ok()?,
        end: cols[5].parse().ok()?,
        feature_type: cols[6].to_string(),
        gene_name: cols[7].to_string(),
        gene_id: (cols[8] != ".").then(|| cols[8].to_string()),
    };
    Some((key, feature))
}

fn group_by_peak<R: BufRead>(reader: R) -> std::io::Result<HashMap<PeakKey, Vec<AugmentedRecord>>> {
    let mut hits: HashMap<PeakKey, Vec<AugmentedRecord>> = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        if let Some((key, feature)) = parse_line(&line) {
            hits.entry(key).or_default().push(feature);
        }
    }
    Ok(hits)
}

/// Build the final [`PeakJoin`] list: every peak in input order,
/// carrying whichever augmented records the collaborator reported for
/// it (none, if it reported none), each with its overlap recomputed via
/// the crate's own overlap primitive rather than trusted from the
/// collaborator's output.
fn build_joins(peaks: Vec<BedFeature>, mut hits: HashMap<PeakKey, Vec<AugmentedRecord>>) -> Vec<PeakJoin> {
    peaks
        .into_iter()
        .map(|peak| {
            let key = (peak.chrom.clone(), peak.chrom_start, peak.chrom_end);
            let mut overlaps: Vec<(AugmentedRecord, Overlap)> = hits
                .remove(&key)
                .unwrap_or_default()
                .into_iter()
                .map(|f| {
                    let ov = overlap(
                        peak.start_1based(),
                        peak.end_1based(),
                        f.start_1based(),
                        f.end_1based(),
                    );
                    (f, ov)
                })
                .collect();
            overlaps.sort_by(|a, b| {
                a.0.start_1based()
                    .cmp(&b.0.start_1based())
                    .then(b.0.end_1based().cmp(&a.0.end_1based()))
            });
            PeakJoin { peak, overlaps }
        })
        .collect()
}

/// Run the collaborator binary named by `tool` against `peaks_path` and
/// `augmented_path`, wait on its exit status, and return the joined
/// rows. `peaks_reader` supplies the canonical, ordered peak list (the
/// collaborator is trusted only for which pairs overlap, not for peak
/// identity or ordering).
pub fn run<R: BufRead>(
    tool: &Path,
    peaks_path: &Path,
    augmented_path: &Path,
    peaks_reader: &mut BedReader<R>,
) -> Result<Vec<PeakJoin>, ClassifierError> {
    let mut peaks = Vec::new();
    loop {
        match peaks_reader.read()? {
            BedOutcome::Eof => break,
            BedOutcome::Record(f) | BedOutcome::ExtraCols(f, _) => peaks.push(f),
        }
    }

    let mut cmd = Command::new(tool);
    cmd.arg(peaks_path)
        .arg(augmented_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().expect("stdout was piped");
    let hits = group_by_peak(BufReader::new(stdout))?;

    let status = child.wait()?;
    if !status.success() {
        return Err(ClassifierError::ExternalTool {
            tool: tool.to_string_lossy().into_owned(),
            status: status.code().unwrap_or(-1),
        });
    }

    Ok(build_joins(peaks, hits))
}
