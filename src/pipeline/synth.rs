//! Stage A: walk a GFF3 gene hierarchy and synthesize the augmented
//! record stream Stage B joins against.
//!
//! A gene block is everything from one `gene` feature up to (but not
//! including) the next `gene` feature, a `###` sentinel, or EOF. Within
//! a block the gene itself, each of its descendants, an `upstream-<n>`
//! window per configured offset, and an `intron` interval for each gap
//! between adjacent same-parent children are emitted, converted to
//! 0-based half-open and written to a scratch file in a flat seven
//! column format (augmented records carry fields a plain BED record
//! does not: feature type, gene name, gene id).
//!
//! Grounded on `commands/closest.rs`'s `Interval`-producing helpers for
//! the coordinate arithmetic, and on [`crate::bed`]'s own
//! read/parse/write split for the augmented record's own I/O.

use crate::chrom::chrom_cmp;
use crate::error::ClassifierError;
use crate::gff::{GffFeature, GffOutcome, GffReader};
use crate::overlap::GenomicRecord;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Seek, Write};
use tempfile::NamedTempFile;

/// A synthesized record: a gene, one of its descendants, an
/// `upstream-<n>` window, or an intron, in 0-based half-open
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub feature_type: String,
    pub gene_name: String,
    pub gene_id: Option<String>,
}

impl GenomicRecord for AugmentedRecord {
    fn chrom(&self) -> &str {
        &self.chrom
    }
    fn start_1based(&self) -> u64 {
        self.start + 1
    }
    fn end_1based(&self) -> u64 {
        self.end
    }
}

fn write_augmented<W: Write>(w: &mut W, r: &AugmentedRecord) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        r.chrom,
        r.start,
        r.end,
        r.feature_type,
        r.gene_name,
        r.gene_id.as_deref().unwrap_or(".")
    )
}

/// Reads back the scratch file [`synthesize`] produces.
pub struct AugmentedReader<R: BufRead> {
    reader: R,
    line_buf: String,
}

impl<R: BufRead> AugmentedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: String::new(),
        }
    }

    pub fn read(&mut self) -> std::io::Result<Option<AugmentedRecord>> {
        self.line_buf.clear();
        let n = self.reader.read_line(&mut self.line_buf)?;
        if n == 0 {
            return Ok(None);
        }
        let line = self.line_buf.trim_end_matches(['\n', '\r']);
        let cols: Vec<&str> = line.split('\t').collect();
        Ok(Some(AugmentedRecord {
            chrom: cols[0].to_string(),
            start: cols[1].parse().unwrap_or(0),
            end: cols[2].parse().unwrap_or(0),
            feature_type: cols[3].to_string(),
            gene_name: cols[4].to_string(),
            gene_id: (cols[5] != ".").then(|| cols[5].to_string()),
        }))
    }
}

/// A gene's own span and name, kept separately from the scratch file
/// so Stage C can run the intergenic fallback without re-reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneSummary {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub name: String,
}

pub struct SynthConfig {
    pub upstream_offsets: Vec<u64>,
    pub feature_type_filter: Option<HashSet<String>>,
}

pub struct SynthOutput {
    pub scratch: NamedTempFile,
    pub genes: Vec<GeneSummary>,
}

fn passes_filter(feature_type: &str, filter: &Option<HashSet<String>>) -> bool {
    match filter {
        Some(set) => set.contains(feature_type),
        None => true,
    }
}

/// Drive a GFF3 stream through Stage A, producing the scratch file and
/// gene list Stage B/C consume.
///
/// A gene block's own records are emitted in hierarchy order (gene,
/// then upstream windows, then children, then introns), which is not
/// generally `(chrom, start)` order — an upstream window or an intron
/// can have a smaller start than the gene that precedes it in the
/// block. Records are therefore buffered across the whole stream and
/// sorted by `(chrom via chrom_cmp, start)` before being written to the
/// scratch file, since Stage B's merge-join (`pipeline::join`) assumes
/// that ordering (§4.7 Stage A/B).
pub fn synthesize<R: BufRead + Seek>(
    gff: &mut GffReader<R>,
    cfg: &SynthConfig,
) -> Result<SynthOutput, ClassifierError> {
    let mut scratch = NamedTempFile::new().map_err(ClassifierError::Io)?;
    let mut genes = Vec::new();
    let mut records: Vec<AugmentedRecord> = Vec::new();
    let mut current_gene: Option<GffFeature> = None;
    let mut children: Vec<GffFeature> = Vec::new();

    loop {
        match gff.read()? {
            GffOutcome::Eof => {
                flush_block(current_gene.take(), &children, cfg, &mut genes, &mut records);
                break;
            }
            GffOutcome::Record(f) if f.is_sentinel() => {
                flush_block(current_gene.take(), &children, cfg, &mut genes, &mut records);
                children.clear();
            }
            GffOutcome::Record(f) if f.feature_type == "gene" => {
                flush_block(current_gene.take(), &children, cfg, &mut genes, &mut records);
                children.clear();
                current_gene = Some(f);
            }
            GffOutcome::Record(f) => {
                if current_gene.is_some() {
                    children.push(f);
                } else if passes_filter(&f.feature_type, &cfg.feature_type_filter) {
                    records.push(make_record(&f, &f.feature_type, &f.name, f.id.clone()));
                }
            }
        }
    }

    sort_augmented(&mut records)?;
    for record in &records {
        write_augmented(&mut scratch, record).map_err(ClassifierError::Io)?;
    }

    Ok(SynthOutput { scratch, genes })
}

/// Sort `records` by `(chrom via chrom_cmp, start)`. A chromosome
/// comparison failure is a data error, same as everywhere else
/// `chrom_cmp` gates a sort or merge.
fn sort_augmented(records: &mut [AugmentedRecord]) -> Result<(), ClassifierError> {
    let mut err = None;
    records.sort_by(|a, b| match chrom_cmp(&a.chrom, &b.chrom) {
        Ok(Ordering::Equal) => a.start.cmp(&b.start),
        Ok(ord) => ord,
        Err(e) => {
            if err.is_none() {
                err = Some(e);
            }
            Ordering::Equal
        }
    });
    match err {
        Some(e) => Err(ClassifierError::ChromCompare(e.to_string())),
        None => Ok(()),
    }
}

fn make_record(
    f: &GffFeature,
    feature_type: &str,
    gene_name: &str,
    gene_id: Option<String>,
) -> AugmentedRecord {
    AugmentedRecord {
        chrom: f.seqid.clone(),
        start: f.start - 1,
        end: f.end,
        feature_type: feature_type.to_string(),
        gene_name: gene_name.to_string(),
        gene_id,
    }
}

fn flush_block(
    gene: Option<GffFeature>,
    children: &[GffFeature],
    cfg: &SynthConfig,
    genes: &mut Vec<GeneSummary>,
    records: &mut Vec<AugmentedRecord>,
) {
    let Some(gene) = gene else {
        return;
    };

    genes.push(GeneSummary {
        chrom: gene.seqid.clone(),
        start: gene.start,
        end: gene.end,
        name: gene.name.clone(),
    });

    if passes_filter(&gene.feature_type, &cfg.feature_type_filter) {
        records.push(make_record(&gene, &gene.feature_type, &gene.name, gene.id.clone()));
    }

    for offset in &cfg.upstream_offsets {
        let (start, end) = upstream_window(&gene, *offset);
        if start >= end {
            continue;
        }
        records.push(AugmentedRecord {
            chrom: gene.seqid.clone(),
            start,
            end,
            feature_type: format!("upstream-{offset}"),
            gene_name: gene.name.clone(),
            gene_id: gene.id.clone(),
        });
    }

    for child in children {
        if passes_filter(&child.feature_type, &cfg.feature_type_filter) {
            records.push(make_record(child, &child.feature_type, &gene.name, gene.id.clone()));
        }
    }

    emit_introns(&gene, children, records);
}

/// `bed_start`/`bed_end` of the upstream window for `offset` nt,
/// mirrored across strand: plus-strand windows sit immediately before
/// `gene.start`, minus-strand windows immediately after `gene.end`.
/// 0-based half-open.
fn upstream_window(gene: &GffFeature, offset: u64) -> (u64, u64) {
    if gene.strand == '-' {
        (gene.end, gene.end + offset)
    } else {
        let gene_start0 = gene.start - 1;
        (gene_start0.saturating_sub(offset), gene_start0)
    }
}

/// Emit an `intron` record for each gap between adjacent children that
/// share a parent, sorted by start. Children are grouped by `parent`
/// rather than by feature type, since the transcript-list group (keyed
/// by the gene's own id) is excluded, leaving only exon-like leaf
/// groups.
fn emit_introns(gene: &GffFeature, children: &[GffFeature], records: &mut Vec<AugmentedRecord>) {
    let mut by_parent: HashMap<&str, Vec<(u64, u64)>> = HashMap::new();
    for child in children {
        by_parent
            .entry(child.parent.as_str())
            .or_default()
            .push((child.start, child.end));
    }

    let gene_id = gene.id.as_deref();
    for (parent, mut spans) in by_parent {
        if Some(parent) == gene_id {
            // This group is the gene's own direct children (the
            // transcript list), not a transcript's exons.
            continue;
        }
        spans.sort_by_key(|&(s, _)| s);
        for pair in spans.windows(2) {
            let (_, e1) = pair[0];
            let (s2, _) = pair[1];
            if s2 > e1 + 1 {
                records.push(AugmentedRecord {
                    chrom: gene.seqid.clone(),
                    start: e1,
                    end: s2 - 1,
                    feature_type: "intron".to_string(),
                    gene_name: gene.name.clone(),
                    gene_id: gene.id.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gff_reader(s: &str) -> GffReader<Cursor<Vec<u8>>> {
        GffReader::new(Cursor::new(s.as_bytes().to_vec()))
    }

    fn read_all<R: BufRead>(mut r: AugmentedReader<R>) -> Vec<AugmentedRecord> {
        let mut out = Vec::new();
        while let Some(rec) = r.read().unwrap() {
            out.push(rec);
        }
        out
    }

    #[test]
    fn gene_and_exons_pass_through() {
        let gff = "chr1\tsrc\tgene\t1000\t5000\t.\t+\t.\tID=g1;Name=GENE1\n\
                   chr1\tsrc\tmRNA\t1000\t5000\t.\t+\t.\tID=t1;Parent=g1\n\
                   chr1\tsrc\texon\t1000\t1500\t.\t+\t.\tID=e1;Parent=t1\n\
                   chr1\tsrc\texon\t2000\t2500\t.\t+\t.\tID=e2;Parent=t1\n";
        let mut r = gff_reader(gff);
        let cfg = SynthConfig {
            upstream_offsets: vec![],
            feature_type_filter: None,
        };
        let out = synthesize(&mut r, &cfg).unwrap();
        assert_eq!(out.genes.len(), 1);
        assert_eq!(out.genes[0].name, "GENE1");

        let file = out.scratch.reopen().unwrap();
        let records = read_all(AugmentedReader::new(std::io::BufReader::new(file)));
        let types: Vec<&str> = records.iter().map(|r| r.feature_type.as_str()).collect();
        assert!(types.contains(&"gene"));
        assert!(types.contains(&"mRNA"));
        assert!(types.contains(&"exon"));
        assert!(types.contains(&"intron"));

        let intron = records.iter().find(|r| r.feature_type == "intron").unwrap();
        assert_eq!((intron.start, intron.end), (1500, 1999));
    }

    #[test]
    fn upstream_window_plus_strand() {
        let gene = GffFeature {
            seqid: "chr1".to_string(),
            source: "s".to_string(),
            feature_type: "gene".to_string(),
            start: 5000,
            end: 6000,
            score: None,
            strand: '+',
            phase: '.',
            attributes: String::new(),
            id: Some("g1".to_string()),
            name: "G".to_string(),
            parent: "noparent".to_string(),
            file_offset: 0,
        };
        assert_eq!(upstream_window(&gene, 2000), (2999, 4999));
    }

    #[test]
    fn upstream_window_minus_strand() {
        let gene = GffFeature {
            seqid: "chr1".to_string(),
            source: "s".to_string(),
            feature_type: "gene".to_string(),
            start: 5000,
            end: 6000,
            score: None,
            strand: '-',
            phase: '.',
            attributes: String::new(),
            id: Some("g1".to_string()),
            name: "G".to_string(),
            parent: "noparent".to_string(),
            file_offset: 0,
        };
        assert_eq!(upstream_window(&gene, 2000), (6000, 8000));
    }

    #[test]
    fn feature_type_filter_drops_unwanted_children() {
        let gff = "chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1;Name=G1\n\
                   chr1\tsrc\tmRNA\t1\t100\t.\t+\t.\tID=t1;Parent=g1\n\
                   chr1\tsrc\tCDS\t10\t20\t.\t+\t0\tID=c1;Parent=t1\n";
        let mut r = gff_reader(gff);
        let mut filter = HashSet::new();
        filter.insert("gene".to_string());
        let cfg = SynthConfig {
            upstream_offsets: vec![],
            feature_type_filter: Some(filter),
        };
        let out = synthesize(&mut r, &cfg).unwrap();
        let file = out.scratch.reopen().unwrap();
        let records = read_all(AugmentedReader::new(std::io::BufReader::new(file)));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].feature_type, "gene");
    }

    #[test]
    fn adjacent_exons_with_no_gap_emit_no_intron() {
        let gff = "chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1;Name=G1\n\
                   chr1\tsrc\tmRNA\t1\t100\t.\t+\t.\tID=t1;Parent=g1\n\
                   chr1\tsrc\texon\t1\t50\t.\t+\t.\tID=e1;Parent=t1\n\
                   chr1\tsrc\texon\t51\t100\t.\t+\t.\tID=e2;Parent=t1\n";
        let mut r = gff_reader(gff);
        let cfg = SynthConfig {
            upstream_offsets: vec![],
            feature_type_filter: None,
        };
        let out = synthesize(&mut r, &cfg).unwrap();
        let file = out.scratch.reopen().unwrap();
        let records = read_all(AugmentedReader::new(std::io::BufReader::new(file)));
        assert!(!records.iter().any(|r| r.feature_type == "intron"));
    }

    #[test]
    fn sentinel_flushes_block_and_resets() {
        let gff = "chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1;Name=G1\n###\n\
                   chr2\tsrc\tgene\t1\t100\t.\t+\t.\tID=g2;Name=G2\n";
        let mut r = gff_reader(gff);
        let cfg = SynthConfig {
            upstream_offsets: vec![],
            feature_type_filter: None,
        };
        let out = synthesize(&mut r, &cfg).unwrap();
        assert_eq!(out.genes.len(), 2);
    }
}
