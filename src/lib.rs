// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! `peak_classifier`: format readers for BED/GFF3/FASTA/FASTQ/SAM/VCF, an
//! interval overlap algebra over them, an alignment window, a GFF
//! positional index, and the three-stage peak-classification pipeline
//! built on top of all of it.
//!
//! # Features
//!
//! - **Format readers**: one reader (and, where the format calls for
//!   one, writer) per format, each reporting the same shape of outcome
//!   (clean record / EOF / short record / invalid record).
//! - **Overlap algebra**: a 1-based-inclusive overlap primitive and a
//!   heterogeneous before/overlap/after comparator built on it, shared
//!   by every sorted-stream algorithm in the crate.
//! - **Streaming pipeline**: classify BED peaks against a GFF3 gene
//!   model without holding either input fully in memory.
//!
//! # Example
//!
//! ```rust,no_run
//! use peak_classifier::bed::BedReader;
//! use peak_classifier::gff::GffReader;
//! use peak_classifier::pipeline::{self, PipelineConfig};
//! use std::io::BufReader;
//! use std::fs::File;
//!
//! let peaks = BufReader::new(File::open("peaks.bed").unwrap());
//! let features = BufReader::new(File::open("genes.gff3").unwrap());
//! let cfg = PipelineConfig {
//!     upstream_offsets: vec![2000],
//!     max_intergenic_distance: 10_000,
//!     feature_type_filter: None,
//!     external_tool: None,
//! };
//! let mut out = Vec::new();
//! pipeline::run(peaks, std::path::Path::new("peaks.bed"), features, &mut out, &cfg).unwrap();
//! ```

pub mod bed;
pub mod chrom;
pub mod config;
pub mod error;
pub mod fasta;
pub mod fastq;
pub mod gff;
pub mod gff_index;
pub mod ioutil;
pub mod overlap;
pub mod pipeline;
pub mod sam;
pub mod tokenizer;
pub mod vcf;
pub mod window;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly imported items, re-exported for callers who want one `use`.
pub mod prelude {
    pub use crate::bed::{BedFeature, BedReader};
    pub use crate::chrom::chrom_cmp;
    pub use crate::error::ClassifierError;
    pub use crate::gff::{GffFeature, GffReader};
    pub use crate::overlap::{cmp_records, overlap, GenomicRecord, Overlap};
    pub use crate::pipeline::{run, PipelineConfig};
}

#[cfg(test)]
mod tests {
    use crate::bed::BedReader;
    use crate::gff::GffReader;
    use crate::pipeline::{self, PipelineConfig};
    use std::io::Cursor;
    use std::path::Path;

    #[test]
    fn test_basic_workflow() {
        let peaks = "chr1\t1400\t1600\n";
        let gff = "chr1\tsrc\tgene\t1000\t5000\t.\t+\t.\tID=g1;Name=GENE1\n\
                   chr1\tsrc\tmRNA\t1000\t5000\t.\t+\t.\tID=t1;Parent=g1\n\
                   chr1\tsrc\texon\t1000\t1500\t.\t+\t.\tID=e1;Parent=t1\n";
        let cfg = PipelineConfig {
            upstream_offsets: vec![],
            max_intergenic_distance: 1000,
            feature_type_filter: None,
            external_tool: None,
        };
        let mut out = Vec::new();
        pipeline::run(
            Cursor::new(peaks.as_bytes()),
            Path::new("peaks.bed"),
            Cursor::new(gff.as_bytes().to_vec()),
            &mut out,
            &cfg,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("exon"));
        assert!(text.contains("GENE1"));
    }

    #[test]
    fn test_bed_and_gff_readers_share_the_overlap_primitive() {
        use crate::overlap::overlap;

        let mut bed = BedReader::new(Cursor::new(b"chr1\t100\t200\n".to_vec()));
        bed.skip_header().unwrap();
        let peak = match bed.read().unwrap() {
            crate::bed::BedOutcome::Record(f) => f,
            other => panic!("unexpected outcome: {other:?}"),
        };

        let mut gff = GffReader::new(Cursor::new(
            b"chr1\tsrc\texon\t150\t300\t.\t+\t.\tID=e1\n".to_vec(),
        ));
        let feature = match gff.read().unwrap() {
            crate::gff::GffOutcome::Record(f) => f,
            other => panic!("unexpected outcome: {other:?}"),
        };

        use crate::overlap::GenomicRecord;
        let o = overlap(
            peak.start_1based(),
            peak.end_1based(),
            feature.start_1based(),
            feature.end_1based(),
        );
        assert!(o.overlaps());
    }
}
