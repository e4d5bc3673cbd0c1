//! The overlap primitive and the heterogeneous "before/overlap/after"
//! comparator that sits on top of it.
//!
//! Both operate exclusively in 1-based inclusive coordinates; callers
//! holding 0-based half-open (BED) coordinates convert at the boundary
//! (`bed_start + 1`, `bed_end` unchanged) rather than this module
//! accepting mixed conventions.

use crate::chrom::{chrom_cmp, ChromCompareError};
use std::cmp::Ordering;

/// A position in 1-based inclusive coordinates (GFF3, SAM POS, VCF POS).
pub type OneBased = u64;

/// Result of the overlap primitive (§4.5): lengths of both inputs plus
/// the overlap span, all in 1-based inclusive space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub len_a: u64,
    pub len_b: u64,
    pub overlap_start: u64,
    pub overlap_end: u64,
    pub overlap_len: i64,
}

impl Overlap {
    /// Whether the two intervals actually overlap (`overlap_len > 0`).
    pub fn overlaps(&self) -> bool {
        self.overlap_len > 0
    }
}

/// Compute the overlap primitive for two 1-based inclusive ranges.
///
/// `os = max(a_start, b_start)`, `oe = min(a_end, b_end)`,
/// `ol = oe - os + 1`; a non-positive `ol` means the ranges don't
/// overlap (the returned `overlap_start`/`overlap_end` are still the
/// formula's values, not clamped, since callers only act on them when
/// `overlap_len > 0`).
pub fn overlap(a_start: OneBased, a_end: OneBased, b_start: OneBased, b_end: OneBased) -> Overlap {
    let len_a = a_end.saturating_sub(a_start) + 1;
    let len_b = b_end.saturating_sub(b_start) + 1;
    let os = a_start.max(b_start);
    let oe = a_end.min(b_end);
    let ol = oe as i64 - os as i64 + 1;
    Overlap {
        len_a,
        len_b,
        overlap_start: os,
        overlap_end: oe,
        overlap_len: ol,
    }
}

/// Anything with a chromosome and a 1-based inclusive range, so the
/// heterogeneous comparator can be written once and dispatched over
/// BED/GFF/SAM records alike.
pub trait GenomicRecord {
    fn chrom(&self) -> &str;
    fn start_1based(&self) -> u64;
    fn end_1based(&self) -> u64;
}

/// Three-valued "before / overlap / after" comparison between two
/// records of possibly different kinds (§4.6). Compares chromosomes
/// first via [`chrom_cmp`]; only when they're equal does it fall
/// through to a 1-based range comparison where any overlap reports
/// `Equal`.
pub fn cmp_records<X: GenomicRecord, Y: GenomicRecord>(
    x: &X,
    y: &Y,
) -> Result<Ordering, ChromCompareError> {
    let chrom_order = chrom_cmp(x.chrom(), y.chrom())?;
    if chrom_order != Ordering::Equal {
        return Ok(chrom_order);
    }

    let (xs, xe) = (x.start_1based(), x.end_1based());
    let (ys, ye) = (y.start_1based(), y.end_1based());

    if xe < ys {
        Ok(Ordering::Less)
    } else if xs > ye {
        Ok(Ordering::Greater)
    } else {
        Ok(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct R {
        chrom: &'static str,
        start: u64,
        end: u64,
    }

    impl GenomicRecord for R {
        fn chrom(&self) -> &str {
            self.chrom
        }
        fn start_1based(&self) -> u64 {
            self.start
        }
        fn end_1based(&self) -> u64 {
            self.end
        }
    }

    #[test]
    fn overlap_basic() {
        let o = overlap(100, 200, 150, 250);
        assert_eq!(o.len_a, 101);
        assert_eq!(o.len_b, 101);
        assert_eq!(o.overlap_start, 150);
        assert_eq!(o.overlap_end, 200);
        assert_eq!(o.overlap_len, 51);
        assert!(o.overlaps());
    }

    #[test]
    fn scenario_c_coordinate_reconciliation() {
        // BED chr1 100 200 -> 1-based inclusive (101, 200); GFF chr1
        // 150 300 is already 1-based inclusive and needs no conversion.
        // Applying the primitive literally: os = max(101, 150) = 150,
        // oe = min(200, 300) = 200, ol = oe - os + 1 = 51.
        let bed_start = 100u64 + 1;
        let bed_end = 200u64;
        let o = overlap(bed_start, bed_end, 150, 300);
        assert_eq!(o.len_a, 100);
        assert_eq!(o.len_b, 151);
        assert_eq!(o.overlap_start, 150);
        assert_eq!(o.overlap_end, 200);
        assert_eq!(o.overlap_len, 51);
    }

    #[test]
    fn non_overlapping_has_non_positive_len() {
        let o = overlap(100, 200, 300, 400);
        assert!(!o.overlaps());
        assert!(o.overlap_len <= 0);
    }

    #[test]
    fn cmp_records_chrom_first() {
        let a = R { chrom: "chr2", start: 1, end: 10 };
        let b = R { chrom: "chr10", start: 1, end: 10 };
        assert_eq!(cmp_records(&a, &b).unwrap(), Ordering::Less);
    }

    #[test]
    fn cmp_records_trichotomy_on_same_chrom() {
        let before = R { chrom: "chr1", start: 1, end: 50 };
        let overlapping = R { chrom: "chr1", start: 40, end: 60 };
        let after = R { chrom: "chr1", start: 100, end: 200 };

        assert_eq!(cmp_records(&before, &overlapping).unwrap(), Ordering::Equal);
        assert_eq!(
            cmp_records(&before, &after).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            cmp_records(&after, &before).unwrap(),
            Ordering::Greater
        );
    }
}
