//! Alignment window (§4.8): a growable, compacting queue of SAM
//! alignments with its own sort watermark, MAPQ gate, and counters.
//!
//! Grounded on the teacher's `streaming::active_set::ActiveSet` (the
//! `Vec` + head-index + periodic compaction shape) and
//! `commands::streaming_window`'s control flow, generalized from `Copy`
//! 8-byte interval records to owned `SamAlignment`s. The watermark lives
//! on this struct, never in a process-wide static, so sharing a window
//! across threads is a caller error rather than a silent race (§5, §9).

use crate::chrom::chrom_cmp;
use crate::error::WindowError;
use crate::sam::SamAlignment;

const COMPACTION_THRESHOLD: usize = 4096;

/// Running counters the window maintains per §3/§4.8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub total: u64,
    pub trailing: u64,
    pub discarded: u64,
    pub unmapped: u64,
    pub mapq_low: u64,
    pub mapq_high: u64,
    pub mapq_sum: u64,
}

pub struct AlignmentWindow {
    records: Vec<SamAlignment>,
    head: usize,
    watermark: Option<(String, u64)>,
    min_mapq: u8,
    hard_cap: usize,
    stats: WindowStats,
}

impl AlignmentWindow {
    pub fn new(min_mapq: u8, hard_cap: usize) -> Self {
        Self {
            records: Vec::new(),
            head: 0,
            watermark: None,
            min_mapq,
            hard_cap,
            stats: WindowStats::default(),
        }
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `aln` passes the quality gate (mapped, MAPQ >= minimum).
    /// Updates the discarded/mapq counters regardless of the verdict.
    pub fn alignment_ok(&mut self, aln: &SamAlignment) -> bool {
        self.stats.mapq_sum += aln.mapq as u64;
        if aln.is_unmapped() {
            self.stats.unmapped += 1;
            self.stats.discarded += 1;
            return false;
        }
        if (aln.mapq as u32) < self.min_mapq as u32 {
            self.stats.mapq_low += 1;
            self.stats.discarded += 1;
            return false;
        }
        self.stats.mapq_high += 1;
        true
    }

    /// Validate sort order against the watermark and, if it holds,
    /// insert `aln`. A violation is fatal (§4.8, §7, §9): it is
    /// returned as an error rather than silently absorbed, and the
    /// watermark is per-instance so reentrant pipelines each keep their
    /// own.
    pub fn add(&mut self, aln: SamAlignment) -> Result<(), WindowError> {
        if let Some((last_chrom, last_pos)) = &self.watermark {
            let order = chrom_cmp(last_chrom, &aln.rname).map_err(|_| WindowError::SortViolation {
                chrom: aln.rname.clone(),
                pos: aln.pos,
                last_chrom: last_chrom.clone(),
                last_pos: *last_pos,
            })?;
            let violates = match order {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => aln.pos < *last_pos,
                std::cmp::Ordering::Less => false,
            };
            if violates {
                return Err(WindowError::SortViolation {
                    chrom: aln.rname.clone(),
                    pos: aln.pos,
                    last_chrom: last_chrom.clone(),
                    last_pos: *last_pos,
                });
            }
        }

        if self.len() >= self.hard_cap {
            self.stats.trailing += 1;
            return Err(WindowError::AddFailed { cap: self.hard_cap });
        }

        self.watermark = Some((aln.rname.clone(), aln.pos));
        self.stats.total += 1;
        self.records.push(aln);
        self.compact_if_needed();
        Ok(())
    }

    /// Free the first `n` active slots and compact the tail forward.
    pub fn shift(&mut self, n: usize) {
        self.head = (self.head + n).min(self.records.len());
        self.compact_if_needed();
    }

    /// Release one slot in place.
    pub fn free_alignment(&mut self, i: usize) {
        if self.head + i < self.records.len() {
            self.records.remove(self.head + i);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SamAlignment> {
        self.records[self.head..].iter()
    }

    fn compact_if_needed(&mut self) {
        if self.head >= COMPACTION_THRESHOLD && self.head * 2 >= self.records.len() {
            self.records.drain(0..self.head);
            self.head = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(rname: &str, pos: u64, mapq: u8, flag: u16) -> SamAlignment {
        SamAlignment {
            qname: "r".to_string(),
            flag,
            rname: rname.to_string(),
            pos,
            mapq,
            cigar: "4M".to_string(),
            rnext: "*".to_string(),
            pnext: 0,
            tlen: 0,
            seq: "ACGT".to_string(),
            qual: "IIII".to_string(),
        }
    }

    #[test]
    fn accepts_non_decreasing_sequence() {
        let mut w = AlignmentWindow::new(0, 1000);
        w.add(aln("chr1", 100, 60, 0)).unwrap();
        w.add(aln("chr1", 150, 60, 0)).unwrap();
        w.add(aln("chr2", 10, 60, 0)).unwrap();
        assert_eq!(w.stats().total, 3);
    }

    #[test]
    fn scenario_e_rejects_out_of_order() {
        let mut w = AlignmentWindow::new(0, 1000);
        w.add(aln("chr1", 200, 60, 0)).unwrap();
        let err = w.add(aln("chr1", 150, 60, 0)).unwrap_err();
        assert!(matches!(err, WindowError::SortViolation { .. }));
    }

    #[test]
    fn mapq_gate_and_unmapped_filter() {
        let mut w = AlignmentWindow::new(30, 1000);
        assert!(!w.alignment_ok(&aln("chr1", 1, 10, 0)));
        assert!(!w.alignment_ok(&aln("chr1", 1, 60, 0x4)));
        assert!(w.alignment_ok(&aln("chr1", 1, 60, 0)));
        assert_eq!(w.stats().discarded, 2);
        assert_eq!(w.stats().unmapped, 1);
        assert_eq!(w.stats().mapq_low, 1);
        assert_eq!(w.stats().mapq_high, 1);
    }

    #[test]
    fn hard_cap_reports_add_failed_non_fatal() {
        let mut w = AlignmentWindow::new(0, 2);
        w.add(aln("chr1", 1, 60, 0)).unwrap();
        w.add(aln("chr1", 2, 60, 0)).unwrap();
        let err = w.add(aln("chr1", 3, 60, 0)).unwrap_err();
        assert!(matches!(err, WindowError::AddFailed { cap: 2 }));
        // Caller can recover by shifting and retrying.
        w.shift(1);
        w.add(aln("chr1", 3, 60, 0)).unwrap();
    }

    #[test]
    fn shift_compacts_after_threshold() {
        let mut w = AlignmentWindow::new(0, 10_000);
        for i in 0..5000u64 {
            w.add(aln("chr1", i, 60, 0)).unwrap();
        }
        w.shift(4500);
        assert_eq!(w.len(), 500);
    }
}
