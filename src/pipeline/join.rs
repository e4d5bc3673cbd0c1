//! Stage B: sorted merge-join between the peaks BED stream and the
//! augmented record stream Stage A produced.
//!
//! Grounded on `streaming::active_set::ActiveSet`'s shape (a `Vec` of
//! not-yet-expired candidates, evicted as the leading stream advances)
//! and `commands/streaming_intersect.rs`'s control flow for driving two
//! independently-advancing sorted streams off one "current" cursor.
//! Both input streams must already be sorted by
//! `(chrom via chrom_cmp, start)`; this module does not sort, only
//! merges (§4.7, §9).

use crate::bed::{BedFeature, BedOutcome, BedReader};
use crate::chrom::chrom_cmp;
use crate::error::ClassifierError;
use crate::overlap::{overlap, GenomicRecord, Overlap};
use crate::pipeline::synth::{AugmentedReader, AugmentedRecord};
use std::cmp::Ordering;
use std::io::BufRead;

pub mod external;

/// One peak's join result: zero or more overlapping augmented records,
/// tie-broken (start ascending, then end descending) and carrying the
/// overlap each was computed with.
pub struct PeakJoin {
    pub peak: BedFeature,
    pub overlaps: Vec<(AugmentedRecord, Overlap)>,
}

/// Merge-join `peaks` against `augmented`, returning one [`PeakJoin`]
/// per peak record in input order.
pub fn merge_join<R1: BufRead, R2: BufRead>(
    peaks: &mut BedReader<R1>,
    augmented: &mut AugmentedReader<R2>,
) -> Result<Vec<PeakJoin>, ClassifierError> {
    let mut active: Vec<AugmentedRecord> = Vec::new();
    let mut pending: Option<AugmentedRecord> = None;
    let mut results = Vec::new();

    loop {
        let peak = match peaks.read()? {
            BedOutcome::Eof => break,
            BedOutcome::Record(f) => f,
            BedOutcome::ExtraCols(f, _) => f,
        };

        let peak_chrom = peak.chrom.clone();
        let peak_start1 = peak.start_1based();
        let peak_end1 = peak.end_1based();

        loop {
            let candidate = match pending.take() {
                Some(f) => f,
                None => match augmented.read().map_err(ClassifierError::Io)? {
                    Some(f) => f,
                    None => break,
                },
            };
            let bring_in = match chrom_cmp(&candidate.chrom, &peak_chrom)
                .map_err(|e| ClassifierError::ChromCompare(e.to_string()))?
            {
                Ordering::Less => true,
                Ordering::Equal => candidate.start_1based() <= peak_end1,
                Ordering::Greater => false,
            };
            if bring_in {
                active.push(candidate);
            } else {
                pending = Some(candidate);
                break;
            }
        }

        let mut retain_err = None;
        active.retain(|f| match chrom_cmp(&f.chrom, &peak_chrom) {
            Ok(Ordering::Less) => false,
            Ok(Ordering::Equal) => f.end_1based() >= peak_start1,
            Ok(Ordering::Greater) => true,
            Err(e) => {
                retain_err = Some(e);
                true
            }
        });
        if let Some(e) = retain_err {
            return Err(ClassifierError::ChromCompare(e.to_string()));
        }

        let mut hits: Vec<(AugmentedRecord, Overlap)> = Vec::new();
        for f in &active {
            if chrom_cmp(&f.chrom, &peak_chrom).map_err(|e| ClassifierError::ChromCompare(e.to_string()))?
                != Ordering::Equal
            {
                continue;
            }
            let ov = overlap(peak_start1, peak_end1, f.start_1based(), f.end_1based());
            if ov.overlaps() {
                hits.push((f.clone(), ov));
            }
        }
        hits.sort_by(|a, b| {
            a.0.start_1based()
                .cmp(&b.0.start_1based())
                .then(b.0.end_1based().cmp(&a.0.end_1based()))
        });

        results.push(PeakJoin { peak, overlaps: hits });
    }

    Ok(results)
}
