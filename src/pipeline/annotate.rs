//! Stage C: turn Stage B's joined rows into classification tokens, one
//! row per peak-feature match plus an intergenic fallback for peaks
//! with no match at all.
//!
//! The nearest-gene search for the fallback is grounded on
//! `commands/closest.rs`'s `find_closest`: genes are sorted by start
//! (already true, since Stage A appends them in GFF3 stream order) and
//! searched with `partition_point`, the same binary-search shape
//! `find_closest` uses over its sorted `b_intervals`, generalized here
//! to search per-chromosome rather than over one global sorted list.

use crate::bed::BedFeature;
use crate::chrom::chrom_cmp;
use crate::pipeline::join::PeakJoin;
use crate::pipeline::synth::GeneSummary;

/// One classified row: a peak paired with a classification token, the
/// gene it's attributed to (or `"none"`), and, for an intergenic call,
/// the distance to the nearest gene.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow {
    pub peak: BedFeature,
    pub classification: String,
    pub gene_name: String,
    pub distance: Option<u64>,
}

/// Annotate every peak join. Peaks with at least one overlap get one
/// row per overlap, in the tie-broken order Stage B already produced.
/// Peaks with none get a single `intergenic` row if a gene lies within
/// `max_intergenic_distance`, else a single `none` row.
pub fn annotate(joins: Vec<PeakJoin>, genes: &[GeneSummary], max_intergenic_distance: u64) -> Vec<AnnotatedRow> {
    let mut rows = Vec::new();
    for join in joins {
        if join.overlaps.is_empty() {
            rows.push(intergenic_fallback(join.peak, genes, max_intergenic_distance));
        } else {
            for (feature, _overlap) in join.overlaps {
                rows.push(AnnotatedRow {
                    classification: feature.feature_type.clone(),
                    gene_name: feature.gene_name.clone(),
                    distance: None,
                    peak: join.peak.clone(),
                });
            }
        }
    }
    rows
}

fn intergenic_fallback(peak: BedFeature, genes: &[GeneSummary], max_distance: u64) -> AnnotatedRow {
    match nearest_gene(&peak, genes) {
        Some((gene, distance)) if distance <= max_distance => AnnotatedRow {
            classification: "intergenic".to_string(),
            gene_name: gene.name.clone(),
            distance: Some(distance),
            peak,
        },
        _ => AnnotatedRow {
            classification: "none".to_string(),
            gene_name: "none".to_string(),
            distance: None,
            peak,
        },
    }
}

/// Distance from `peak` (0-based half-open) to `gene` (1-based
/// inclusive) along one dimension, `0` if they already overlap.
fn edge_distance(peak: &BedFeature, gene: &GeneSummary) -> u64 {
    if peak.chrom_end < gene.start {
        gene.start - peak.chrom_end
    } else if peak.chrom_start >= gene.end {
        peak.chrom_start - gene.end
    } else {
        0
    }
}

/// Find the gene on `peak`'s chromosome with the smallest edge
/// distance, searching only the genes immediately bracketing `peak`'s
/// start (found via `partition_point` over the chromosome's slice,
/// since Stage A's gene list is already sorted by start within each
/// chromosome) plus a short linear scan outward, mirroring
/// `find_closest`'s binary-search-then-probe-neighbors shape.
fn nearest_gene<'a>(peak: &BedFeature, genes: &'a [GeneSummary]) -> Option<(&'a GeneSummary, u64)> {
    let same_chrom: Vec<&GeneSummary> = genes
        .iter()
        .filter(|g| chrom_cmp(&g.chrom, &peak.chrom) == Ok(std::cmp::Ordering::Equal))
        .collect();
    if same_chrom.is_empty() {
        return None;
    }

    let idx = same_chrom.partition_point(|g| g.start <= peak.chrom_start);

    let mut best: Option<(&GeneSummary, u64)> = None;
    let mut consider = |g: &'a GeneSummary, best: &mut Option<(&'a GeneSummary, u64)>| {
        let d = edge_distance(peak, g);
        if best.map(|(_, bd)| d < bd).unwrap_or(true) {
            *best = Some((g, d));
        }
    };

    if idx > 0 {
        consider(same_chrom[idx - 1], &mut best);
    }
    if idx < same_chrom.len() {
        consider(same_chrom[idx], &mut best);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::Overlap;
    use crate::pipeline::synth::AugmentedRecord;

    fn peak(chrom: &str, start: u64, end: u64) -> BedFeature {
        BedFeature::new3(chrom, start, end)
    }

    fn gene(chrom: &str, start: u64, end: u64, name: &str) -> GeneSummary {
        GeneSummary {
            chrom: chrom.to_string(),
            start,
            end,
            name: name.to_string(),
        }
    }

    fn dummy_overlap() -> Overlap {
        Overlap {
            len_a: 1,
            len_b: 1,
            overlap_start: 1,
            overlap_end: 1,
            overlap_len: 1,
        }
    }

    #[test]
    fn matched_peak_yields_one_row_per_overlap() {
        let feature = AugmentedRecord {
            chrom: "chr1".to_string(),
            start: 100,
            end: 200,
            feature_type: "exon".to_string(),
            gene_name: "GENE1".to_string(),
            gene_id: Some("g1".to_string()),
        };
        let join = PeakJoin {
            peak: peak("chr1", 100, 200),
            overlaps: vec![(feature, dummy_overlap())],
        };
        let rows = annotate(vec![join], &[], 1000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].classification, "exon");
        assert_eq!(rows[0].distance, None);
    }

    #[test]
    fn unmatched_peak_within_distance_is_intergenic() {
        let join = PeakJoin {
            peak: peak("chr1", 5000, 5100),
            overlaps: vec![],
        };
        let genes = vec![gene("chr1", 20000, 21000, "NEARGENE")];
        let rows = annotate(vec![join], &genes, 20000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].classification, "intergenic");
        assert_eq!(rows[0].gene_name, "NEARGENE");
        assert_eq!(rows[0].distance, Some(14900));
    }

    #[test]
    fn unmatched_peak_beyond_distance_is_none() {
        let join = PeakJoin {
            peak: peak("chr1", 5000, 5100),
            overlaps: vec![],
        };
        let genes = vec![gene("chr1", 20001, 21000, "FARGENE")];
        let rows = annotate(vec![join], &genes, 100);
        assert_eq!(rows[0].classification, "none");
        assert_eq!(rows[0].gene_name, "none");
    }

    #[test]
    fn nearest_gene_picks_closer_of_two_bracketing_genes() {
        let peak = peak("chr1", 1000, 1010);
        let genes = vec![
            gene("chr1", 1, 500, "UPSTREAM_GENE"),
            gene("chr1", 2000, 2500, "DOWNSTREAM_GENE"),
        ];
        let (nearest, dist) = nearest_gene(&peak, &genes).unwrap();
        assert_eq!(nearest.name, "UPSTREAM_GENE");
        assert_eq!(dist, 500);
    }

    #[test]
    fn different_chromosome_genes_are_ignored() {
        let peak = peak("chr2", 1000, 1010);
        let genes = vec![gene("chr1", 1, 500, "WRONG_CHROM")];
        assert!(nearest_gene(&peak, &genes).is_none());
    }
}
