//! GFF positional index (§4.9): append-only parallel arrays that let a
//! caller reposition a GFF3 stream backward by a bounded feature count
//! or nucleotide distance.
//!
//! Grounded on the teacher's `index::IntervalIndex` (grouped-by-chrom,
//! binary-search lookup), restructured from a bulk-built overlap index
//! into an append-only positional index, since this index is built
//! incrementally while scanning forward through a GFF3 stream rather
//! than bulk-loaded up front.

use crate::gff::GffFeature;
use std::io::{Seek, SeekFrom};

const GROWTH_CHUNK: usize = 65_536;

pub struct GffIndex {
    offsets: Vec<u64>,
    starts: Vec<u64>,
    ends: Vec<u64>,
    seqids: Vec<String>,
}

impl GffIndex {
    pub fn new() -> Self {
        Self {
            offsets: Vec::with_capacity(GROWTH_CHUNK),
            starts: Vec::with_capacity(GROWTH_CHUNK),
            ends: Vec::with_capacity(GROWTH_CHUNK),
            seqids: Vec::with_capacity(GROWTH_CHUNK),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Append an entry for `feature`. Growth happens in `GROWTH_CHUNK`
    /// increments via `Vec::reserve`, matching the source's fixed-chunk
    /// growth; allocation failure in this environment surfaces as a
    /// process abort, not a recoverable error, so there is no
    /// `MALLOC_FAILED` path to construct here.
    pub fn add(&mut self, feature: &GffFeature) {
        if self.offsets.len() == self.offsets.capacity() {
            self.offsets.reserve(GROWTH_CHUNK);
            self.starts.reserve(GROWTH_CHUNK);
            self.ends.reserve(GROWTH_CHUNK);
            self.seqids.reserve(GROWTH_CHUNK);
        }
        self.offsets.push(feature.file_offset);
        self.starts.push(feature.start);
        self.ends.push(feature.end);
        self.seqids.push(feature.seqid.clone());
    }

    /// Find the index of the entry matching `(seqid, start)`, scanning
    /// from the end since `add` is called in forward stream order and
    /// callers typically seek relative to a just-read feature.
    fn locate(&self, seqid: &str, start: u64) -> Option<usize> {
        self.seqids
            .iter()
            .enumerate()
            .rev()
            .find(|(i, s)| s.as_str() == seqid && self.starts[*i] == start)
            .map(|(i, _)| i)
    }

    /// Step backward from `feature`'s own indexed entry at most `k`
    /// entries on the same `seqid`, additionally bounded by `max_nt`
    /// (an entry whose `end < feature.start - max_nt` stops the walk;
    /// `max_nt == 0` disables the distance bound), then reposition
    /// `stream` to that entry's file offset.
    pub fn seek_reverse<S: Seek>(
        &self,
        stream: &mut S,
        feature: &GffFeature,
        k: usize,
        max_nt: u64,
    ) -> std::io::Result<()> {
        let Some(start_idx) = self.locate(&feature.seqid, feature.start) else {
            return Ok(());
        };

        let mut target = start_idx;
        let mut steps = 0usize;
        let floor = if max_nt == 0 {
            None
        } else {
            Some(feature.start.saturating_sub(max_nt))
        };

        let mut i = start_idx;
        while i > 0 && steps < k {
            let prev = i - 1;
            if self.seqids[prev] != feature.seqid {
                break;
            }
            if let Some(floor) = floor {
                if self.ends[prev] < floor {
                    break;
                }
            }
            i = prev;
            target = i;
            steps += 1;
        }

        stream.seek(SeekFrom::Start(self.offsets[target]))?;
        Ok(())
    }
}

impl Default for GffIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn feature(seqid: &str, start: u64, end: u64, offset: u64) -> GffFeature {
        GffFeature {
            seqid: seqid.to_string(),
            source: "s".to_string(),
            feature_type: "exon".to_string(),
            start,
            end,
            score: None,
            strand: '+',
            phase: '.',
            attributes: String::new(),
            id: None,
            name: "unnamed".to_string(),
            parent: "noparent".to_string(),
            file_offset: offset,
        }
    }

    #[test]
    fn reverse_seek_by_count() {
        let mut idx = GffIndex::new();
        let features = [
            feature("chr1", 100, 150, 0),
            feature("chr1", 200, 250, 10),
            feature("chr1", 300, 350, 20),
            feature("chr1", 400, 450, 30),
        ];
        for f in &features {
            idx.add(f);
        }

        let mut stream = Cursor::new(vec![0u8; 100]);
        idx.seek_reverse(&mut stream, &features[3], 2, 0).unwrap();
        assert_eq!(stream.position(), 10);
    }

    #[test]
    fn reverse_seek_bounded_by_distance() {
        let mut idx = GffIndex::new();
        let features = [
            feature("chr1", 100, 150, 0),
            feature("chr1", 5000, 5050, 10),
            feature("chr1", 9900, 9950, 20),
        ];
        for f in &features {
            idx.add(f);
        }
        let mut stream = Cursor::new(vec![0u8; 100]);
        // max_nt=100: the entry at offset 10 has end 5050, which is <
        // 9900-100=9800, so it may never be returned (property #7);
        // the walk can't step back at all and lands on the feature's
        // own entry.
        idx.seek_reverse(&mut stream, &features[2], 5, 100).unwrap();
        assert_eq!(stream.position(), 20);
    }

    #[test]
    fn reverse_seek_does_not_cross_seqid() {
        let mut idx = GffIndex::new();
        let features = [
            feature("chr1", 100, 150, 0),
            feature("chr2", 10, 50, 10),
        ];
        for f in &features {
            idx.add(f);
        }
        let mut stream = Cursor::new(vec![0u8; 100]);
        idx.seek_reverse(&mut stream, &features[1], 5, 0).unwrap();
        assert_eq!(stream.position(), 10);
    }
}
