//! SAM alignment reader/writer.
//!
//! 11 required TAB-separated fields; POS is 1-based. A 12th+ tag column,
//! if present, is discarded per §6 rather than parsed into typed tags
//! (tag parsing is out of this spec's scope). Field splitting uses
//! `memchr`, matching the zero-allocation style of
//! `commands/streaming_window.rs`'s raw-byte record parsing in the
//! teacher crate.

use crate::error::ReadError;
use crate::overlap::GenomicRecord;
use memchr::memchr;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct SamAlignment {
    pub qname: String,
    pub flag: u16,
    pub rname: String,
    pub pos: u64,
    pub mapq: u8,
    pub cigar: String,
    pub rnext: String,
    pub pnext: u64,
    pub tlen: i64,
    pub seq: String,
    pub qual: String,
}

impl SamAlignment {
    pub fn is_unmapped(&self) -> bool {
        self.flag & 0x4 != 0
    }

    /// `end = pos + seq_len - 1` per §4.6.
    pub fn end(&self) -> u64 {
        if self.seq == "*" || self.seq.is_empty() {
            self.pos
        } else {
            self.pos + self.seq.len() as u64 - 1
        }
    }
}

impl GenomicRecord for SamAlignment {
    fn chrom(&self) -> &str {
        &self.rname
    }
    fn start_1based(&self) -> u64 {
        self.pos
    }
    fn end_1based(&self) -> u64 {
        self.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SamOutcome {
    Record(SamAlignment),
    Eof,
}

pub struct SamReader<R: BufRead> {
    reader: R,
    line_number: u64,
    line_buf: String,
}

impl<R: BufRead> SamReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line_buf: String::new(),
        }
    }

    pub fn read(&mut self) -> Result<SamOutcome, ReadError> {
        loop {
            self.line_buf.clear();
            let n = self.reader.read_line(&mut self.line_buf)?;
            if n == 0 {
                return Ok(SamOutcome::Eof);
            }
            self.line_number += 1;
            let line = self.line_buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('@') {
                continue;
            }
            return parse_line(line, self.line_number).map(SamOutcome::Record);
        }
    }
}

fn parse_line(line: &str, line_number: u64) -> Result<SamAlignment, ReadError> {
    let bytes = line.as_bytes();
    let mut fields: Vec<&str> = Vec::with_capacity(12);
    let mut rest = bytes;
    loop {
        match memchr(b'\t', rest) {
            Some(pos) => {
                fields.push(std::str::from_utf8(&rest[..pos]).unwrap());
                rest = &rest[pos + 1..];
            }
            None => {
                fields.push(std::str::from_utf8(rest).unwrap());
                break;
            }
        }
        if fields.len() == 11 {
            // Everything remaining (the 12th tag column onward) is
            // discarded per §6; stop splitting.
            break;
        }
    }

    if fields.len() < 11 {
        return Err(ReadError::Truncated {
            line: line_number,
            expected: 11,
            got: fields.len(),
        });
    }

    let flag: u16 = fields[1].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("flag {:?} is not a u16", fields[1]),
    })?;
    let pos: u64 = fields[3].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("pos {:?} is not an unsigned integer", fields[3]),
    })?;
    let mapq: u8 = fields[4].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("mapq {:?} is not a u8", fields[4]),
    })?;
    let pnext: u64 = fields[7].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("pnext {:?} is not an unsigned integer", fields[7]),
    })?;
    let tlen: i64 = fields[8].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("tlen {:?} is not an integer", fields[8]),
    })?;

    Ok(SamAlignment {
        qname: fields[0].to_string(),
        flag,
        rname: fields[2].to_string(),
        pos,
        mapq,
        cigar: fields[5].to_string(),
        rnext: fields[6].to_string(),
        pnext,
        tlen,
        seq: fields[9].to_string(),
        qual: fields[10].to_string(),
    })
}

/// Write the 11 required SAM columns (no tag column is emitted, since
/// none is retained on read).
pub fn write_record<W: Write>(w: &mut W, a: &SamAlignment) -> std::io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        a.qname, a.flag, a.rname, a.pos, a.mapq, a.cigar, a.rnext, a.pnext, a.tlen, a.seq, a.qual
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_line() -> String {
        "r1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\n".to_string()
    }

    #[test]
    fn parses_required_fields_and_computes_end() {
        let mut r = SamReader::new(Cursor::new(sample_line().into_bytes()));
        let aln = match r.read().unwrap() {
            SamOutcome::Record(a) => a,
            _ => panic!(),
        };
        assert_eq!(aln.pos, 100);
        assert_eq!(aln.end(), 103);
        assert!(!aln.is_unmapped());
    }

    #[test]
    fn tag_column_is_discarded() {
        let line = "r1\t0\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tIIII\tNM:i:0\tMD:Z:4\n";
        let mut r = SamReader::new(Cursor::new(line.as_bytes().to_vec()));
        let aln = match r.read().unwrap() {
            SamOutcome::Record(a) => a,
            _ => panic!(),
        };
        assert_eq!(aln.qual, "IIII");
    }

    #[test]
    fn header_lines_are_skipped() {
        let content = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n".to_string() + &sample_line();
        let mut r = SamReader::new(Cursor::new(content.into_bytes()));
        match r.read().unwrap() {
            SamOutcome::Record(a) => assert_eq!(a.qname, "r1"),
            _ => panic!(),
        }
    }

    #[test]
    fn unmapped_flag_detected() {
        let line = "r1\t4\tchr1\t100\t0\t*\t*\t0\t0\t*\t*\n";
        let mut r = SamReader::new(Cursor::new(line.as_bytes().to_vec()));
        match r.read().unwrap() {
            SamOutcome::Record(a) => assert!(a.is_unmapped()),
            _ => panic!(),
        }
    }

    #[test]
    fn truncated_record() {
        let line = "r1\t0\tchr1\t100\n";
        let mut r = SamReader::new(Cursor::new(line.as_bytes().to_vec()));
        let err = r.read().unwrap_err();
        assert!(matches!(err, ReadError::Truncated { .. }));
    }
}
