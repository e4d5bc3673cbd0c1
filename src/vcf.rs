//! VCF call reader/writer.
//!
//! Meta (`##...`) lines and the `#CHROM...` header line are streamed to
//! a side buffer, the same pattern [`crate::bed::HeaderSidecar`] uses for
//! BED's header lines. Data lines carry the nine static columns plus
//! either a single sample column or (reserved, unused by the pipeline
//! per §9) a sample vector.

use crate::error::ReadError;
use crate::overlap::GenomicRecord;
use std::io::{BufRead, Write};

/// The sample-field surface. Only `Single` is consumed by the pipeline;
/// `Multi` exists because the data model reserves it, per §9's note
/// that `bl_vcf_read_ss_call` only ever handled single-sample VCF.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleField {
    Single(String),
    Multi(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VcfCall {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub reference: String,
    pub alt: String,
    pub qual: String,
    pub filter: String,
    pub info: String,
    pub format: Option<String>,
    pub sample: Option<SampleField>,
}

impl GenomicRecord for VcfCall {
    fn chrom(&self) -> &str {
        &self.chrom
    }
    fn start_1based(&self) -> u64 {
        self.pos
    }
    fn end_1based(&self) -> u64 {
        self.pos + self.reference.len().max(1) as u64 - 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VcfOutcome {
    Record(VcfCall),
    Eof,
}

/// Meta (`##`) lines plus the `#CHROM` header line, captured verbatim.
#[derive(Debug, Clone, Default)]
pub struct VcfHeader(pub Vec<u8>);

pub struct VcfReader<R: BufRead> {
    reader: R,
    line_number: u64,
    line_buf: String,
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line_buf: String::new(),
        }
    }

    /// Stream `##` meta lines and the `#CHROM` header line to a side
    /// buffer, leaving the reader positioned at the first data line.
    pub fn read_header(&mut self) -> std::io::Result<VcfHeader> {
        let mut captured = Vec::new();
        loop {
            let is_header_byte = match self.reader.fill_buf()? {
                b if b.is_empty() => false,
                b => b[0] == b'#',
            };
            if !is_header_byte {
                break;
            }
            self.line_buf.clear();
            let n = self.reader.read_line(&mut self.line_buf)?;
            if n == 0 {
                break;
            }
            self.line_number += 1;
            captured.extend_from_slice(self.line_buf.as_bytes());
        }
        Ok(VcfHeader(captured))
    }

    pub fn read(&mut self) -> Result<VcfOutcome, ReadError> {
        loop {
            self.line_buf.clear();
            let n = self.reader.read_line(&mut self.line_buf)?;
            if n == 0 {
                return Ok(VcfOutcome::Eof);
            }
            self.line_number += 1;
            let line = self.line_buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            return parse_line(line, self.line_number).map(VcfOutcome::Record);
        }
    }
}

fn parse_line(line: &str, line_number: u64) -> Result<VcfCall, ReadError> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < 8 {
        return Err(ReadError::Truncated {
            line: line_number,
            expected: 8,
            got: cols.len(),
        });
    }
    let pos: u64 = cols[1].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("pos {:?} is not an unsigned integer", cols[1]),
    })?;

    let format = cols.get(8).map(|s| s.to_string());
    let sample = match cols.get(9..) {
        Some([]) | None => None,
        Some([single]) => Some(SampleField::Single(single.to_string())),
        Some(many) => Some(SampleField::Multi(many.iter().map(|s| s.to_string()).collect())),
    };

    Ok(VcfCall {
        chrom: cols[0].to_string(),
        pos,
        id: cols[2].to_string(),
        reference: cols[3].to_string(),
        alt: cols[4].to_string(),
        qual: cols[5].to_string(),
        filter: cols[6].to_string(),
        info: cols[7].to_string(),
        format,
        sample,
    })
}

pub fn write_record<W: Write>(w: &mut W, c: &VcfCall) -> std::io::Result<()> {
    write!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        c.chrom, c.pos, c.id, c.reference, c.alt, c.qual, c.filter, c.info
    )?;
    if let Some(format) = &c.format {
        write!(w, "\t{format}")?;
    }
    match &c.sample {
        Some(SampleField::Single(s)) => write!(w, "\t{s}")?,
        Some(SampleField::Multi(samples)) => {
            for s in samples {
                write!(w, "\t{s}")?;
            }
        }
        None => {}
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_streamed_to_sidecar() {
        let content = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE1\nchr1\t100\t.\tA\tG\t30\tPASS\t.\tGT\t0/1\n";
        let mut r = VcfReader::new(Cursor::new(content.as_bytes()));
        let header = r.read_header().unwrap();
        assert!(header.0.starts_with(b"##fileformat"));
        match r.read().unwrap() {
            VcfOutcome::Record(c) => {
                assert_eq!(c.chrom, "chr1");
                assert_eq!(c.pos, 100);
                assert_eq!(c.sample, Some(SampleField::Single("0/1".to_string())));
            }
            other => panic!("expected Record, got {other:?}"),
        }
    }

    #[test]
    fn single_sample_round_trip() {
        let line = "chr1\t100\t.\tA\tG\t30\tPASS\t.\tGT\t0/1\n";
        let mut r = VcfReader::new(Cursor::new(line.as_bytes()));
        let call = match r.read().unwrap() {
            VcfOutcome::Record(c) => c,
            _ => panic!(),
        };
        let mut out = Vec::new();
        write_record(&mut out, &call).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), line);
    }

    #[test]
    fn no_sample_column_is_none() {
        let line = "chr1\t100\t.\tA\tG\t30\tPASS\t.\n";
        let mut r = VcfReader::new(Cursor::new(line.as_bytes()));
        let call = match r.read().unwrap() {
            VcfOutcome::Record(c) => c,
            _ => panic!(),
        };
        assert_eq!(call.sample, None);
    }
}
