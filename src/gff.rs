//! GFF3 feature reader/writer (§4.4).
//!
//! GFF3 is 1-based inclusive, 9 TAB-separated columns, with a
//! semicolon-delimited `key=value` attributes column. The reader is
//! built in the shape of [`crate::bed::BedReader`] (owned reusable line
//! buffer, line-number tracking, a matching error type) but against
//! GFF3's grammar: it extracts `ID`/`Name`/`Parent` from the attributes
//! column non-destructively (never mutating a shared buffer to scan it,
//! unlike the source this is built from — see DESIGN.md), and captures
//! each record's file offset *before* consuming its first field so the
//! positional index (`gff_index.rs`) can reseek to it.

use crate::error::ReadError;
use crate::overlap::GenomicRecord;
use std::io::{BufRead, Seek, SeekFrom, Write};

/// A GFF3 feature, or the `###` group-terminator sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct GffFeature {
    pub seqid: String,
    pub source: String,
    pub feature_type: String,
    pub start: u64,
    pub end: u64,
    pub score: Option<f64>,
    pub strand: char,
    pub phase: char,
    pub attributes: String,
    pub id: Option<String>,
    pub name: String,
    pub parent: String,
    pub file_offset: u64,
}

impl GffFeature {
    pub fn is_sentinel(&self) -> bool {
        self.feature_type == "###"
    }
}

impl GenomicRecord for GffFeature {
    fn chrom(&self) -> &str {
        &self.seqid
    }
    fn start_1based(&self) -> u64 {
        self.start
    }
    fn end_1based(&self) -> u64 {
        self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GffOutcome {
    Record(GffFeature),
    Eof,
}

pub struct GffReader<R: BufRead + Seek> {
    reader: R,
    line_number: u64,
    line_buf: String,
}

impl<R: BufRead + Seek> GffReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line_buf: String::new(),
        }
    }

    pub fn read(&mut self) -> Result<GffOutcome, ReadError> {
        loop {
            let offset = self.reader.stream_position()?;
            self.line_buf.clear();
            let n = self.reader.read_line(&mut self.line_buf)?;
            if n == 0 {
                return Ok(GffOutcome::Eof);
            }
            self.line_number += 1;
            let line = self.line_buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') && line != "###" {
                continue;
            }
            if line == "###" {
                return Ok(GffOutcome::Record(GffFeature {
                    seqid: String::new(),
                    source: String::new(),
                    feature_type: "###".to_string(),
                    start: 0,
                    end: 0,
                    score: None,
                    strand: '.',
                    phase: '.',
                    attributes: String::new(),
                    id: None,
                    name: String::new(),
                    parent: String::new(),
                    file_offset: offset,
                }));
            }
            return parse_line(line, self.line_number, offset).map(GffOutcome::Record);
        }
    }
}

fn parse_line(line: &str, line_number: u64, offset: u64) -> Result<GffFeature, ReadError> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < 9 {
        return Err(ReadError::Truncated {
            line: line_number,
            expected: 9,
            got: cols.len(),
        });
    }
    if cols.len() > 9 {
        return Err(ReadError::ExtraCols {
            line: line_number,
            extra: cols.len() - 9,
        });
    }

    let start: u64 = cols[3].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("start {:?} is not an unsigned integer", cols[3]),
    })?;
    let end: u64 = cols[4].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("end {:?} is not an unsigned integer", cols[4]),
    })?;
    if start > end {
        return Err(ReadError::Mismatch {
            line: line_number,
            message: format!("start {start} > end {end}"),
        });
    }
    let score = if cols[5] == "." {
        None
    } else {
        Some(cols[5].parse::<f64>().map_err(|_| ReadError::Mismatch {
            line: line_number,
            message: format!("score {:?} is neither a real number nor '.'", cols[5]),
        })?)
    };
    let strand = single_char(cols[6], line_number, "strand", &['+', '-', '.'])?;
    let phase = single_char(cols[7], line_number, "phase", &['.', '0', '1', '2'])?;
    if cols[0].is_empty() {
        return Err(ReadError::Mismatch {
            line: line_number,
            message: "seqid must be non-empty".into(),
        });
    }

    let attributes = cols[8].to_string();
    let (id, name, parent) = extract_attributes(&attributes);

    Ok(GffFeature {
        seqid: cols[0].to_string(),
        source: cols[1].to_string(),
        feature_type: cols[2].to_string(),
        start,
        end,
        score,
        strand,
        phase,
        attributes,
        id,
        name,
        parent,
        file_offset: offset,
    })
}

fn single_char(
    raw: &str,
    line_number: u64,
    field: &'static str,
    allowed: &[char],
) -> Result<char, ReadError> {
    let mut chars = raw.chars();
    let c = chars.next().ok_or_else(|| ReadError::Mismatch {
        line: line_number,
        message: format!("{field} is empty"),
    })?;
    if chars.next().is_some() || !allowed.contains(&c) {
        return Err(ReadError::Mismatch {
            line: line_number,
            message: format!("{field} {raw:?} is not one of {allowed:?}"),
        });
    }
    Ok(c)
}

/// Extract `ID`, `Name`, `Parent` from a `key=value;key=value` column
/// without mutating the input. `Name` defaults to `"unnamed"`, `Parent`
/// to `"noparent"`; `ID` is absent (`None`) when not present.
fn extract_attributes(attrs: &str) -> (Option<String>, String, String) {
    let mut id = None;
    let mut name = "unnamed".to_string();
    let mut parent = "noparent".to_string();

    for pair in attrs.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        if let Some((key, value)) = pair.split_once('=') {
            match key.trim() {
                "ID" => id = Some(value.trim().to_string()),
                "Name" => name = value.trim().to_string(),
                "Parent" => parent = value.trim().to_string(),
                _ => {}
            }
        }
    }
    (id, name, parent)
}

/// Write a GFF3 feature as 9 TAB-separated columns.
pub fn write_feature<W: Write>(w: &mut W, f: &GffFeature) -> std::io::Result<()> {
    if f.is_sentinel() {
        return writeln!(w, "###");
    }
    let score = f
        .score
        .map(|s| s.to_string())
        .unwrap_or_else(|| ".".to_string());
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        f.seqid, f.source, f.feature_type, f.start, f.end, score, f.strand, f.phase, f.attributes
    )
}
