//! BED feature reader/writer (§4.3).
//!
//! BED is 0-based half-open, 3 to 12 TAB-separated columns. The reader
//! enforces the per-field invariants named by the format (score range,
//! strand alphabet, thick/block co-occurrence) and reports exactly the
//! outcomes the format calls for: a clean record, end of stream, a
//! short record, an invalid one, or one with columns beyond the 12th.
//! Header lines (`browser`, `track`, `#`) are captured to a
//! [`HeaderSidecar`] instead of being discarded, so a caller can replay
//! them verbatim on the way back out.

use crate::config::normalize_end;
use crate::error::ReadError;
use crate::overlap::GenomicRecord;
use std::fmt;
use std::io::{BufRead, Write};

/// Strand orientation, shared by any format that carries one (BED column
/// 6, GFF3 column 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}

/// A BED record with 3..12 populated columns. `fields` records exactly
/// how many columns were present on input so the writer reproduces that
/// arity (§9: `fields` is one of the few range-checked attributes).
#[derive(Debug, Clone, PartialEq)]
pub struct BedFeature {
    pub chrom: String,
    pub chrom_start: u64,
    pub chrom_end: u64,
    pub name: Option<String>,
    pub score: Option<u32>,
    pub strand: Option<Strand>,
    pub thick_start: Option<u64>,
    pub thick_end: Option<u64>,
    pub item_rgb: Option<String>,
    pub block_count: Option<u32>,
    pub block_sizes: Option<Vec<u64>>,
    pub block_starts: Option<Vec<u64>>,
    pub extra_cols: Vec<String>,
    pub fields: u8,
}

impl BedFeature {
    pub fn new3(chrom: impl Into<String>, chrom_start: u64, chrom_end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            chrom_start,
            chrom_end,
            name: None,
            score: None,
            strand: None,
            thick_start: None,
            thick_end: None,
            item_rgb: None,
            block_count: None,
            block_sizes: None,
            block_starts: None,
            extra_cols: Vec::new(),
            fields: 3,
        }
    }

    /// Set `score`, range-checked per the format's `0..=1000` invariant.
    pub fn set_score(&mut self, score: u32) -> Result<(), crate::error::DataError> {
        if score > 1000 {
            return Err(crate::error::DataError::OutOfRange {
                field: "score",
                value: score as i64,
                expected: "0..=1000",
            });
        }
        self.score = Some(score);
        Ok(())
    }
}

impl GenomicRecord for BedFeature {
    fn chrom(&self) -> &str {
        &self.chrom
    }
    fn start_1based(&self) -> u64 {
        self.chrom_start + 1
    }
    fn end_1based(&self) -> u64 {
        self.chrom_end
    }
}

/// Captured header bytes (`browser`/`track`/`#` lines), replayable
/// verbatim on a writer.
#[derive(Debug, Clone, Default)]
pub struct HeaderSidecar(pub Vec<u8>);

impl HeaderSidecar {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn replay<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.0)
    }
}

fn is_header_line(line: &[u8]) -> bool {
    line.starts_with(b"#") || line.starts_with(b"track") || line.starts_with(b"browser")
}

/// Successful outcomes of a BED read: a record, end of stream, or a
/// record that had columns beyond the 12th (still returned, flagged).
#[derive(Debug, Clone, PartialEq)]
pub enum BedOutcome {
    Record(BedFeature),
    Eof,
    ExtraCols(BedFeature, usize),
}

pub struct BedReader<R: BufRead> {
    reader: R,
    line_number: u64,
    line_buf: String,
}

impl<R: BufRead> BedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            line_buf: String::new(),
        }
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Consume consecutive header lines (`browser`, `track`, `#`),
    /// capturing them verbatim. Calling this again once the stream is
    /// positioned at a data line returns an empty sidecar (testable
    /// property #2: idempotence of header skip).
    pub fn skip_header(&mut self) -> std::io::Result<HeaderSidecar> {
        let mut captured = Vec::new();
        loop {
            let is_header = match self.reader.fill_buf() {
                Ok(buf) => {
                    if buf.is_empty() {
                        false
                    } else {
                        is_header_line(buf)
                    }
                }
                Err(e) => return Err(e),
            };
            if !is_header {
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
        Ok(HeaderSidecar(captured))
    }

    /// Read the next record.
    pub fn read(&mut self) -> Result<BedOutcome, ReadError> {
        loop {
            self.line_buf.clear();
            let n = self.reader.read_line(&mut self.line_buf)?;
            if n == 0 {
                return Ok(BedOutcome::Eof);
            }
            self.line_number += 1;
            let line = self.line_buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() || is_header_line(line.as_bytes()) {
                continue;
            }
            return parse_line(line, self.line_number);
        }
    }
}

fn parse_line(line: &str, line_number: u64) -> Result<BedOutcome, ReadError> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < 3 {
        return Err(ReadError::Truncated {
            line: line_number,
            expected: 3,
            got: cols.len(),
        });
    }

    let chrom = cols[0].to_string();
    let chrom_start: u64 = cols[1].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("chrom_start {:?} is not an unsigned integer", cols[1]),
    })?;
    let chrom_end_raw: u64 = cols[2].parse().map_err(|_| ReadError::Mismatch {
        line: line_number,
        message: format!("chrom_end {:?} is not an unsigned integer", cols[2]),
    })?;
    if chrom_start > chrom_end_raw {
        return Err(ReadError::Mismatch {
            line: line_number,
            message: format!("chrom_start {chrom_start} > chrom_end {chrom_end_raw}"),
        });
    }
    let chrom_end = normalize_end(chrom_start, chrom_end_raw);

    let mut feature = BedFeature::new3(chrom, chrom_start, chrom_end);
    let declared = cols.len().min(12);
    feature.fields = declared as u8;

    if cols.len() >= 4 && !cols[3].is_empty() {
        feature.name = Some(cols[3].to_string());
    }
    if cols.len() >= 5 && !cols[4].is_empty() {
        let score: u32 = cols[4].parse().map_err(|_| ReadError::Mismatch {
            line: line_number,
            message: format!("score {:?} is not an unsigned integer", cols[4]),
        })?;
        if score > 1000 {
            return Err(ReadError::Mismatch {
                line: line_number,
                message: format!("score {score} exceeds the 0..=1000 range"),
            });
        }
        feature.score = Some(score);
    }
    if cols.len() >= 6 && !cols[5].is_empty() {
        match cols[5] {
            "+" => feature.strand = Some(Strand::Plus),
            "-" => feature.strand = Some(Strand::Minus),
            "." => feature.strand = Some(Strand::Unknown),
            other => {
                return Err(ReadError::Mismatch {
                    line: line_number,
                    message: format!("strand {other:?} is not one of +, -, ."),
                })
            }
        }
    }
    if cols.len() >= 8 {
        let ts_raw = cols[6];
        let te_raw = cols[7];
        match (ts_raw.is_empty(), te_raw.is_empty()) {
            (true, true) => {}
            (false, false) => {
                let ts: u64 = ts_raw.parse().map_err(|_| ReadError::Mismatch {
                    line: line_number,
                    message: "thick_start is not an unsigned integer".into(),
                })?;
                let te: u64 = te_raw.parse().map_err(|_| ReadError::Mismatch {
                    line: line_number,
                    message: "thick_end is not an unsigned integer".into(),
                })?;
                feature.thick_start = Some(ts);
                feature.thick_end = Some(te);
            }
            _ => {
                return Err(ReadError::Mismatch {
                    line: line_number,
                    message: "thick_start and thick_end must occur together".into(),
                })
            }
        }
    }
    if cols.len() >= 9 && !cols[8].is_empty() {
        feature.item_rgb = Some(cols[8].to_string());
    }
    if cols.len() >= 12 {
        let bc_raw = cols[9];
        let sizes_raw = cols[10];
        let starts_raw = cols[11];
        if !bc_raw.is_empty() || !sizes_raw.is_empty() || !starts_raw.is_empty() {
            let block_count: u32 = bc_raw.parse().map_err(|_| ReadError::Mismatch {
                line: line_number,
                message: "block_count is not an unsigned integer".into(),
            })?;
            let sizes = parse_u64_list(sizes_raw, line_number, "block_sizes")?;
            let starts = parse_u64_list(starts_raw, line_number, "block_starts")?;
            if sizes.len() != block_count as usize || starts.len() != block_count as usize {
                return Err(ReadError::Mismatch {
                    line: line_number,
                    message: format!(
                        "block_count {block_count} does not match block_sizes ({}) / block_starts ({})",
                        sizes.len(),
                        starts.len()
                    ),
                });
            }
            feature.block_count = Some(block_count);
            feature.block_sizes = Some(sizes);
            feature.block_starts = Some(starts);
        }
    }

    if cols.len() > 12 {
        let extra = cols.len() - 12;
        feature.extra_cols = cols[12..].iter().map(|s| s.to_string()).collect();
        return Ok(BedOutcome::ExtraCols(feature, extra));
    }

    Ok(BedOutcome::Record(feature))
}

fn parse_u64_list(raw: &str, line_number: u64, field: &'static str) -> Result<Vec<u64>, ReadError> {
    raw.trim_end_matches(',')
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|_| ReadError::Mismatch {
                line: line_number,
                message: format!("{field} contains a non-numeric entry {s:?}"),
            })
        })
        .collect()
}

/// Write a feature's declared `fields` columns, TAB-separated,
/// LF-terminated.
pub fn write_feature<W: Write>(w: &mut W, f: &BedFeature) -> std::io::Result<()> {
    write!(w, "{}\t{}\t{}", f.chrom, f.chrom_start, f.chrom_end)?;
    if f.fields >= 4 {
        write!(w, "\t{}", f.name.as_deref().unwrap_or(""))?;
    }
    if f.fields >= 5 {
        write!(w, "\t{}", f.score.map(|s| s.to_string()).unwrap_or_default())?;
    }
    if f.fields >= 6 {
        let s = match f.strand {
            Some(Strand::Plus) => "+",
            Some(Strand::Minus) => "-",
            Some(Strand::Unknown) | None => ".",
        };
        write!(w, "\t{s}")?;
    }
    if f.fields >= 8 {
        write!(
            w,
            "\t{}\t{}",
            f.thick_start.map(|v| v.to_string()).unwrap_or_default(),
            f.thick_end.map(|v| v.to_string()).unwrap_or_default()
        )?;
    }
    if f.fields >= 9 {
        write!(w, "\t{}", f.item_rgb.as_deref().unwrap_or(""))?;
    }
    if f.fields >= 12 {
        write!(
            w,
            "\t{}\t{}\t{}",
            f.block_count.map(|v| v.to_string()).unwrap_or_default(),
            join_u64(f.block_sizes.as_deref()),
            join_u64(f.block_starts.as_deref())
        )?;
    }
    for extra in &f.extra_cols {
        write!(w, "\t{extra}")?;
    }
    writeln!(w)
}

fn join_u64(values: Option<&[u64]>) -> String {
    values
        .map(|vs| {
            vs.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}
