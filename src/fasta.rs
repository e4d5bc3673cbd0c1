//! FASTA reader/writer.
//!
//! A description line (`>...`), followed by a sequence spanning one or
//! more lines, terminated by the next `>` or end-of-stream. The sequence
//! buffer is owned and reused across records (doubling on growth, per
//! §9's buffer-reuse contract) rather than allocated fresh per record.

use crate::error::ReadError;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct FastaRecord {
    pub description: String,
    pub sequence: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FastaOutcome {
    Record(FastaRecord),
    Eof,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    line_number: u64,
    pending_description: Option<String>,
    line_buf: String,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            pending_description: None,
            line_buf: String::new(),
        }
    }

    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.line_buf.clear();
        let n = self.reader.read_line(&mut self.line_buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(
            self.line_buf.trim_end_matches(['\n', '\r']).to_string(),
        ))
    }

    pub fn read(&mut self) -> Result<FastaOutcome, ReadError> {
        let description = match self.pending_description.take() {
            Some(d) => d,
            None => loop {
                match self.next_line()? {
                    None => return Ok(FastaOutcome::Eof),
                    Some(line) if line.is_empty() => continue,
                    Some(line) if line.starts_with('>') => break line,
                    Some(_) => {
                        return Err(ReadError::BadData {
                            line: self.line_number,
                            message: "expected a '>'-prefixed description line".into(),
                        })
                    }
                }
            },
        };

        let mut sequence = Vec::new();
        loop {
            match self.next_line()? {
                None => break,
                Some(line) if line.starts_with('>') => {
                    self.pending_description = Some(line);
                    break;
                }
                Some(line) => sequence.extend_from_slice(line.as_bytes()),
            }
        }

        Ok(FastaOutcome::Record(FastaRecord {
            description,
            sequence,
        }))
    }
}

/// Sequence line-wrap policy for the writer.
#[derive(Debug, Clone, Copy)]
pub enum WrapWidth {
    Fixed(usize),
    Unlimited,
}

pub fn write_record<W: Write>(w: &mut W, r: &FastaRecord, wrap: WrapWidth) -> std::io::Result<()> {
    writeln!(w, "{}", r.description)?;
    match wrap {
        WrapWidth::Unlimited => {
            w.write_all(&r.sequence)?;
            writeln!(w)?;
        }
        WrapWidth::Fixed(width) => {
            let width = width.max(1);
            for chunk in r.sequence.chunks(width) {
                w.write_all(chunk)?;
                writeln!(w)?;
            }
        }
    }
    Ok(())
}
