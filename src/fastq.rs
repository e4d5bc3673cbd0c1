//! FASTQ reader/writer.
//!
//! `@description`, one or more sequence lines, a `+` separator, then
//! quality line(s). `@` is a legal quality character, so a new record
//! cannot be recognized by a leading `@` alone — the reader instead
//! accumulates quality bytes until it has read at least as many as the
//! sequence, the same heuristic the format's other implementations use.
//! Length mismatches are a logged warning by default; enabling strict
//! mode (`config::set_fastq_strict`) promotes them to a hard error, per
//! §9's open question.

use crate::config::is_fastq_strict;
use crate::error::ReadError;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub struct FastqRecord {
    pub description: String,
    pub sequence: Vec<u8>,
    pub plus_line: String,
    pub quality: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FastqOutcome {
    Record(FastqRecord),
    Eof,
}

pub struct FastqReader<R: BufRead> {
    reader: R,
    line_number: u64,
    pending_description: Option<String>,
    line_buf: String,
}

impl<R: BufRead> FastqReader<R> {
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

    pub fn read(&mut self) -> Result<FastqOutcome, ReadError> {
        let description = match self.pending_description.take() {
            Some(d) => d,
            None => match self.next_line()? {
                None => return Ok(FastqOutcome::Eof),
                Some(line) if line.starts_with('@') => line,
                Some(_) => {
                    return Err(ReadError::BadData {
                        line: self.line_number,
                        message: "expected an '@'-prefixed description line".into(),
                    })
                }
            },
        };

        let mut sequence = Vec::new();
        let plus_line = loop {
            match self.next_line()? {
                None => {
                    return Err(ReadError::Truncated {
                        line: self.line_number,
                        expected: 4,
                        got: 2,
                    })
                }
                Some(line) if line.starts_with('+') => break line,
                Some(line) => sequence.extend_from_slice(line.as_bytes()),
            }
        };

        let mut quality = Vec::new();
        while quality.len() < sequence.len() {
            match self.next_line()? {
                None => break,
                Some(line) => quality.extend_from_slice(line.as_bytes()),
            }
        }

        // Peek at the next line to find the following description, since
        // a quality run can legally contain '@' bytes mid-line.
        if quality.len() >= sequence.len() {
            if let Some(next) = self.next_line()? {
                if next.starts_with('@') {
                    self.pending_description = Some(next);
                } else {
                    // Extra quality bytes belonging to this record.
                    quality.extend_from_slice(next.as_bytes());
                }
            }
        }

        if quality.len() != sequence.len() {
            let message = format!(
                "quality length {} does not match sequence length {}",
                quality.len(),
                sequence.len()
            );
            if is_fastq_strict() {
                return Err(ReadError::Mismatch {
                    line: self.line_number,
                    message,
                });
            }
            tracing::warn!(line = self.line_number, "{message}");
        }

        Ok(FastqOutcome::Record(FastqRecord {
            description,
            sequence,
            plus_line,
            quality,
        }))
    }
}

pub fn write_record<W: Write>(w: &mut W, r: &FastqRecord) -> std::io::Result<()> {
    writeln!(w, "{}", r.description)?;
    w.write_all(&r.sequence)?;
    writeln!(w)?;
    writeln!(w, "{}", r.plus_line)?;
    w.write_all(&r.quality)?;
    writeln!(w)
}
