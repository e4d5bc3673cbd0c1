//! Delimited-field tokenizer shared by every line-oriented format reader.
//!
//! Two variants, matching the two buffer-ownership models the format
//! readers need: [`FixedFieldReader`] reads into a caller-supplied bound
//! buffer (useful for small fixed-width fields like `strand`/`phase`),
//! and [`GrowableFieldReader`] owns a reusable, doubling `Vec<u8>` for
//! fields of unbounded length (sequence, quality, attributes). Both
//! report the delimiter that ended the field so callers can drive
//! higher-level grammars (TAB between fields, LF at end of line).

use std::io::{self, BufRead};

/// The delimiter that terminated a field read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Newline,
    Custom(u8),
    Eof,
}

/// Outcome of a field read that also reports whether any bytes were
/// consumed before hitting end-of-stream, so callers can distinguish
/// "clean EOF between records" from "EOF mid-field".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRead {
    pub delim: Delimiter,
    pub len: usize,
}

impl FieldRead {
    /// True when end-of-stream occurred with zero bytes consumed — i.e.
    /// at a field boundary, not inside a partially-read field.
    pub fn is_clean_eof(&self) -> bool {
        self.delim == Delimiter::Eof && self.len == 0
    }
}

fn is_delim(b: u8, active: &[u8]) -> Option<Delimiter> {
    if b == b'\n' {
        Some(Delimiter::Newline)
    } else if b == b'\t' && active.contains(&b'\t') {
        Some(Delimiter::Tab)
    } else if active.contains(&b) {
        Some(Delimiter::Custom(b))
    } else {
        None
    }
}

/// Reads a field into a caller-supplied, fixed-capacity buffer.
///
/// If the field's bytes exceed `buf`'s capacity, the remainder is still
/// consumed from the stream (so the reader stays aligned with the next
/// field) but is not stored; `FieldRead::len` reports the true field
/// length so the caller can detect truncation.
pub struct FixedFieldReader;

impl FixedFieldReader {
    /// Read up to `buf.capacity()` bytes of the next field delimited by
    /// any byte in `delimiters` (TAB and LF are always active).
    pub fn read_field<R: BufRead>(
        stream: &mut R,
        buf: &mut Vec<u8>,
        delimiters: &[u8],
    ) -> io::Result<FieldRead> {
        buf.clear();
        let cap = buf.capacity().max(1);
        let mut total = 0usize;
        loop {
            let available = match stream.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(FieldRead {
                    delim: Delimiter::Eof,
                    len: total,
                });
            }
            for (i, &b) in available.iter().enumerate() {
                if let Some(delim) = is_delim(b, delimiters) {
                    stream.consume(i + 1);
                    return Ok(FieldRead { delim, len: total });
                }
                if buf.len() < cap {
                    buf.push(b);
                }
                total += 1;
            }
            let n = available.len();
            stream.consume(n);
        }
    }

    pub fn skip_field<R: BufRead>(stream: &mut R, delimiters: &[u8]) -> io::Result<FieldRead> {
        let mut scratch = Vec::with_capacity(0);
        Self::read_field(stream, &mut scratch, delimiters)
    }
}

/// Reads a field into an owned, reusable, doubling `Vec<u8>`.
///
/// Buffer reuse is the point: callers pass the same `Vec<u8>` across many
/// records; `clear()` resets its length without releasing the
/// allocation, and growth only happens when an individual field exceeds
/// current capacity.
pub struct GrowableFieldReader;

impl GrowableFieldReader {
    pub fn read_field<R: BufRead>(
        stream: &mut R,
        buf: &mut Vec<u8>,
        delimiters: &[u8],
    ) -> io::Result<Delimiter> {
        buf.clear();
        loop {
            let available = match stream.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(Delimiter::Eof);
            }
            match available.iter().position(|&b| is_delim(b, delimiters).is_some()) {
                Some(pos) => {
                    let delim = is_delim(available[pos], delimiters).unwrap();
                    buf.extend_from_slice(&available[..pos]);
                    stream.consume(pos + 1);
                    return Ok(delim);
                }
                None => {
                    buf.extend_from_slice(available);
                    let n = available.len();
                    stream.consume(n);
                }
            }
        }
    }

    /// Advance past one field without storing it.
    pub fn skip_field<R: BufRead>(stream: &mut R, delimiters: &[u8]) -> io::Result<Delimiter> {
        loop {
            let available = match stream.fill_buf() {
                Ok(b) => b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(Delimiter::Eof);
            }
            match available.iter().position(|&b| is_delim(b, delimiters).is_some()) {
                Some(pos) => {
                    let delim = is_delim(available[pos], delimiters).unwrap();
                    stream.consume(pos + 1);
                    return Ok(delim);
                }
                None => {
                    let n = available.len();
                    stream.consume(n);
                }
            }
        }
    }

    /// Consume bytes through and including the next LF.
    pub fn skip_rest_of_line<R: BufRead>(stream: &mut R) -> io::Result<()> {
        let mut discard = String::new();
        stream.read_line(&mut discard)?;
        Ok(())
    }
}

pub const TSV_DELIMS: &[u8] = b"\t";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn growable_reads_tab_and_newline_delimited_fields() {
        let mut cur = Cursor::new(b"chr1\t100\t200\n".to_vec());
        let mut buf = Vec::new();
        assert_eq!(
            GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap(),
            Delimiter::Tab
        );
        assert_eq!(buf, b"chr1");
        assert_eq!(
            GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap(),
            Delimiter::Tab
        );
        assert_eq!(buf, b"100");
        assert_eq!(
            GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap(),
            Delimiter::Newline
        );
        assert_eq!(buf, b"200");
        assert_eq!(
            GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap(),
            Delimiter::Eof
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_fields_are_legal() {
        let mut cur = Cursor::new(b"a\t\tb\n".to_vec());
        let mut buf = Vec::new();
        GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert_eq!(buf, b"a");
        GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert!(buf.is_empty());
        GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert_eq!(buf, b"b");
    }

    #[test]
    fn clean_eof_vs_mid_field_eof() {
        let mut cur = Cursor::new(b"".to_vec());
        let mut buf = Vec::with_capacity(16);
        let r = FixedFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert!(r.is_clean_eof());

        let mut cur = Cursor::new(b"partial".to_vec());
        let mut buf = Vec::with_capacity(16);
        let r = FixedFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert_eq!(r.delim, Delimiter::Eof);
        assert!(!r.is_clean_eof());
        assert_eq!(r.len, 7);
    }

    #[test]
    fn fixed_reader_truncates_but_stays_aligned() {
        let mut cur = Cursor::new(b"abcdefgh\tnext\n".to_vec());
        let mut buf = Vec::with_capacity(4);
        let r = FixedFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert_eq!(r.delim, Delimiter::Tab);
        assert_eq!(r.len, 8);
        assert_eq!(buf.as_slice(), b"abcd");

        let mut buf2 = Vec::with_capacity(16);
        let r2 = FixedFieldReader::read_field(&mut cur, &mut buf2, TSV_DELIMS).unwrap();
        assert_eq!(r2.delim, Delimiter::Newline);
        assert_eq!(buf2.as_slice(), b"next");
    }

    #[test]
    fn skip_field_advances_without_storing() {
        let mut cur = Cursor::new(b"skip\tme\tplease\n".to_vec());
        GrowableFieldReader::skip_field(&mut cur, TSV_DELIMS).unwrap();
        let mut buf = Vec::new();
        GrowableFieldReader::read_field(&mut cur, &mut buf, TSV_DELIMS).unwrap();
        assert_eq!(buf, b"me");
    }

    #[test]
    fn custom_delimiter_set() {
        let mut cur = Cursor::new(b"a;b;c\n".to_vec());
        let mut buf = Vec::new();
        let delims = b";";
        assert_eq!(
            GrowableFieldReader::read_field(&mut cur, &mut buf, delims).unwrap(),
            Delimiter::Custom(b';')
        );
        assert_eq!(buf, b"a");
    }
}
