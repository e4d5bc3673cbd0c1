//! Stable error taxonomy shared across format readers, the pipeline, and
//! the CLI.
//!
//! Each subsystem gets its own `thiserror` enum so call sites can match on
//! the specific failure kind; [`ClassifierError`] is the umbrella type the
//! pipeline and CLI actually propagate, and it carries a sysexits code for
//! the process boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while reading a record from any line-oriented format.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: record truncated, expected {expected} fields, got {got}")]
    Truncated {
        line: u64,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: {message}")]
    BadData { line: u64, message: String },

    #[error("line {line}: field mismatch: {message}")]
    Mismatch { line: u64, message: String },

    #[error("line {line}: {extra} extra column(s) beyond the declared arity")]
    ExtraCols { line: u64, extra: usize },

    #[error("unrecognized format for input {path}")]
    UnknownFormat { path: PathBuf },
}

/// Errors surfaced while writing a record.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("write failure: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by range-checked setters on record fields (§9: the few
/// fields with domain constraints get a checked setter, nothing more).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("value {value} out of range for {field} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        expected: &'static str,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Errors raised by the GFF positional index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("failed to grow index storage")]
    MallocFailed,

    #[error("seek failed: {0}")]
    Seek(#[from] io::Error),
}

/// Errors raised by the alignment window.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error(
        "sort order violation: record ({chrom}, {pos}) precedes watermark ({last_chrom}, {last_pos})"
    )]
    SortViolation {
        chrom: String,
        pos: u64,
        last_chrom: String,
        last_pos: u64,
    },

    #[error("alignment window at hard cap ({cap}); add failed")]
    AddFailed { cap: usize },
}

/// Top-level error the CLI speaks in; every subsystem error converts into
/// this so `main` can map a single `Err` arm to a sysexits exit code.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("chromosome comparison failed: {0}")]
    ChromCompare(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("external tool {tool} failed with status {status}")]
    ExternalTool { tool: String, status: i32 },
}

/// Exit code table as named by the classifier's own exit-code contract
/// (§6/§7): `64` data error, `65` usage error, `69` resource error. This
/// intentionally does not reuse the `exitcode` crate's constants, whose
/// `sysexits.h` numbering assigns those same values to different names;
/// the classifier's exit codes follow its own table, not `sysexits.h`.
pub const EXIT_DATAERR: i32 = 64;
pub const EXIT_USAGE: i32 = 65;
pub const EXIT_UNAVAILABLE: i32 = 69;

impl ClassifierError {
    /// Map this error to the classifier's exit code table.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClassifierError::Read(ReadError::Truncated { .. })
            | ClassifierError::Read(ReadError::BadData { .. })
            | ClassifierError::Read(ReadError::Mismatch { .. })
            | ClassifierError::Read(ReadError::ExtraCols { .. })
            | ClassifierError::Read(ReadError::UnknownFormat { .. })
            | ClassifierError::Data(_)
            | ClassifierError::ChromCompare(_)
            | ClassifierError::Window(WindowError::SortViolation { .. }) => EXIT_DATAERR,

            ClassifierError::Index(_)
            | ClassifierError::Window(WindowError::AddFailed { .. })
            | ClassifierError::Read(ReadError::Io(_))
            | ClassifierError::Write(_)
            | ClassifierError::Io(_)
            | ClassifierError::ExternalTool { .. } => EXIT_UNAVAILABLE,
        }
    }
}
