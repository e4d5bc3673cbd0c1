//! Stream-open contract (§6): dispatch on file extension to either an
//! in-process decompressor or an external-process pipe, with a matching
//! close for whichever path was taken.
//!
//! `.gz` is handled in-process via `flate2` (grounded on
//! `examples/other_examples/.../FrankieNButtons-Nodealigner`'s
//! `flate2::read::MultiGzDecoder` usage). `.bz2`/`.xz` and `.bam`/`.cram`
//! have no in-process precedent anywhere in the corpus, so per spec §9's
//! explicit allowance they shell out to the named external binary via
//! `std::process::{Command, Stdio}`, piping its stdout/stdin and passing
//! its stderr through. A non-empty `viewer_extra_args` forces the
//! SAM-like viewer path even for a plain `.sam` input, per §6.

use crate::error::ClassifierError;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// A readable stream opened per the extension dispatch table.
///
/// Carries the child process, if any, so [`ReadHandle::finish`] can wait
/// on it and report a non-zero exit as fatal, matching §5's "the parent
/// blocks on its exit status and treats non-zero as fatal" for
/// collaborator processes.
pub struct ReadHandle {
    inner: Box<dyn BufRead + Send>,
    child: Option<Child>,
}

impl ReadHandle {
    fn plain(inner: Box<dyn BufRead + Send>) -> Self {
        Self { inner, child: None }
    }

    fn piped(inner: Box<dyn BufRead + Send>, child: Child) -> Self {
        Self {
            inner,
            child: Some(child),
        }
    }

    /// Wait on the underlying child process, if any. A non-zero exit is
    /// reported as a fatal `ExternalTool` error rather than silently
    /// absorbed.
    pub fn finish(mut self, tool: &str) -> Result<(), ClassifierError> {
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(ClassifierError::ExternalTool {
                    tool: tool.to_string(),
                    status: status.code().unwrap_or(-1),
                });
            }
        }
        Ok(())
    }
}

impl Read for ReadHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for ReadHandle {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(OsStr::to_str).unwrap_or("")
}

/// Open `path` for reading per the stream-open contract. `viewer`
/// names the external SAM-like viewer binary used for `.bam`/`.cram`
/// (and for any extension when `viewer_extra_args` is non-empty, which
/// forces the viewer even for `.sam`). `"-"` reads from stdin, bypassing
/// extension dispatch entirely.
pub fn open_read(
    path: &Path,
    viewer: Option<&Path>,
    viewer_extra_args: &str,
) -> Result<ReadHandle, ClassifierError> {
    if path.as_os_str() == "-" {
        return Ok(ReadHandle::plain(Box::new(BufReader::new(io::stdin()))));
    }

    let ext = extension_of(path);
    let forced_viewer = !viewer_extra_args.is_empty();

    if ext == "bam" || ext == "cram" || (forced_viewer && ext == "sam") {
        let viewer = viewer.ok_or_else(|| {
            ClassifierError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no SAM-like viewer configured for {path:?}"),
            ))
        })?;
        let mut cmd = Command::new(viewer);
        cmd.arg("--with-header");
        if forced_viewer {
            cmd.args(viewer_extra_args.split_whitespace());
        }
        cmd.arg(path);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());
        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().expect("stdout was piped");
        return Ok(ReadHandle::piped(Box::new(BufReader::new(stdout)), child));
    }

    match ext {
        "gz" => {
            let file = File::open(path)?;
            Ok(ReadHandle::plain(Box::new(BufReader::new(
                MultiGzDecoder::new(file),
            ))))
        }
        "bz2" => spawn_decompressor("bzip2", &["-dc"], path),
        "xz" => spawn_decompressor("xz", &["-dc"], path),
        _ => {
            let file = File::open(path)?;
            Ok(ReadHandle::plain(Box::new(BufReader::new(file))))
        }
    }
}

fn spawn_decompressor(bin: &str, args: &[&str], path: &Path) -> Result<ReadHandle, ClassifierError> {
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().expect("stdout was piped");
    Ok(ReadHandle::piped(Box::new(BufReader::new(stdout)), child))
}

/// A writable stream opened per the stream-open contract's write mode.
pub struct WriteHandle {
    inner: Option<Box<dyn Write + Send>>,
    child: Option<Child>,
}

impl WriteHandle {
    fn plain(inner: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Some(inner),
            child: None,
        }
    }

    fn piped(inner: Box<dyn Write + Send>, child: Child) -> Self {
        Self {
            inner: Some(inner),
            child: Some(child),
        }
    }

    /// Flush and drop the inner writer (closing a pipe's stdin, if any),
    /// then wait on the child process and report a non-zero exit as
    /// fatal.
    pub fn finish(mut self, tool: &str) -> Result<(), ClassifierError> {
        if let Some(mut inner) = self.inner.take() {
            inner.flush()?;
        }
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(ClassifierError::ExternalTool {
                    tool: tool.to_string(),
                    status: status.code().unwrap_or(-1),
                });
            }
        }
        Ok(())
    }
}

impl Write for WriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .as_mut()
            .expect("write after finish")
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.as_mut().expect("write after finish").flush()
    }
}

/// Open `path` for writing per the stream-open contract. `"-"` writes to
/// stdout. `.bam`/`.cram` have no in-process or piped-write precedent in
/// this crate (the viewer this module shells out to is read-only), so
/// writing to either extension is a usage error.
pub fn open_write(path: &Path) -> Result<WriteHandle, ClassifierError> {
    if path.as_os_str() == "-" {
        return Ok(WriteHandle::plain(Box::new(io::stdout())));
    }

    let ext = extension_of(path);
    match ext {
        "gz" => {
            let file = File::create(path)?;
            Ok(WriteHandle::plain(Box::new(GzEncoder::new(
                file,
                Compression::default(),
            ))))
        }
        "bz2" => spawn_compressor("bzip2", &["-z", "-c"], path),
        "xz" => spawn_compressor("xz", &["-z", "-c"], path),
        "bam" | "cram" => Err(ClassifierError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("writing {ext} output is not supported"),
        ))),
        _ => Ok(WriteHandle::plain(Box::new(File::create(path)?))),
    }
}

fn spawn_compressor(bin: &str, args: &[&str], path: &Path) -> Result<WriteHandle, ClassifierError> {
    let out_file = File::create(path)?;
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::from(out_file))
        .stderr(Stdio::inherit());
    let mut child = cmd.spawn()?;
    let stdin = child.stdin.take().expect("stdin was piped");
    Ok(WriteHandle::piped(Box::new(stdin), child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use tempfile::NamedTempFile;

    #[test]
    fn plain_extension_opens_regular_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"chr1\t1\t2\n").unwrap();
        let mut handle = open_read(tmp.path(), None, "").unwrap();
        let mut out = String::new();
        handle.read_to_string(&mut out).unwrap();
        assert_eq!(out, "chr1\t1\t2\n");
    }

    #[test]
    fn gz_round_trip_in_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peaks.bed.gz");
        {
            let mut w = open_write(&path).unwrap();
            w.write_all(b"chr1\t10\t20\n").unwrap();
            w.finish("gz").unwrap();
        }
        let mut r = open_read(&path, None, "").unwrap();
        let mut out = String::new();
        r.read_to_string(&mut out).unwrap();
        assert_eq!(out, "chr1\t10\t20\n");
    }

    #[test]
    fn bam_extension_without_viewer_is_an_error() {
        let path = Path::new("reads.bam");
        let err = open_read(path, None, "").unwrap_err();
        assert!(matches!(err, ClassifierError::Io(_)));
    }

    #[test]
    fn bam_write_is_rejected() {
        let path = Path::new("/tmp/does-not-matter.bam");
        let err = open_write(path).unwrap_err();
        assert!(matches!(err, ClassifierError::Io(_)));
    }
}
