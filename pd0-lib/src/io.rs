//! Scoped file access that reports failures as [ErrorCode]s.
//!
//! A [Reader] owns its source; dropping it closes the file, so every early return in
//! the decoders releases the handle.
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{ErrorCode, Result};

/// Reader over any seekable byte source.
pub struct Reader<R>
where
    R: Read + Seek,
{
    inner: R,
}

/// [Reader] over a buffered file handle.
pub type FileReader = Reader<BufReader<File>>;

impl Reader<BufReader<File>> {
    /// Open `path` for reading.
    ///
    /// # Errors
    /// [ErrorCode::FileNotFound], [ErrorCode::PermissionDenied],
    /// [ErrorCode::OutOfMemory] or [ErrorCode::IoError] depending on the OS failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => Ok(Reader::new(BufReader::new(file))),
            Err(err) => {
                let code = ErrorCode::from(&err);
                debug!(?path, %err, "failed to open: {code}");
                Err(code)
            }
        }
    }
}

impl<R> Reader<R>
where
    R: Read + Seek,
{
    pub fn new(inner: R) -> Self {
        Reader { inner }
    }

    /// Read exactly `n` bytes.
    ///
    /// # Errors
    /// [ErrorCode::FileCorrupted] if EOF is reached before `n` bytes are available,
    /// [ErrorCode::IoError] for any other read failure.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let buf = self.read_upto(n)?;
        if buf.len() != n {
            trace!(wanted = n, got = buf.len(), "unexpected end of file");
            return Err(ErrorCode::FileCorrupted);
        }
        Ok(buf)
    }

    /// Read exactly `N` bytes into an array.
    ///
    /// # Errors
    /// See [Self::read_exact].
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        let n = self.fill(&mut buf)?;
        if n != N {
            trace!(wanted = N, got = n, "unexpected end of file");
            return Err(ErrorCode::FileCorrupted);
        }
        Ok(buf)
    }

    /// Read up to `n` bytes, stopping early only at EOF.
    ///
    /// # Errors
    /// [ErrorCode::IoError] for read failures other than EOF.
    pub fn read_upto(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        let got = self.fill(&mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }

    /// Seek to an absolute position.
    ///
    /// # Errors
    /// [ErrorCode::IoError] if the seek fails.
    pub fn seek(&mut self, pos: u64) -> Result<u64> {
        self.inner
            .seek(SeekFrom::Start(pos))
            .map_err(|_| ErrorCode::IoError)
    }

    /// Current absolute position.
    ///
    /// # Errors
    /// [ErrorCode::IoError] if the position cannot be determined.
    pub fn position(&mut self) -> Result<u64> {
        self.inner.stream_position().map_err(|_| ErrorCode::IoError)
    }

    /// Total length of the source, leaving the position unchanged.
    ///
    /// # Errors
    /// [ErrorCode::IoError] if seeking fails.
    pub fn len(&mut self) -> Result<u64> {
        let cur = self.position()?;
        let end = self
            .inner
            .seek(SeekFrom::End(0))
            .map_err(|_| ErrorCode::IoError)?;
        self.seek(cur)?;
        Ok(end)
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    // Like Read::read_exact, but reports how many bytes were read instead of failing
    // on a short read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match self.inner.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    debug!(%err, "read failed");
                    return Err(ErrorCode::IoError);
                }
            }
        }
        Ok(total)
    }
}
