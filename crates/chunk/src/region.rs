//! Bounded positional reader over one byte range of a shared file.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};

use crate::ChunkError;
use crate::counter::ProgressCounter;
use crate::digest::{self, Checksum};

/// Reads into `buf` at an absolute file offset, leaving the handle's seek
/// cursor untouched.
#[cfg(unix)]
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// One half-open byte range `[base, limit)` of a plan's file.
///
/// Regions borrow the plan's file handle and progress counter; the plan
/// outlives every region it produces. Reads address absolute offsets, so any
/// number of regions can read the same handle concurrently without locking.
/// A counting region reports every byte it delivers to the shared
/// [`ProgressCounter`].
#[derive(Debug)]
pub struct RegionReader<'a> {
    file: &'a File,
    counter: &'a ProgressCounter,
    base: i64,
    off: i64,
    limit: i64,
    counting: bool,
}

impl<'a> RegionReader<'a> {
    pub(crate) fn new(
        file: &'a File,
        counter: &'a ProgressCounter,
        base: i64,
        limit: i64,
        counting: bool,
    ) -> Self {
        Self {
            file,
            counter,
            base,
            off: base,
            limit,
            counting,
        }
    }

    /// Logical length of the region (`limit - base`), independent of how
    /// much has been read.
    pub fn size(&self) -> i64 {
        self.limit - self.base
    }

    /// Absolute offset where the region starts.
    pub fn base(&self) -> i64 {
        self.base
    }

    /// Absolute offset of the next read.
    pub fn offset(&self) -> i64 {
        self.off
    }

    /// Bytes left until the region is exhausted.
    pub fn remaining(&self) -> i64 {
        self.limit - self.off
    }

    /// Rewinds the cursor to the start of the region.
    ///
    /// For a counting region the shared counter is reduced by exactly the
    /// bytes delivered since the last rewind, so a full re-read ends with
    /// the counter where a single pass would have left it. A non-counting
    /// region contributed nothing and only the cursor moves.
    pub fn reset(&mut self) {
        if self.counting {
            self.counter.decrement(self.off - self.base);
        }
        self.off = self.base;
    }

    /// MD5 checksum of the full `[base, limit)` range.
    ///
    /// Runs over an independent, non-counting clone of the region whose
    /// cursor starts at `base`, so it is safe to call at any time, including
    /// between reads of the original: neither the cursor nor the shared
    /// counter moves.
    pub fn md5(&self) -> Result<Checksum, ChunkError> {
        let mut clone = RegionReader::new(self.file, self.counter, self.base, self.limit, false);
        digest::checksum_reader(&mut clone)
    }

    /// Streams the rest of the region into `sink` through a buffered writer.
    ///
    /// Returns the bytes written: `limit - base` when the region was unread
    /// and no error occurred. Counts toward the shared counter like any
    /// other read.
    pub fn copy_to<W: Write>(&mut self, sink: W) -> Result<u64, ChunkError> {
        let mut out = BufWriter::new(sink);
        let n = io::copy(self, &mut out)?;
        out.flush()?;
        Ok(n)
    }
}

impl Read for RegionReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.off >= self.limit {
            return Ok(0);
        }
        let want = (buf.len() as i64).min(self.limit - self.off) as usize;
        let n = read_at(self.file, &mut buf[..want], self.off as u64)?;
        self.off += n as i64;
        if self.counting {
            self.counter.increment(n as i64);
        }
        Ok(n)
    }
}
