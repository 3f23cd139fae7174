//! Partitioning a file into regions and traversing them.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::debug;

use crate::ChunkError;
use crate::counter::ProgressCounter;
use crate::digest::{self, Checksum};
use crate::region::{self, RegionReader};
use crate::sniff;

/// Per-region outcome of a traversal.
#[derive(Debug, PartialEq, Eq)]
pub enum RegionOutcome<E> {
    /// The region's function returned success.
    Completed,
    /// The region's function returned an error.
    Failed(E),
    /// The region was never attempted because an earlier region failed.
    Skipped,
}

impl<E> RegionOutcome<E> {
    /// Returns the error if the region failed.
    pub fn err(&self) -> Option<&E> {
        match self {
            RegionOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// `true` when the region's function ran to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, RegionOutcome::Completed)
    }
}

/// Collapses traversal outcomes into a single result.
///
/// Every failed index is reported in the combined error message; skipped
/// regions are not failures.
pub fn check_outcomes<E: fmt::Display>(outcomes: &[RegionOutcome<E>]) -> Result<(), ChunkError> {
    let failures: Vec<String> = outcomes
        .iter()
        .enumerate()
        .filter_map(|(index, o)| o.err().map(|e| format!("region {index}: {e}")))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ChunkError::Regions(failures.join("; ")))
    }
}

/// One file opened for chunked access.
///
/// A plan partitions `[0, size)` into contiguous regions of `chunk_size`
/// bytes (the last one clamped to the file size) and hands out
/// [`RegionReader`]s over them. The plan owns the file handle and the shared
/// progress counter; it is single-use: create, [`open`](Self::open), hand
/// out regions, [`close`](Self::close).
#[derive(Debug)]
pub struct ChunkPlan {
    path: PathBuf,
    chunk_size: i64,
    file: Option<File>,
    name: String,
    content_type: String,
    size: i64,
    chunk_count: usize,
    counter: ProgressCounter,
}

impl ChunkPlan {
    /// Creates an unopened plan for `path` with the given target chunk size.
    ///
    /// No I/O happens until [`open`](Self::open).
    pub fn new(path: impl Into<PathBuf>, chunk_size: i64) -> Self {
        Self {
            path: path.into(),
            chunk_size,
            file: None,
            name: String::new(),
            content_type: String::new(),
            size: 0,
            chunk_count: 0,
            counter: ProgressCounter::new(),
        }
    }

    /// Opens the file, resolves its size, name and content type, and
    /// computes the partition.
    ///
    /// Fails on an inaccessible path and on a non-positive chunk size, in
    /// which case nothing is computed. The chunk count is fixed from here
    /// on; reopening a plan is not supported.
    pub fn open(&mut self) -> Result<(), ChunkError> {
        if self.chunk_size <= 0 {
            return Err(ChunkError::InvalidChunkSize(self.chunk_size));
        }

        let file = File::open(&self.path)?;
        let meta = file.metadata()?;
        let size = meta.len() as i64;

        // Sniff the content type from the leading bytes. The read is
        // positional, so the handle stays addressed at the start.
        let mut prefix = [0u8; sniff::SNIFF_LEN];
        let n = region::read_at(&file, &mut prefix, 0)?;
        let content_type = sniff::detect_content_type(&prefix[..n]).to_string();

        let mut chunk_count = (size / self.chunk_size) as usize;
        if size % self.chunk_size != 0 {
            chunk_count += 1;
        }

        self.name = self
            .path
            .file_name()
            .map(|base| base.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.size = size;
        self.chunk_count = chunk_count;
        self.content_type = content_type;
        self.file = Some(file);

        debug!(
            "opened {}: size={} chunks={} type={}",
            self.path.display(),
            self.size,
            self.chunk_count,
            self.content_type
        );
        Ok(())
    }

    /// Produces a fresh generation of counting regions covering the whole
    /// file exactly once, and resets the shared progress counter.
    ///
    /// Regions are ordered by index and are contiguous and non-overlapping;
    /// every region spans `chunk_size` bytes except possibly the last, whose
    /// limit is clamped to the file size. Driving two generations against
    /// the shared counter at once is a caller error.
    pub fn readers(&self) -> Result<Vec<RegionReader<'_>>, ChunkError> {
        let file = self.file.as_ref().ok_or(ChunkError::NotOpened)?;
        self.counter.reset();
        let mut regions = Vec::with_capacity(self.chunk_count);
        for index in 0..self.chunk_count {
            let base = index as i64 * self.chunk_size;
            let limit = if index == self.chunk_count - 1 {
                self.size
            } else {
                base + self.chunk_size
            };
            regions.push(RegionReader::new(file, &self.counter, base, limit, true));
        }
        Ok(regions)
    }

    /// Applies `f` to every region in index order on the calling thread,
    /// stopping at the first failure.
    ///
    /// Regions after a failure are reported as [`RegionOutcome::Skipped`],
    /// never attempted. A fresh region generation is produced, so the
    /// progress counter restarts at zero.
    pub fn map<E, F>(&self, mut f: F) -> Result<Vec<RegionOutcome<E>>, ChunkError>
    where
        F: FnMut(usize, &mut RegionReader<'_>) -> Result<(), E>,
    {
        let mut regions = self.readers()?;
        let mut outcomes: Vec<RegionOutcome<E>> =
            (0..regions.len()).map(|_| RegionOutcome::Skipped).collect();
        for (index, reader) in regions.iter_mut().enumerate() {
            match f(index, reader) {
                Ok(()) => outcomes[index] = RegionOutcome::Completed,
                Err(e) => {
                    outcomes[index] = RegionOutcome::Failed(e);
                    break;
                }
            }
        }
        Ok(outcomes)
    }

    /// Applies `f` to every region concurrently, one worker thread per
    /// region, and blocks until all of them finish.
    ///
    /// Unlike [`map`](Self::map) this never stops early: every region is
    /// attempted no matter how many others fail, and the outcome list is
    /// collected in index order from the joined workers. No ordering holds
    /// between regions; only each region's own reads are ordered. A fresh
    /// region generation is produced, so the progress counter restarts at
    /// zero.
    pub fn map_parallel<E, F>(&self, f: F) -> Result<Vec<RegionOutcome<E>>, ChunkError>
    where
        E: Send,
        F: Fn(usize, &mut RegionReader<'_>) -> Result<(), E> + Sync,
    {
        let regions = self.readers()?;
        let f = &f;
        let outcomes = thread::scope(|scope| {
            let workers: Vec<_> = regions
                .into_iter()
                .enumerate()
                .map(|(index, mut reader)| {
                    scope.spawn(move || match f(index, &mut reader) {
                        Ok(()) => RegionOutcome::Completed,
                        Err(e) => RegionOutcome::Failed(e),
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().expect("region worker panicked"))
                .collect()
        });
        Ok(outcomes)
    }

    /// Releases the file handle.
    ///
    /// Fails if the plan was never opened or is already closed. Regions
    /// cannot outlive the handle; the borrow checker enforces that.
    pub fn close(&mut self) -> Result<(), ChunkError> {
        match self.file.take() {
            Some(file) => {
                drop(file);
                Ok(())
            }
            None => Err(ChunkError::NotOpened),
        }
    }

    /// The path the plan was created with.
    pub fn filename(&self) -> &Path {
        &self.path
    }

    /// Configured target chunk size in bytes.
    pub fn chunk_size(&self) -> i64 {
        self.chunk_size
    }

    /// Base name of the opened file (empty before a successful open).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sniffed content type (empty before a successful open).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// File size in bytes (0 before a successful open).
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Number of regions in the partition.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Bytes delivered by counting regions of the current generation.
    pub fn bytes_read(&self) -> i64 {
        self.counter.get()
    }

    /// MD5 checksum of the whole file, independent of the partition.
    ///
    /// Reads through a non-counting region spanning the full file, so
    /// neither the progress counter nor any region cursor moves; safe to
    /// call while a traversal is in flight.
    pub fn md5(&self) -> Result<Checksum, ChunkError> {
        let file = self.file.as_ref().ok_or(ChunkError::NotOpened)?;
        let mut whole = RegionReader::new(file, &self.counter, 0, self.size, false);
        digest::checksum_reader(&mut whole)
    }
}
