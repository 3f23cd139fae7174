//! Chunked file access for multipart uploads.
//!
//! Splits a file into fixed-size regions that can be read, hashed and
//! streamed independently. All regions share one file handle (positional
//! reads, no locking) and one atomic counter tracking aggregate read
//! progress, which an independent observer can poll while a transfer is in
//! flight.

mod counter;
mod digest;
mod plan;
mod region;
mod sniff;
mod watch;

pub use counter::ProgressCounter;
pub use digest::{Checksum, checksum_bytes, checksum_file, checksum_reader};
pub use plan::{ChunkPlan, RegionOutcome, check_outcomes};
pub use region::RegionReader;
pub use sniff::{SNIFF_LEN, detect_content_type};
pub use watch::{ProgressCallback, ProgressSnapshot, ProgressWatcher, RateEstimator};

/// Default chunk size: 10 MB.
///
/// Comfortably above S3-style minimum part sizes; larger chunks reduce
/// per-part overhead (presigned-URL round trips, checksums, requests).
/// Sizing policy is ultimately the caller's.
pub const DEFAULT_CHUNK_SIZE: i64 = 10_000_000;

/// Errors produced by the chunk engine.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid chunk size: {0} (must be positive)")]
    InvalidChunkSize(i64),

    #[error("plan not opened")]
    NotOpened,

    #[error("one or more regions failed: {0}")]
    Regions(String),
}
