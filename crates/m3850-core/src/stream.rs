//! Stream synchronization and the record-paced read loop.
//!
//! The meter emits a continuous run of 14-byte records with no start
//! marker, so a stream of unknown phase is aligned once by scanning for
//! the first carriage return; from then on every read consumes exactly
//! one record-length slice. A failed decode never triggers
//! resynchronization: the protocol is self-framing per record boundary
//! once aligned.

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::protocol::error::RecordError;
use crate::protocol::{decode_record, layout};
use crate::source::{ByteSource, SourceError};
use crate::{DEFAULT_CAPTURED_AT, Reading};

/// Bounds on the one-time synchronization scan.
///
/// A meter stuck in the defective Temperature mode never sends a carriage
/// return; without a bound, synchronization would spin forever. Scanned
/// bytes and consecutive empty reads are limited separately.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Give up after scanning this many bytes without a terminator.
    pub max_scan_bytes: usize,
    /// Give up after this many consecutive zero-byte reads.
    pub max_idle_reads: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            // A whole record is 14 bytes; 256 spans many records' worth
            // of garbage plus the worst observed startup noise.
            max_scan_bytes: 256,
            max_idle_reads: 30,
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    #[error("no terminator found after scanning {scanned} bytes")]
    SyncTimeout { scanned: usize },
}

/// One turn of the read loop.
#[derive(Debug)]
pub enum StreamEvent {
    Reading(Reading),
    /// A 14-byte read came back shorter. The partial bytes are consumed
    /// and discarded; no resynchronization is attempted.
    ShortRead { expected: usize, actual: usize },
}

/// Record-paced reader over a [`ByteSource`].
///
/// Single-threaded and blocking: synchronize once at stream start, then
/// call [`next_event`](MeterStream::next_event) in a loop. Cancellation
/// is cooperative; callers check their stop flag between calls.
pub struct MeterStream<S: ByteSource> {
    source: S,
    sync: SyncConfig,
}

impl<S: ByteSource> MeterStream<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, SyncConfig::default())
    }

    pub fn with_config(source: S, sync: SyncConfig) -> Self {
        Self { source, sync }
    }

    /// Send the `D` trigger command.
    ///
    /// Needed at most once per power-up; a meter already streaming in COM
    /// mode behaves identically whether or not it is sent again.
    pub fn trigger(&mut self) -> Result<(), StreamError> {
        self.source.send(layout::TRIGGER)?;
        Ok(())
    }

    /// Align the stream to a record boundary.
    ///
    /// Reads one byte at a time, consuming and discarding everything up
    /// to and including the first carriage return. After return, the next
    /// 14-byte read starts exactly at a record boundary. Returns the
    /// number of bytes discarded.
    pub fn synchronize(&mut self) -> Result<usize, StreamError> {
        self.synchronize_with(|_| {})
    }

    /// Like [`synchronize`](MeterStream::synchronize), surfacing each
    /// scanned byte to a diagnostic sink.
    pub fn synchronize_with(
        &mut self,
        mut observe: impl FnMut(u8),
    ) -> Result<usize, StreamError> {
        let mut scanned = 0usize;
        let mut idle = 0u32;
        let mut byte = [0u8; 1];
        loop {
            if self.source.read_bytes(&mut byte)? == 0 {
                idle += 1;
                if idle >= self.sync.max_idle_reads {
                    return Err(StreamError::SyncTimeout { scanned });
                }
                continue;
            }
            idle = 0;
            scanned += 1;
            observe(byte[0]);
            if byte[0] == layout::TERMINATOR {
                return Ok(scanned);
            }
            if scanned >= self.sync.max_scan_bytes {
                return Err(StreamError::SyncTimeout { scanned });
            }
        }
    }

    /// Read and decode the next record.
    ///
    /// Returns `Ok(None)` when the source produced nothing before its
    /// timeout (live sources: idle, poll again; replay sources: end of
    /// input). A short read is reported as an event and the loop simply
    /// proceeds; the capture timestamp is assigned here, at read
    /// completion.
    pub fn next_event(&mut self) -> Result<Option<StreamEvent>, StreamError> {
        let mut buf = [0u8; layout::RECORD_LEN];
        let actual = self.source.read_bytes(&mut buf)?;
        if actual == 0 {
            return Ok(None);
        }
        if actual < layout::RECORD_LEN {
            return Ok(Some(StreamEvent::ShortRead {
                expected: layout::RECORD_LEN,
                actual,
            }));
        }

        let captured_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| DEFAULT_CAPTURED_AT.to_string());
        let decoded = decode_record(&buf)?;
        Ok(Some(StreamEvent::Reading(Reading {
            captured_at,
            measurement: decoded.measurement,
            issues: decoded.issues,
        })))
    }
}
