//! Core library for reading Metex/Voltcraft M-3850 multimeters over their
//! opto-isolated serial link.
//!
//! The meter emits a continuous stream of fixed-width 14-byte ASCII
//! records with no start marker. This crate implements the pipeline used
//! by the CLI: byte sources (live serial port or raw capture replay) feed
//! the stream loop, which aligns the stream once and then drives the
//! record decoder (layout/reader/parser). Decoding is byte-oriented and
//! side-effect free; all I/O is isolated in `source` modules.
//!
//! Invariants:
//! - A record is decoded only from a full 14-byte slice; shorter reads
//!   are reported, never partially interpreted.
//! - Known protocol defects (missing terminator in Temperature mode,
//!   symbolic text in Logic mode) are surfaced as issues on an emitted
//!   measurement, never as stream-stopping errors.
//! - Synchronization happens once per stream and is bounded; a failed
//!   decode never triggers resynchronization.
//!
//! # Examples
//! ```
//! use std::io::Cursor;
//!
//! use m3850_core::{CaptureSource, MeterStream, StreamEvent, Value};
//!
//! let dump = b"noise\rDC   1.05V   \r".to_vec();
//! let mut stream = MeterStream::new(CaptureSource::new(Cursor::new(dump)));
//! stream.synchronize()?;
//!
//! if let Some(StreamEvent::Reading(reading)) = stream.next_event()? {
//!     assert_eq!(reading.measurement.mode, "DC");
//!     assert_eq!(reading.measurement.value, Value::Finite(1.05));
//!     assert_eq!(reading.measurement.unit, "V");
//! }
//! # Ok::<(), m3850_core::StreamError>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod protocol;
mod source;
mod stream;

pub use protocol::error::RecordError;
pub use protocol::layout::{MODE_TAGS, RECORD_LEN};
pub use protocol::{Decoded, decode_record};
pub use source::{ByteSource, CaptureSource, SerialPortSource, SourceError, available_ports};
pub use stream::{MeterStream, StreamError, StreamEvent, SyncConfig};

/// Default timestamp used when formatting the capture time fails.
pub const DEFAULT_CAPTURED_AT: &str = "1970-01-01T00:00:00Z";

/// A decoded value from the meter's six-character value field.
///
/// Over-range (`0.L` on the display, typically an open circuit in
/// resistance mode) and symbolic text (Logic mode) are distinct from
/// finite numbers, and stay distinct through serialization.
///
/// # Examples
/// ```
/// use m3850_core::Value;
///
/// assert_eq!(Value::OverRange.as_f64(), f64::INFINITY);
/// assert!(Value::Unreadable.as_f64().is_nan());
/// assert_eq!(Value::Finite(1.05).to_string(), "1.05");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// An ordinary numeric reading.
    Finite(f64),
    /// The open-circuit / over-range sentinel.
    OverRange,
    /// Symbolic or garbled text that is not a number.
    Unreadable,
}

impl Value {
    /// Collapse to a plain float: infinity for over-range, NaN for
    /// unreadable text.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Finite(v) => *v,
            Value::OverRange => f64::INFINITY,
            Value::Unreadable => f64::NAN,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Finite(v) => write!(f, "{v}"),
            Value::OverRange => write!(f, "inf"),
            Value::Unreadable => write!(f, "nan"),
        }
    }
}

/// One decoded measurement: mode tag, value, and unit, all trimmed.
///
/// # Examples
/// ```
/// use m3850_core::{Measurement, Value};
///
/// let m = Measurement {
///     mode: "OH".to_string(),
///     value: Value::OverRange,
///     unit: "MOhm".to_string(),
/// };
/// assert_eq!(m.mode, "OH");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Mode tag with padding trimmed (e.g. "DC", "OH", "TM").
    pub mode: String,
    /// Decoded value field.
    pub value: Value,
    /// Unit text with padding trimmed (e.g. "mV", "MOhm").
    pub unit: String,
}

/// Non-fatal conditions observed while decoding a record.
///
/// Issues accompany a measurement; they never replace it.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeIssue {
    /// The record's last byte is not a carriage return. Known meter
    /// defect in Temperature mode, which sends a space instead.
    #[error("record terminator is not carriage return (got 0x{found:02x})")]
    MissingTerminator { found: u8 },
    /// The value field held text that is neither numeric nor the
    /// over-range sentinel. Expected in Logic mode.
    #[error("value field is not numeric: {text:?}")]
    UnparsableValue { text: String },
}

/// A timestamped measurement as emitted by the stream loop.
///
/// The capture time is assigned at read completion, not by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// RFC3339 timestamp taken when the record's read completed.
    pub captured_at: String,
    /// The decoded measurement.
    pub measurement: Measurement,
    /// Non-fatal decode issues, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DecodeIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_serialization_distinguishes_special_values() {
        let finite = serde_json::to_value(Value::Finite(1.05)).expect("finite json");
        let over = serde_json::to_value(Value::OverRange).expect("over-range json");
        let unreadable = serde_json::to_value(Value::Unreadable).expect("unreadable json");

        assert_eq!(finite["finite"], 1.05);
        assert_eq!(over, "over_range");
        assert_eq!(unreadable, "unreadable");
    }

    #[test]
    fn reading_omits_empty_issues() {
        let reading = Reading {
            captured_at: DEFAULT_CAPTURED_AT.to_string(),
            measurement: Measurement {
                mode: "DC".to_string(),
                value: Value::Finite(1.05),
                unit: "V".to_string(),
            },
            issues: vec![],
        };

        let value = serde_json::to_value(&reading).expect("reading json");
        assert!(value.get("issues").is_none());
        assert_eq!(value["measurement"]["mode"], "DC");
    }

    #[test]
    fn reading_round_trips_with_issues() {
        let reading = Reading {
            captured_at: DEFAULT_CAPTURED_AT.to_string(),
            measurement: Measurement {
                mode: "TM".to_string(),
                value: Value::Finite(25.4),
                unit: "C".to_string(),
            },
            issues: vec![DecodeIssue::MissingTerminator { found: b' ' }],
        };

        let json = serde_json::to_string(&reading).expect("reading json");
        let back: Reading = serde_json::from_str(&json).expect("reading back");
        assert_eq!(back, reading);
    }
}
