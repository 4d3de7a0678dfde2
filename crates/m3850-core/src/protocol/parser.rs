use crate::{DecodeIssue, Measurement, Value};

use super::error::RecordError;
use super::layout;
use super::reader::RecordReader;

/// One decoded record: the measurement plus any non-fatal issues observed
/// while decoding it. Issues never suppress the measurement.
#[derive(Debug)]
pub struct Decoded {
    pub measurement: Measurement,
    pub issues: Vec<DecodeIssue>,
}

/// Decode one 14-byte record into a [`Measurement`].
///
/// The payload must hold at least one full record; anything shorter is a
/// transport anomaly and is rejected outright rather than partially
/// interpreted. Alignment is the caller's responsibility: a misaligned
/// full-length slice is decoded at the fixed offsets like any other.
pub fn decode_record(payload: &[u8]) -> Result<Decoded, RecordError> {
    let reader = RecordReader::new(payload);
    reader.require_len(layout::RECORD_LEN)?;

    let mode = reader.read_ascii_trimmed(layout::MODE_RANGE.clone())?;
    let value_field = reader.read_slice(layout::VALUE_RANGE.clone())?;
    let unit = reader.read_ascii_trimmed(layout::UNIT_RANGE.clone())?;
    let terminator = reader.read_u8(layout::TERMINATOR_OFFSET)?;

    let mut issues = Vec::new();

    let value = if value_field.contains(&layout::OVERLOAD_SENTINEL) {
        // "0.L" on the display: open circuit / over-range.
        Value::OverRange
    } else {
        let text = String::from_utf8_lossy(value_field).into_owned();
        match text.trim_matches(' ').parse::<f64>() {
            Ok(number) => Value::Finite(number),
            Err(_) => {
                // Expected in Logic mode, which reports symbolic states.
                issues.push(DecodeIssue::UnparsableValue { text });
                Value::Unreadable
            }
        }
    };

    if terminator != layout::TERMINATOR {
        // Temperature mode sends a space instead of CR. Known meter
        // defect; the reading itself is still good.
        issues.push(DecodeIssue::MissingTerminator { found: terminator });
    }

    Ok(Decoded {
        measurement: Measurement { mode, value, unit },
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::decode_record;
    use crate::{DecodeIssue, Value};

    #[test]
    fn decode_valid_dc_record() {
        let decoded = decode_record(b"DC   1.05V   \r").unwrap();
        assert_eq!(decoded.measurement.mode, "DC");
        assert_eq!(decoded.measurement.value, Value::Finite(1.05));
        assert_eq!(decoded.measurement.unit, "V");
        assert!(decoded.issues.is_empty());
    }

    #[test]
    fn decode_negative_value() {
        let decoded = decode_record(b"DC -0.217mV  \r").unwrap();
        assert_eq!(decoded.measurement.value, Value::Finite(-0.217));
        assert_eq!(decoded.measurement.unit, "mV");
    }

    #[test]
    fn decode_overload_sentinel() {
        let decoded = decode_record(b"OH   0.L MOhm\r").unwrap();
        assert_eq!(decoded.measurement.mode, "OH");
        assert_eq!(decoded.measurement.value, Value::OverRange);
        assert_eq!(decoded.measurement.unit, "MOhm");
        assert!(decoded.issues.is_empty());
    }

    #[test]
    fn sentinel_wins_regardless_of_surrounding_bytes() {
        let decoded = decode_record(b"OH x0.Ly MOhm\r").unwrap();
        assert_eq!(decoded.measurement.value, Value::OverRange);
    }

    #[test]
    fn decode_symbolic_logic_value() {
        let decoded = decode_record(b"LO rEAdy     \r").unwrap();
        assert_eq!(decoded.measurement.mode, "LO");
        assert_eq!(decoded.measurement.value, Value::Unreadable);
        assert!(matches!(
            decoded.issues.as_slice(),
            [DecodeIssue::UnparsableValue { text }] if text.contains("rEAdy")
        ));
    }

    #[test]
    fn decode_missing_terminator() {
        let decoded = decode_record(b"TM   25.4C    ").unwrap();
        assert_eq!(decoded.measurement.mode, "TM");
        assert_eq!(decoded.measurement.value, Value::Finite(25.4));
        assert_eq!(decoded.measurement.unit, "C");
        assert!(matches!(
            decoded.issues.as_slice(),
            [DecodeIssue::MissingTerminator { found: b' ' }]
        ));
    }

    #[test]
    fn decode_short_slice() {
        let err = decode_record(b"DC   1.05").unwrap_err();
        assert!(err.to_string().contains("record too short"));
    }
}
