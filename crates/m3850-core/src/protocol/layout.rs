pub const RECORD_LEN: usize = 14;

pub const MODE_RANGE: std::ops::Range<usize> = 0..3;
pub const VALUE_RANGE: std::ops::Range<usize> = 3..9;
pub const UNIT_RANGE: std::ops::Range<usize> = 9..13;
pub const TERMINATOR_OFFSET: usize = 13;

pub const TERMINATOR: u8 = b'\r';
pub const OVERLOAD_SENTINEL: u8 = b'L';

/// Command byte that asks the meter to send readings. In COM mode one
/// trigger at stream start is enough; the meter then streams on its own.
pub const TRIGGER: &[u8] = b"D";

/// Mode tags observed on the wire. The manual claims three-character tags
/// (e.g. `OHM`), but the meter sends two characters plus a space; the mode
/// field is fixed at three bytes either way.
pub const MODE_TAGS: [&str; 9] = ["DC", "AC", "OH", "DI", "FR", "CA", "HF", "TM", "LO"];
