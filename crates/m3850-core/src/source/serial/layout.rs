use std::time::Duration;

/// Transport contract from the meter's manual: 1200 baud, 7 data bits,
/// no parity, 2 stop bits. Data bits and parity are set in `open`.
pub const BAUD_RATE: u32 = 1200;

/// The meter paces itself at roughly one record every 600-750 ms, so a
/// one second timeout always spans at least one arrival.
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);
