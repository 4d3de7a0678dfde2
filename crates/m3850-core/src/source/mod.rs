mod capture;
mod serial;

pub use capture::CaptureSource;
pub use serial::{SerialPortSource, available_ports};

use thiserror::Error;

/// A blocking byte stream with a bounded read timeout.
///
/// Implementations never block forever: a read returns as soon as the
/// buffer is full or the source's own timeout elapses, whichever comes
/// first. A return of zero means nothing arrived before the timeout, or
/// the input is exhausted.
pub trait ByteSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Write a command byte sequence to the device. Read-only sources
    /// accept and discard it.
    fn send(&mut self, _bytes: &[u8]) -> Result<(), SourceError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(String),
}

impl From<serial::error::SerialSourceError> for SourceError {
    fn from(value: serial::error::SerialSourceError) -> Self {
        match value {
            serial::error::SerialSourceError::Io(err) => SourceError::Io(err),
            serial::error::SerialSourceError::Serial { context, message } => {
                SourceError::Serial(format!("{context}: {message}"))
            }
        }
    }
}
