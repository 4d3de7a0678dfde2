//! Serial port source for the meter's opto-isolated link.
//!
//! The port is opened with the fixed transport contract (1200 baud, 7N2)
//! and the control lines are set once before the first read: the meter's
//! opto-couplers are powered from RTS/DTR, not used for flow control, so
//! RTS must sit low (negative voltage) and DTR high. Neither line is
//! toggled again for the lifetime of the source.

pub mod error;
pub mod layout;

use std::io::{Read, Write};

use serialport::{DataBits, Parity, SerialPort, StopBits};

use super::{ByteSource, SourceError};
use error::SerialSourceError;

pub struct SerialPortSource {
    port: Box<dyn SerialPort>,
}

impl SerialPortSource {
    /// Open and configure a port, leaving it ready for the first read.
    pub fn open(path: &str) -> Result<Self, SourceError> {
        open_port(path).map_err(SourceError::from)
    }
}

fn open_port(path: &str) -> Result<SerialPortSource, SerialSourceError> {
    let mut port = serialport::new(path, layout::BAUD_RATE)
        .data_bits(DataBits::Seven)
        .parity(Parity::None)
        .stop_bits(StopBits::Two)
        .timeout(layout::READ_TIMEOUT)
        .open()
        .map_err(|e| SerialSourceError::Serial {
            context: "open",
            message: e.to_string(),
        })?;

    // RTS -12V, DTR +12V: powers the opto-couplers. Set once, never
    // toggled mid-stream.
    port.write_request_to_send(false)
        .map_err(|e| SerialSourceError::Serial {
            context: "set RTS",
            message: e.to_string(),
        })?;
    port.write_data_terminal_ready(true)
        .map_err(|e| SerialSourceError::Serial {
            context: "set DTR",
            message: e.to_string(),
        })?;

    Ok(SerialPortSource { port })
}

impl ByteSource for SerialPortSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SourceError::Io(e)),
            }
        }
        Ok(filled)
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), SourceError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

/// Enumerate serial ports visible to the OS, by name.
pub fn available_ports() -> Result<Vec<String>, SourceError> {
    let ports = serialport::available_ports().map_err(|e| SerialSourceError::Serial {
        context: "enumerate",
        message: e.to_string(),
    })?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
