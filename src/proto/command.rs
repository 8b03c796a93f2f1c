use std::{fmt, time::Duration};

use crate::bus::Address;

/// Lines sent to the Prologix controller.
///
/// Everything except `Data` is interpreted by the controller itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Addr(Address),
    ReadTimeout(Duration),
    EndOfRecord(EndOfRecord),
    Read,
    Local,
    ControllerMode,
    Auto(bool),
    Version,
    /// Controller directive passed through as written.
    Directive(String),
    /// Bytes for the addressed instrument.
    Data(String),
}

/// Character the controller appends to a received record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfRecord {
    CrLf,
    Cr,
    Lf,
    None,
}

impl EndOfRecord {
    fn code(self) -> u8 {
        match self {
            EndOfRecord::CrLf => 0,
            EndOfRecord::Cr => 1,
            EndOfRecord::Lf => 2,
            EndOfRecord::None => 3,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Addr(address) => write!(f, "++addr {}", address),
            Command::ReadTimeout(timeout) => write!(f, "++read_tmo_ms {}", timeout.as_millis()),
            Command::EndOfRecord(eor) => write!(f, "++eor {}", eor.code()),
            Command::Read => f.write_str("++read eoi"),
            Command::Local => f.write_str("++loc"),
            Command::ControllerMode => f.write_str("++mode 1"),
            Command::Auto(on) => write!(f, "++auto {}", if *on { 1 } else { 0 }),
            Command::Version => f.write_str("++ver"),
            Command::Directive(line) | Command::Data(line) => f.write_str(line),
        }
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        if line.starts_with("++") {
            Command::Directive(line.to_string())
        } else {
            Command::Data(line.to_string())
        }
    }
}
