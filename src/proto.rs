use std::time::Duration;

pub mod codec;
pub mod command;
pub mod conv;
pub mod prologix;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("No response within {:?}", _0)]
    Timeout(Duration),
    #[error("Connection was closed")]
    Abort,
    #[error("Invalid GPIB address: {} (0..=30)", _0)]
    InvalidAddress(u8),
    #[error("Display text must be at most 12 printable ASCII characters: {:?}", _0)]
    DisplayText(String),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
