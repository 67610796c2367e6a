// lib.rs

mod pdu;
mod diagnostics;
mod driver;
mod modbus_rtu;
mod serial;
pub mod registers;
mod types;

pub use pdu::{PduError, RegisterBlock, RegisterBlockBuilder, WriteAck};
pub use pdu::{READ_HOLDING_REGISTERS, WRITE_MULTIPLE_REGISTERS};
pub use diagnostics::{Diagnostics, Direction, LogDiagnostics, NoopDiagnostics};
pub use driver::{Rs01, Rs01Builder, Timing, DEFAULT_RESPONSE_TIMEOUT};
pub use modbus_rtu::{crc16, RtuMaster, Transport};
pub use serial::SerialConfig;
pub use types::{
    BasicInfo, BaudRateMode, CheckBit, ConfigField, MeasurementConfig, MeasurementFrame,
    ParameterReport, StopBit, Target,
};

pub use serialport::{DataBits, FlowControl, Parity, StopBits};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("Slave address mismatch: expected {expected}, received {received}")]
    SlaveMismatch { expected: u8, received: u8 },

    #[error("CRC mismatch: expected {expected:#06x}, received {received:#06x}")]
    CrcMismatch { expected: u16, received: u16 },

    #[error("Slave address not set")]
    SlaveAddressMissing,

    #[error("Invalid slave address: {0} (expected 1..=247)")]
    InvalidSlaveAddress(u8),

    #[error("No response within the response timeout")]
    Timeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] PduError),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                TransportError::Timeout
            }
            _ => TransportError::Io(err),
        }
    }
}
