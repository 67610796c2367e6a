use std::io;

use super::*;
use crate::diagnostics::{Diagnostics, Direction};

/// Byte pipe underneath the RTU master. `receive_exact` must fail with
/// `ErrorKind::TimedOut` when the slave stays silent past the response timeout.
pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    fn receive_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Drop whatever is sitting in the receive buffer before a new request.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Modbus RTU master: one blocking request/response exchange per call, no retries.
pub struct RtuMaster<T> {
    transport: T,
    diagnostics: Box<dyn Diagnostics>,
}

impl<T: Transport> RtuMaster<T> {
    pub fn new(transport: T, diagnostics: Box<dyn Diagnostics>) -> Self {
        Self {
            transport,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn read_holding_registers(
        &mut self,
        slave: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        let block = RegisterBlock::new(address, count)?;
        let pdu = self.exchange(slave, &block.create_read_request())?;
        Ok(block.parse_read_response(&pdu)?)
    }

    pub fn write_multiple_registers(
        &mut self,
        slave: u8,
        address: u16,
        values: &[u16],
    ) -> Result<WriteAck, TransportError> {
        let block = RegisterBlock::new(address, values.len() as u16)?;
        let pdu = self.exchange(slave, &block.create_write_request(values)?)?;
        Ok(block.parse_write_response(&pdu)?)
    }

    fn exchange(&mut self, slave: u8, pdu: &[u8]) -> Result<Vec<u8>, TransportError> {
        if slave == 0 || slave > 247 {
            return Err(TransportError::InvalidSlaveAddress(slave));
        }

        let request = wrap_rtu(slave, pdu);
        self.transport.discard_input()?;
        self.diagnostics.frame(Direction::Sent, &request);
        self.transport.send(&request)?;

        let response = self.receive_frame(pdu[0])?;
        self.diagnostics.frame(Direction::Received, &response);
        unwrap_rtu(slave, &response)
    }

    /// Reads one response frame, using the function code to learn how long it is.
    fn receive_frame(&mut self, expected: u8) -> Result<Vec<u8>, TransportError> {
        let mut frame = vec![0u8; 3];
        self.transport.receive_exact(&mut frame)?;

        let function_code = frame[1];
        let remaining = if (function_code & 0x80) != 0 {
            2 // exception code already read, CRC left
        } else {
            match function_code {
                READ_HOLDING_REGISTERS if expected == READ_HOLDING_REGISTERS => {
                    frame[2] as usize + 2
                }
                WRITE_MULTIPLE_REGISTERS if expected == WRITE_MULTIPLE_REGISTERS => 5,
                other => return Err(PduError::UnexpectedFunctionCode(expected, other).into()),
            }
        };

        let start = frame.len();
        frame.resize(start + remaining, 0);
        self.transport.receive_exact(&mut frame[start..])?;
        Ok(frame)
    }
}

fn wrap_rtu(slave: u8, pdu: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + pdu.len() + 2);
    frame.push(slave);
    frame.extend_from_slice(pdu);

    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

fn unwrap_rtu(slave: u8, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
    if frame.len() < 4 {
        return Err(TransportError::FrameTooShort(frame.len()));
    }

    let received_crc = u16::from_le_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);
    let calculated_crc = crc16(&frame[..frame.len() - 2]);
    if received_crc != calculated_crc {
        return Err(TransportError::CrcMismatch {
            expected: calculated_crc,
            received: received_crc,
        });
    }

    if frame[0] != slave {
        return Err(TransportError::SlaveMismatch {
            expected: slave,
            received: frame[0],
        });
    }

    Ok(frame[1..frame.len() - 2].to_vec())
}

/// CRC-16/MODBUS (poly 0xA001 reflected, init 0xFFFF). Sent low byte first.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
