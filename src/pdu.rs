use thiserror::Error;

/// Function code for "read holding registers".
pub const READ_HOLDING_REGISTERS: u8 = 0x03;
/// Function code for "write multiple registers".
pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

const MAX_READ_COUNT: u16 = 125;
const MAX_WRITE_COUNT: u16 = 123;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PduError {
    #[error("Start address is empty")]
    AddressIsEmpty,

    #[error("Invalid length: {0} (expected 1..=125)")]
    InvalidLength(u16),

    #[error("Invalid range: {0} + {1} = {2} > 65536")]
    RangeToMatch(u16, u16, u32),

    #[error("Data length mismatch: expected {expected}, got {actual}")]
    DataLengthMismatch { expected: usize, actual: usize },

    #[error("Empty response received")]
    EmptyResponse,

    #[error("Modbus exception: function code {0:#x}, exception code {1:#x}")]
    ModbusException(u8, u8),

    #[error("Unexpected function code: expected {0:#x}, got {1:#x}")]
    UnexpectedFunctionCode(u8, u8),

    #[error("Invalid response length")]
    InvalidResponseLength,

    #[error("Write echo mismatch: expected {expected:?}, got {actual:?}")]
    WriteEchoMismatch { expected: WriteAck, actual: WriteAck },
}

/// Acknowledgement of a "write multiple registers" request: the slave echoes
/// the start address and the number of registers it stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WriteAck {
    pub address: u16,
    pub count: u16,
}

/// A contiguous run of holding registers addressed by one request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterBlock {
    start_addr: u16,
    length: u16,
}

#[derive(Default)]
pub struct RegisterBlockBuilder {
    start_addr: Option<u16>,
    length: Option<u16>,
}

impl RegisterBlockBuilder {
    pub fn address(&mut self, addr: u16) -> &mut Self {
        self.start_addr = Some(addr);
        self
    }

    pub fn length(&mut self, length: u16) -> &mut Self {
        self.length = Some(length);
        self
    }

    pub fn build(&self) -> Result<RegisterBlock, PduError> {
        let start_addr = self.start_addr.ok_or(PduError::AddressIsEmpty)?;
        let length = self.length.unwrap_or(1);
        if length == 0 || length > MAX_READ_COUNT {
            return Err(PduError::InvalidLength(length));
        }
        let end_addr = start_addr as u32 + length as u32;
        if end_addr > 0x1_0000 {
            return Err(PduError::RangeToMatch(start_addr, length, end_addr));
        }
        Ok(RegisterBlock { start_addr, length })
    }
}

impl RegisterBlock {
    pub fn builder() -> RegisterBlockBuilder {
        RegisterBlockBuilder::default()
    }

    /// Shorthand for `builder().address(addr).length(length).build()`.
    pub fn new(addr: u16, length: u16) -> Result<Self, PduError> {
        Self::builder().address(addr).length(length).build()
    }

    pub fn start_addr(&self) -> u16 {
        self.start_addr
    }

    /// Number of registers in the block, always at least one.
    pub fn count(&self) -> u16 {
        self.length
    }

    pub fn create_read_request(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(5);
        msg.push(READ_HOLDING_REGISTERS);
        msg.extend_from_slice(&self.start_addr.to_be_bytes());
        msg.extend_from_slice(&self.length.to_be_bytes());
        msg // no err. address and length validated in builder
    }

    pub fn create_write_request(&self, data: &[u16]) -> Result<Vec<u8>, PduError> {
        if self.length > MAX_WRITE_COUNT {
            return Err(PduError::InvalidLength(self.length));
        }
        if data.len() != self.length as usize {
            return Err(PduError::DataLengthMismatch {
                expected: self.length as usize,
                actual: data.len(),
            });
        }

        let mut result = Vec::with_capacity(6 + data.len() * 2);
        result.push(WRITE_MULTIPLE_REGISTERS);
        result.extend_from_slice(&self.start_addr.to_be_bytes());
        result.extend_from_slice(&self.length.to_be_bytes());
        result.push((data.len() * 2) as u8);
        for value in data {
            result.extend_from_slice(&value.to_be_bytes());
        }
        Ok(result)
    }

    pub fn parse_read_response(&self, pdu: &[u8]) -> Result<Vec<u16>, PduError> {
        check_function_code(pdu, READ_HOLDING_REGISTERS)?;
        if pdu.len() < 2 {
            return Err(PduError::InvalidResponseLength);
        }

        let byte_count = pdu[1] as usize;
        if byte_count != self.length as usize * 2 || pdu.len() != 2 + byte_count {
            return Err(PduError::InvalidResponseLength);
        }

        Ok(pdu[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }

    pub fn parse_write_response(&self, pdu: &[u8]) -> Result<WriteAck, PduError> {
        check_function_code(pdu, WRITE_MULTIPLE_REGISTERS)?;
        if pdu.len() != 5 {
            return Err(PduError::InvalidResponseLength);
        }

        let actual = WriteAck {
            address: u16::from_be_bytes([pdu[1], pdu[2]]),
            count: u16::from_be_bytes([pdu[3], pdu[4]]),
        };
        let expected = WriteAck {
            address: self.start_addr,
            count: self.length,
        };
        if actual != expected {
            return Err(PduError::WriteEchoMismatch { expected, actual });
        }
        Ok(actual)
    }
}

fn check_function_code(pdu: &[u8], expected: u8) -> Result<(), PduError> {
    let Some(&function_code) = pdu.first() else {
        return Err(PduError::EmptyResponse);
    };

    // Exception responses set the high bit of the function code
    if (function_code & 0x80) != 0 {
        let exception_code = pdu.get(1).copied().unwrap_or(0);
        return Err(PduError::ModbusException(function_code, exception_code));
    }

    if function_code != expected {
        return Err(PduError::UnexpectedFunctionCode(expected, function_code));
    }
    Ok(())
}
