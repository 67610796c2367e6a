use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::{Transport, TransportError};

/// Line settings for the serial port the radar hangs off. Passed through to
/// `serialport` unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// OS device path, e.g. `/dev/ttyAMA0`, `/dev/ttyUSB0` or `COM3`
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// XON/XOFF software flow control
    pub flow_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyAMA0".to_string(),
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
        }
    }
}

impl SerialConfig {
    pub fn open(&self, response_timeout: Duration) -> Result<Box<dyn SerialPort>, TransportError> {
        let flow_control = if self.flow_control {
            FlowControl::Software
        } else {
            FlowControl::None
        };

        let port = serialport::new(self.port.as_str(), self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(flow_control)
            .timeout(response_timeout)
            .open()?;
        Ok(port)
    }
}

impl Transport for Box<dyn SerialPort> {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.write_all(frame)?;
        self.flush()
    }

    fn receive_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.read_exact(buf)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_line_settings_are_115200_8n1() {
        let config = SerialConfig::default();
        assert_eq!(config.port, "/dev/ttyAMA0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert!(!config.flow_control);
    }
}
