//! RS01 radar driver.
//!
//! Every operation is one blocking request over the RTU link. Failures never
//! escape a public operation: they are reported to the [`Diagnostics`] sink
//! and turned into an empty `Vec`, `None` or `false`.

use std::thread;
use std::time::Duration;

use serialport::SerialPort;

use crate::diagnostics::{Diagnostics, NoopDiagnostics};
use crate::registers::*;
use crate::types::{framing_word, ConfigField};
use crate::*;

/// How long the RTU master waits for a reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Fixed pauses the module needs around certain operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Before the first request, while the module powers up
    pub power_on: Duration,
    /// After a baud-rate write
    pub baud_change: Duration,
    /// After a configuration block write
    pub config_apply: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            power_on: Duration::from_secs(1),
            baud_change: Duration::from_millis(500),
            config_apply: Duration::from_secs(1),
        }
    }
}

impl Timing {
    /// No pauses at all. Useful against simulated devices.
    pub fn none() -> Self {
        Self {
            power_on: Duration::ZERO,
            baud_change: Duration::ZERO,
            config_apply: Duration::ZERO,
        }
    }
}

pub struct Rs01Builder {
    slave_address: Option<u8>,
    serial: SerialConfig,
    response_timeout: Duration,
    timing: Timing,
    diagnostics: Box<dyn Diagnostics>,
}

impl Rs01Builder {
    pub fn slave_address(mut self, addr: u8) -> Self {
        self.slave_address = Some(addr);
        self
    }

    pub fn port(mut self, port: &str) -> Self {
        self.serial.port = port.to_string();
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.serial.baud_rate = baud_rate;
        self
    }

    pub fn byte_size(mut self, data_bits: DataBits) -> Self {
        self.serial.data_bits = data_bits;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.serial.parity = parity;
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.serial.stop_bits = stop_bits;
        self
    }

    pub fn flow_control(mut self, enabled: bool) -> Self {
        self.serial.flow_control = enabled;
        self
    }

    pub fn serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Opens the configured serial port. Does not talk to the module yet.
    pub fn open(self) -> Result<Rs01<Box<dyn SerialPort>>, TransportError> {
        let port = self.serial.open(self.response_timeout)?;
        self.build_with_transport(port)
    }

    /// Wraps an already open transport. The response timeout is then the
    /// transport's business.
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<Rs01<T>, TransportError> {
        let slave_address = self.slave_address.ok_or(TransportError::SlaveAddressMissing)?;
        Ok(Rs01 {
            master: RtuMaster::new(transport, self.diagnostics),
            slave_address,
            config: MeasurementConfig::default(),
            timing: self.timing,
        })
    }
}

/// Driver session for one RS01 module.
pub struct Rs01<T> {
    master: RtuMaster<T>,
    slave_address: u8,
    config: MeasurementConfig,
    timing: Timing,
}

impl Rs01<()> {
    pub fn builder() -> Rs01Builder {
        Rs01Builder {
            slave_address: None,
            serial: SerialConfig::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            timing: Timing::default(),
            diagnostics: Box::new(NoopDiagnostics),
        }
    }
}

impl<T: Transport> Rs01<T> {
    /// Waits for the module to power up, then checks the slave address range
    /// and the product id.
    pub fn initialize(&mut self) -> bool {
        pause(self.timing.power_on);

        let mut ok = true;
        if !(1..=247).contains(&self.slave_address) {
            self.info("initialize", &format!("invalid device address {}", self.slave_address));
            ok = false;
        }

        match self.master.read_holding_registers(self.slave_address, PID, 1) {
            Ok(regs) if regs.first() == Some(&RS01_PID) => {}
            Ok(regs) => {
                self.info("initialize", &format!("chip version mismatch: pid {:?}", regs.first()));
                ok = false;
            }
            Err(err) => {
                self.info("initialize", &format!("data bus error: {err}"));
                ok = false;
            }
        }
        ok
    }

    /// `[PID, VID, address, baud-rate code, checkbit/stopbit, version]`, or empty.
    pub fn read_basic_info(&mut self) -> Vec<u16> {
        self.read_registers(BASIC_INFO_BASE, BASIC_INFO_LEN)
    }

    pub fn basic_info(&mut self) -> Option<BasicInfo> {
        BasicInfo::from_registers(&self.read_basic_info())
    }

    /// `[target count, distance1, intensity1, .., distance5, intensity5]`, or empty.
    pub fn read_measurement_data(&mut self) -> Vec<u16> {
        self.read_registers(MEASUREMENT_BASE, MEASUREMENT_LEN)
    }

    pub fn measurement_frame(&mut self) -> Option<MeasurementFrame> {
        MeasurementFrame::from_registers(&self.read_measurement_data())
    }

    /// `[start, stop, start threshold, end threshold, sensitivity, offset]`, or empty.
    /// A complete read also refreshes the cached configuration.
    pub fn read_measurement_config(&mut self) -> Vec<u16> {
        let regs = self.read_registers(CONFIG_BASE, CONFIG_LEN);
        if let Some(config) = MeasurementConfig::from_registers(&regs) {
            self.config = config;
        }
        regs
    }

    pub fn measurement_config(&mut self) -> Option<MeasurementConfig> {
        MeasurementConfig::from_registers(&self.read_measurement_config())
    }

    /// Renames the module. Only `1 < addr < 0xF7` is sent; on success the
    /// session follows the module to its new address.
    pub fn set_address(&mut self, addr: u8) -> bool {
        if !(0x01 < addr && addr < 0xF7) {
            self.info("set_address", &format!("address {addr} out of range"));
            return false;
        }
        if self.write_registers(SLAVE_ADDRESS, &[addr as u16]).is_some() {
            self.slave_address = addr;
            true
        } else {
            self.info("set_address", "set addr failed");
            false
        }
    }

    /// Stores a new baud rate. It takes effect after the module is power cycled,
    /// so the open port keeps its current rate.
    pub fn set_baud_rate_mode(&mut self, mode: BaudRateMode) -> bool {
        if self.write_registers(BAUD_RATE, &[mode.code()]).is_some() {
            pause(self.timing.baud_change);
            true
        } else {
            self.info("set_baud_rate_mode", "set baudrate failed");
            false
        }
    }

    pub fn set_checkbit_stopbit(&mut self, check: CheckBit, stop: StopBit) -> bool {
        let ok = self
            .write_registers(CHECKBIT_STOPBIT, &[framing_word(check, stop)])
            .is_some();
        if !ok {
            self.info("set_checkbit_stopbit", "set checkbit and stopbit failed");
        }
        ok
    }

    /// Writes all six measurement parameters in one transaction.
    ///
    /// The current block is read from the device first; any candidate that
    /// fails its range check keeps the device's value. Returns `None` when
    /// that baseline read fails, in which case nothing is written.
    ///
    /// `comparison_offset` is signed; threshold/offset sums wrap at 16 bits
    /// and must come out positive as an `i16`.
    pub fn set_measurement_parameters(
        &mut self,
        start_position: u16,
        stop_position: u16,
        start_threshold: u16,
        end_threshold: u16,
        sensitivity: u16,
        comparison_offset: i16,
    ) -> Option<ParameterReport> {
        self.apply_measurement_config(MeasurementConfig {
            start_position,
            stop_position,
            start_threshold,
            end_threshold,
            sensitivity,
            comparison_offset,
        })
    }

    pub fn apply_measurement_config(
        &mut self,
        requested: MeasurementConfig,
    ) -> Option<ParameterReport> {
        let regs = self.read_registers(CONFIG_BASE, CONFIG_LEN);
        let Some(baseline) = MeasurementConfig::from_registers(&regs) else {
            self.info("set_measurement_parameters", "read all measurement parameters failed");
            return None;
        };

        let (applied, rejected) = merge_parameters(baseline, &requested);
        if !rejected.is_empty() {
            self.info(
                "set_measurement_parameters",
                &format!("kept device values for {rejected:?}"),
            );
        }

        let written = self.write_registers(CONFIG_BASE, &applied.to_registers()).is_some();
        if written {
            self.config = applied;
        } else {
            self.info("set_measurement_parameters", "set all measurement parameters failed");
            self.config = baseline;
        }
        pause(self.timing.config_apply);

        Some(ParameterReport {
            baseline,
            applied,
            rejected,
            written,
        })
    }

    pub fn restore_factory_settings(&mut self) -> bool {
        let ok = self.write_registers(FACTORY_RESET, &[0x0000]).is_some();
        if !ok {
            self.info("restore_factory_settings", "restore factory setting failed");
        }
        ok
    }

    /// Reads `count` contiguous holding registers. Empty on any failure.
    pub fn read_registers(&mut self, address: u16, count: u16) -> Vec<u16> {
        match self.master.read_holding_registers(self.slave_address, address, count) {
            Ok(regs) => regs,
            Err(err) => {
                self.info("read_registers", &format!("{address:#06x} x{count}: {err}"));
                Vec::new()
            }
        }
    }

    /// Writes contiguous holding registers starting at `address`. `None` on any failure.
    pub fn write_registers(&mut self, address: u16, values: &[u16]) -> Option<WriteAck> {
        match self.master.write_multiple_registers(self.slave_address, address, values) {
            Ok(ack) => Some(ack),
            Err(err) => {
                self.info("write_registers", &format!("{address:#06x} {values:?}: {err}"));
                None
            }
        }
    }

    pub fn slave_address(&self) -> u8 {
        self.slave_address
    }

    /// Last configuration seen on the device, factory defaults until the first read.
    pub fn cached_config(&self) -> MeasurementConfig {
        self.config
    }

    pub fn transport(&self) -> &T {
        self.master.transport()
    }

    /// Ends the session and hands the transport back.
    pub fn into_transport(self) -> T {
        self.master.into_transport()
    }

    fn info(&self, operation: &str, message: &str) {
        self.master.diagnostics().info(operation, message);
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

// Sums are taken as the module does: 16-bit wrapping, read back as signed.
fn positive_sum(a: u16, b: i16) -> bool {
    a.wrapping_add(b as u16) as i16 > 0
}

/// Merges candidates into the baseline, one field at a time in register order.
/// Each bound is checked against the sibling values as they stand at that
/// point, so an accepted start position narrows the stop position check and
/// accepted thresholds feed the offset check.
fn merge_parameters(
    baseline: MeasurementConfig,
    requested: &MeasurementConfig,
) -> (MeasurementConfig, Vec<ConfigField>) {
    let mut cfg = baseline;
    let mut rejected = Vec::new();

    let start = requested.start_position;
    if POSITION_MIN <= start && start <= cfg.stop_position {
        cfg.start_position = start;
    } else {
        rejected.push(ConfigField::StartPosition);
    }

    let stop = requested.stop_position;
    if cfg.start_position <= stop && stop <= POSITION_MAX {
        cfg.stop_position = stop;
    } else {
        rejected.push(ConfigField::StopPosition);
    }

    let threshold = requested.start_threshold;
    if (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&threshold)
        && positive_sum(threshold, cfg.comparison_offset)
    {
        cfg.start_threshold = threshold;
    } else {
        rejected.push(ConfigField::StartThreshold);
    }

    let threshold = requested.end_threshold;
    if (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&threshold)
        && positive_sum(threshold, cfg.comparison_offset)
    {
        cfg.end_threshold = threshold;
    } else {
        rejected.push(ConfigField::EndThreshold);
    }

    if requested.sensitivity <= SENSITIVITY_MAX {
        cfg.sensitivity = requested.sensitivity;
    } else {
        rejected.push(ConfigField::Sensitivity);
    }

    let offset = requested.comparison_offset;
    if positive_sum(cfg.start_threshold, offset) && positive_sum(cfg.end_threshold, offset) {
        cfg.comparison_offset = offset;
    } else {
        rejected.push(ConfigField::ComparisonOffset);
    }

    (cfg, rejected)
}
