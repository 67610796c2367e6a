use crate::registers::*;

/// Baud-rate codes understood by the baud-rate register.
///
/// A new rate is stored by the module but only used after a power cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum BaudRateMode {
    Baud2400 = 0x0001,
    Baud4800 = 0x0002,
    Baud9600 = 0x0003,
    Baud14400 = 0x0004,
    Baud19200 = 0x0005,
    Baud38400 = 0x0006,
    Baud57600 = 0x0007,
    Baud115200 = 0x0008,
    Baud1000000 = 0x0009,
}

impl BaudRateMode {
    pub const ALL: [BaudRateMode; 9] = [
        BaudRateMode::Baud2400,
        BaudRateMode::Baud4800,
        BaudRateMode::Baud9600,
        BaudRateMode::Baud14400,
        BaudRateMode::Baud19200,
        BaudRateMode::Baud38400,
        BaudRateMode::Baud57600,
        BaudRateMode::Baud115200,
        BaudRateMode::Baud1000000,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }

    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRateMode::Baud2400 => 2_400,
            BaudRateMode::Baud4800 => 4_800,
            BaudRateMode::Baud9600 => 9_600,
            BaudRateMode::Baud14400 => 14_400,
            BaudRateMode::Baud19200 => 19_200,
            BaudRateMode::Baud38400 => 38_400,
            BaudRateMode::Baud57600 => 57_600,
            BaudRateMode::Baud115200 => 115_200,
            BaudRateMode::Baud1000000 => 1_000_000,
        }
    }
}

/// Parity setting, stored in the high byte of the checkbit/stopbit register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CheckBit {
    None,
    Even,
    Odd,
}

impl CheckBit {
    fn code(self) -> u16 {
        match self {
            CheckBit::None => 0x0000,
            CheckBit::Even => 0x0001,
            CheckBit::Odd => 0x0002,
        }
    }

    fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0000 => Some(CheckBit::None),
            0x0001 => Some(CheckBit::Even),
            0x0002 => Some(CheckBit::Odd),
            _ => None,
        }
    }
}

/// Stop-bit setting, stored in the low byte of the checkbit/stopbit register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StopBit {
    One,
    Two,
}

impl StopBit {
    fn code(self) -> u16 {
        match self {
            StopBit::One => 0x0001,
            StopBit::Two => 0x0003,
        }
    }

    fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0001 => Some(StopBit::One),
            0x0003 => Some(StopBit::Two),
            _ => None,
        }
    }
}

/// Packs the two framing settings into the register value.
pub(crate) fn framing_word(check: CheckBit, stop: StopBit) -> u16 {
    (check.code() << 8) | stop.code()
}

pub(crate) fn split_framing_word(word: u16) -> (Option<CheckBit>, Option<StopBit>) {
    (CheckBit::from_code(word >> 8), StopBit::from_code(word & 0x00FF))
}

/// Identity and line settings of the module, as stored in registers 0x0000..0x0005.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicInfo {
    pub pid: u16,
    pub vid: u16,
    pub slave_address: u16,
    /// Raw baud-rate code; see [`BaudRateMode::from_code`]
    pub baud_rate_code: u16,
    /// Raw checkbit/stopbit word
    pub framing_code: u16,
    /// 0x1000 is V1.0.0.0
    pub version: u16,
}

impl BasicInfo {
    pub fn from_registers(regs: &[u16]) -> Option<Self> {
        let [pid, vid, slave_address, baud_rate_code, framing_code, version] = *regs else {
            return None;
        };
        Some(Self {
            pid,
            vid,
            slave_address,
            baud_rate_code,
            framing_code,
            version,
        })
    }

    pub fn baud_rate(&self) -> Option<BaudRateMode> {
        BaudRateMode::from_code(self.baud_rate_code)
    }

    pub fn check_bit(&self) -> Option<CheckBit> {
        split_framing_word(self.framing_code).0
    }

    pub fn stop_bit(&self) -> Option<StopBit> {
        split_framing_word(self.framing_code).1
    }

    /// Firmware version as four nibbles, most significant first.
    pub fn version_parts(&self) -> [u8; 4] {
        let v = self.version;
        [(v >> 12) as u8 & 0xF, (v >> 8) as u8 & 0xF, (v >> 4) as u8 & 0xF, v as u8 & 0xF]
    }
}

/// One detected object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Target {
    pub distance: u16,
    pub intensity: u16,
}

/// One measurement cycle. Slots past `target_count` hold stale values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasurementFrame {
    pub target_count: u16,
    pub slots: [Target; MAX_TARGETS],
}

impl MeasurementFrame {
    pub fn from_registers(regs: &[u16]) -> Option<Self> {
        if regs.len() != MEASUREMENT_LEN as usize {
            return None;
        }
        let mut slots = [Target::default(); MAX_TARGETS];
        for (slot, pair) in slots.iter_mut().zip(regs[1..].chunks_exact(2)) {
            *slot = Target {
                distance: pair[0],
                intensity: pair[1],
            };
        }
        Some(Self {
            target_count: regs[0],
            slots,
        })
    }

    /// The targets the module actually reported this cycle.
    pub fn detections(&self) -> &[Target] {
        let count = (self.target_count as usize).min(MAX_TARGETS);
        &self.slots[..count]
    }
}

/// Contents of the configuration block (0x0011..0x0016).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeasurementConfig {
    pub start_position: u16,
    pub stop_position: u16,
    pub start_threshold: u16,
    pub end_threshold: u16,
    pub sensitivity: u16,
    /// Signed on the device, transported as its two's-complement word
    pub comparison_offset: i16,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            start_position: DEFAULT_START_POSITION,
            stop_position: DEFAULT_STOP_POSITION,
            start_threshold: DEFAULT_START_THRESHOLD,
            end_threshold: DEFAULT_END_THRESHOLD,
            sensitivity: DEFAULT_SENSITIVITY,
            comparison_offset: DEFAULT_COMPARISON_OFFSET,
        }
    }
}

impl MeasurementConfig {
    pub fn from_registers(regs: &[u16]) -> Option<Self> {
        let [start_position, stop_position, start_threshold, end_threshold, sensitivity, offset] =
            *regs
        else {
            return None;
        };
        Some(Self {
            start_position,
            stop_position,
            start_threshold,
            end_threshold,
            sensitivity,
            comparison_offset: offset as i16,
        })
    }

    pub fn to_registers(&self) -> [u16; CONFIG_LEN as usize] {
        [
            self.start_position,
            self.stop_position,
            self.start_threshold,
            self.end_threshold,
            self.sensitivity,
            self.comparison_offset as u16,
        ]
    }
}

/// A field of [`MeasurementConfig`], in the order candidates are checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
    StartPosition,
    StopPosition,
    StartThreshold,
    EndThreshold,
    Sensitivity,
    ComparisonOffset,
}

/// Outcome of a parameter update: which candidates were kept, and whether the
/// merged block reached the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterReport {
    /// Configuration read back from the device before merging
    pub baseline: MeasurementConfig,
    /// Configuration sent to the device
    pub applied: MeasurementConfig,
    /// Candidates that failed their range check, in check order
    pub rejected: Vec<ConfigField>,
    pub written: bool,
}

impl ParameterReport {
    pub fn is_accepted(&self, field: ConfigField) -> bool {
        !self.rejected.contains(&field)
    }
}
