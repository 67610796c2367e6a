//! RS01 holding-register map.
//!
//! Addresses and block sizes match the module firmware and never change at
//! runtime. Three blocks are read in one request each: basic information
//! (0x0000, 6 registers), measurement data (0x0006, 11 registers) and
//! measurement configuration (0x0011, 6 registers).

/// Expected content of [`PID`]. The top two bits encode the SKU family
/// (00: SEN, 01: DFR, 10: TEL), the rest is the product number (SEN0489).
pub const RS01_PID: u16 = 0x01E9;
/// Factory VID (DFRobot).
pub const RS01_VID: u16 = 0x3343;
/// Factory slave address.
pub const DEFAULT_SLAVE_ADDRESS: u8 = 0x0E;

// Basic information
pub const PID: u16 = 0x0000;
pub const VID: u16 = 0x0001;
pub const SLAVE_ADDRESS: u16 = 0x0002;
pub const BAUD_RATE: u16 = 0x0003;
pub const CHECKBIT_STOPBIT: u16 = 0x0004;
/// Firmware version, 0x1000 is V1.0.0.0
pub const VERSION: u16 = 0x0005;

pub const BASIC_INFO_BASE: u16 = PID;
pub const BASIC_INFO_LEN: u16 = 6;

// Measurement data
pub const TARGET_COUNT: u16 = 0x0006;
pub const DISTANCE_TARGET1: u16 = 0x0007;
pub const INTENSITY_TARGET1: u16 = 0x0008;
pub const DISTANCE_TARGET2: u16 = 0x0009;
pub const INTENSITY_TARGET2: u16 = 0x000A;
pub const DISTANCE_TARGET3: u16 = 0x000B;
pub const INTENSITY_TARGET3: u16 = 0x000C;
pub const DISTANCE_TARGET4: u16 = 0x000D;
pub const INTENSITY_TARGET4: u16 = 0x000E;
pub const DISTANCE_TARGET5: u16 = 0x000F;
pub const INTENSITY_TARGET5: u16 = 0x0010;

pub const MEASUREMENT_BASE: u16 = TARGET_COUNT;
pub const MEASUREMENT_LEN: u16 = 11;
pub const MAX_TARGETS: usize = 5;

// Measurement configuration
pub const START_POSITION: u16 = 0x0011;
pub const STOP_POSITION: u16 = 0x0012;
pub const START_THRESHOLD: u16 = 0x0013;
pub const END_THRESHOLD: u16 = 0x0014;
pub const SENSITIVITY: u16 = 0x0015;
pub const COMPARISON_OFFSET: u16 = 0x0016;

pub const CONFIG_BASE: u16 = START_POSITION;
pub const CONFIG_LEN: u16 = 6;

/// Writing 0 here restores every register to its factory value.
pub const FACTORY_RESET: u16 = 0x0017;

// Accepted parameter ranges (inclusive)
pub const POSITION_MIN: u16 = 0x0046;
pub const POSITION_MAX: u16 = 0x19C8;
pub const THRESHOLD_MIN: u16 = 0x0064;
pub const THRESHOLD_MAX: u16 = 0x2710;
pub const SENSITIVITY_MAX: u16 = 0x0004;

// Factory configuration
pub const DEFAULT_START_POSITION: u16 = 0x00C8;
pub const DEFAULT_STOP_POSITION: u16 = 0x1770;
pub const DEFAULT_START_THRESHOLD: u16 = 0x0190;
pub const DEFAULT_END_THRESHOLD: u16 = 0x0190;
pub const DEFAULT_SENSITIVITY: u16 = 0x0002;
pub const DEFAULT_COMPARISON_OFFSET: i16 = 0;
