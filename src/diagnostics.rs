//! Diagnostics sink handed to the driver at construction.
//!
//! Nothing here touches process-wide state unless the caller picks
//! [`LogDiagnostics`], which forwards to whatever `log` backend is installed.

use std::fmt::Write as _;

/// Direction of a raw RTU frame on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

pub trait Diagnostics: Send {
    /// A failed or noteworthy driver operation.
    fn info(&self, operation: &str, message: &str);

    /// Raw frame dump. Ignored unless the sink opts in.
    fn frame(&self, _direction: Direction, _bytes: &[u8]) {}
}

/// Default sink: drops everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn info(&self, _operation: &str, _message: &str) {}
}

/// Forwards operation messages to `log::info!` and frame dumps to `log::trace!`.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn info(&self, operation: &str, message: &str) {
        log::info!(target: "rs01_radar", "{operation}: {message}");
    }

    fn frame(&self, direction: Direction, bytes: &[u8]) {
        if log::log_enabled!(target: "rs01_radar", log::Level::Trace) {
            let arrow = match direction {
                Direction::Sent => "->",
                Direction::Received => "<-",
            };
            log::trace!(target: "rs01_radar", "{arrow} {}", hex(bytes));
        }
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_is_space_separated_uppercase() {
        assert_eq!(hex(&[0x0E, 0x03, 0xA0]), "0E 03 A0");
        assert_eq!(hex(&[]), "");
    }
}
