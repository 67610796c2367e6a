#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use rs01_radar::registers::*;
use rs01_radar::{crc16, Diagnostics, Rs01, Timing, Transport};

pub const REGISTER_COUNT: usize = FACTORY_RESET as usize + 1;

pub struct DeviceState {
    pub address: u8,
    pub registers: [u16; REGISTER_COUNT],
    /// Never answer, as if unplugged
    pub silent: bool,
    /// Answer every write with a "slave device failure" exception
    pub reject_writes: bool,
    /// Every well-formed write, as (start address, values)
    pub writes: Vec<(u16, Vec<u16>)>,
    pub requests: usize,
    pending: VecDeque<u8>,
}

fn factory_registers(address: u8) -> [u16; REGISTER_COUNT] {
    let mut regs = [0u16; REGISTER_COUNT];
    regs[PID as usize] = RS01_PID;
    regs[VID as usize] = RS01_VID;
    regs[SLAVE_ADDRESS as usize] = address as u16;
    regs[BAUD_RATE as usize] = 0x0008;
    regs[CHECKBIT_STOPBIT as usize] = 0x0001;
    regs[VERSION as usize] = 0x1000;
    regs[START_POSITION as usize] = DEFAULT_START_POSITION;
    regs[STOP_POSITION as usize] = DEFAULT_STOP_POSITION;
    regs[START_THRESHOLD as usize] = DEFAULT_START_THRESHOLD;
    regs[END_THRESHOLD as usize] = DEFAULT_END_THRESHOLD;
    regs[SENSITIVITY as usize] = DEFAULT_SENSITIVITY;
    regs[COMPARISON_OFFSET as usize] = DEFAULT_COMPARISON_OFFSET as u16;
    regs
}

/// An RS01 on the other end of the wire. Clones share the same device, so a
/// test can keep one handle while the driver owns another.
#[derive(Clone)]
pub struct SimulatedRs01 {
    state: Rc<RefCell<DeviceState>>,
}

impl SimulatedRs01 {
    pub fn new(address: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(DeviceState {
                address,
                registers: factory_registers(address),
                silent: false,
                reject_writes: false,
                writes: Vec::new(),
                requests: 0,
                pending: VecDeque::new(),
            })),
        }
    }

    pub fn set_registers(&self, base: u16, values: &[u16]) {
        let mut state = self.state.borrow_mut();
        let base = base as usize;
        state.registers[base..base + values.len()].copy_from_slice(values);
    }

    pub fn registers(&self, base: u16, count: u16) -> Vec<u16> {
        let state = self.state.borrow();
        state.registers[base as usize..(base + count) as usize].to_vec()
    }

    pub fn set_silent(&self, silent: bool) {
        self.state.borrow_mut().silent = silent;
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.state.borrow_mut().reject_writes = reject;
    }

    pub fn address(&self) -> u8 {
        self.state.borrow().address
    }

    pub fn writes(&self) -> Vec<(u16, Vec<u16>)> {
        self.state.borrow().writes.clone()
    }

    pub fn requests(&self) -> usize {
        self.state.borrow().requests
    }
}

impl DeviceState {
    fn handle(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        if frame.len() < 4 {
            return None;
        }
        let (body, crc) = frame.split_at(frame.len() - 2);
        if crc16(body).to_le_bytes() != [crc[0], crc[1]] {
            return None;
        }
        if self.silent || body[0] != self.address {
            return None;
        }

        let slave = body[0];
        let function_code = body[1];
        let word = |i: usize| u16::from_be_bytes([body[i], body[i + 1]]);
        let pdu = match function_code {
            0x03 => {
                let (addr, count) = (word(2) as usize, word(4) as usize);
                if addr + count > REGISTER_COUNT {
                    vec![0x83, 0x02]
                } else {
                    let mut pdu = vec![0x03, (count * 2) as u8];
                    for value in &self.registers[addr..addr + count] {
                        pdu.extend_from_slice(&value.to_be_bytes());
                    }
                    pdu
                }
            }
            0x10 => {
                let (addr, count) = (word(2), word(4));
                let values: Vec<u16> = (0..count as usize).map(|i| word(7 + i * 2)).collect();
                if self.reject_writes {
                    vec![0x90, 0x04]
                } else if addr as usize + count as usize > REGISTER_COUNT {
                    vec![0x90, 0x02]
                } else {
                    self.apply_write(addr, &values);
                    let mut pdu = vec![0x10];
                    pdu.extend_from_slice(&addr.to_be_bytes());
                    pdu.extend_from_slice(&count.to_be_bytes());
                    pdu
                }
            }
            other => vec![other | 0x80, 0x01],
        };

        let mut response = vec![slave];
        response.extend_from_slice(&pdu);
        let crc = crc16(&response);
        response.extend_from_slice(&crc.to_le_bytes());
        Some(response)
    }

    fn apply_write(&mut self, addr: u16, values: &[u16]) {
        self.writes.push((addr, values.to_vec()));
        for (i, value) in values.iter().enumerate() {
            let reg = addr + i as u16;
            match reg {
                FACTORY_RESET if *value == 0 => {
                    let address = self.address;
                    self.registers = factory_registers(address);
                }
                FACTORY_RESET => {}
                PID | VID | VERSION => {}
                _ => self.registers[reg as usize] = *value,
            }
        }
        // the reply still goes out under the old address
        let slot = SLAVE_ADDRESS.checked_sub(addr).map(usize::from);
        if let Some(value) = slot.and_then(|i| values.get(i)) {
            self.address = *value as u8;
        }
    }
}

impl Transport for SimulatedRs01 {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.requests += 1;
        if let Some(response) = state.handle(frame) {
            state.pending.extend(response);
        }
        Ok(())
    }

    fn receive_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.pending.len() < buf.len() {
            state.pending.clear();
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no response"));
        }
        for byte in buf.iter_mut() {
            *byte = state.pending.pop_front().unwrap();
        }
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.state.borrow_mut().pending.clear();
        Ok(())
    }
}

/// Replays canned response bytes and keeps what the master sent.
#[derive(Default)]
pub struct ScriptedTransport {
    pub sent: Vec<Vec<u8>>,
    pub replies: VecDeque<u8>,
}

impl ScriptedTransport {
    pub fn replying(bytes: &[u8]) -> Self {
        Self {
            sent: Vec::new(),
            replies: bytes.iter().copied().collect(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn receive_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.replies.len() < buf.len() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no response"));
        }
        for byte in buf.iter_mut() {
            *byte = self.replies.pop_front().unwrap();
        }
        Ok(())
    }
}

/// Appends the CRC to a hand-written frame.
pub fn with_crc(body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    frame.extend_from_slice(&crc16(body).to_le_bytes());
    frame
}

#[derive(Clone, Default)]
pub struct RecordingDiagnostics {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn info(&self, operation: &str, message: &str) {
        self.messages.lock().unwrap().push(format!("{operation}: {message}"));
    }
}

impl RecordingDiagnostics {
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

pub fn connect(device: &SimulatedRs01, slave: u8) -> Rs01<SimulatedRs01> {
    Rs01::builder()
        .slave_address(slave)
        .timing(Timing::none())
        .build_with_transport(device.clone())
        .unwrap()
}

pub fn connect_recording(
    device: &SimulatedRs01,
    slave: u8,
) -> (Rs01<SimulatedRs01>, RecordingDiagnostics) {
    let diagnostics = RecordingDiagnostics::default();
    let driver = Rs01::builder()
        .slave_address(slave)
        .timing(Timing::none())
        .diagnostics(diagnostics.clone())
        .build_with_transport(device.clone())
        .unwrap();
    (driver, diagnostics)
}
