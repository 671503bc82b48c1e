//! Simulated DS2482 with a single DS18B20 on its 1-Wire channel.

use crate::{compute_crc8, Bus};
use core::cell::RefCell;
use embedded_hal::delay::DelayNs;
use std::collections::VecDeque;
use std::rc::Rc;

pub const ROM: [u8; 8] = [0x28, 0xFF, 0x4C, 0x1A, 0x63, 0x16, 0x04, 0xC5];

/// Scratchpad image with a valid CRC
pub fn scratchpad(raw_temperature: u16, config: u8) -> [u8; 9] {
    let [lsb, msb] = raw_temperature.to_le_bytes();
    let mut image = [lsb, msb, 0x4B, 0x46, config, 0xFF, 0x0C, 0x10, 0];
    image[8] = compute_crc8(&image[..8]);
    image
}

/// Same image with its CRC byte broken
pub fn corrupted(mut image: [u8; 9]) -> [u8; 9] {
    image[8] ^= 0x5A;
    image
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FakeError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pointer {
    Status,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Rom,
    Function,
    WriteScratchpad(usize),
}

pub struct State {
    pub bridge_present: bool,
    pub probe_present: bool,
    pub parasite: bool,
    pub rom: [u8; 8],
    /// Served in order by read-scratchpad; the last one repeats
    pub scratchpads: VecDeque<[u8; 9]>,
    /// Busy status reads reported after each 1-Wire command
    pub busy_reads: u8,
    /// Writes accepted before the bus starts failing
    pub fail_after_writes: Option<usize>,

    pub writes: Vec<Vec<u8>>,
    pub line_bytes: Vec<u8>,
    pub pulled_up_bytes: Vec<u8>,
    pub configured: Vec<u8>,
    pub conversions: usize,
    pub scratchpad_reads: usize,
    pub copies: usize,

    pointer: Pointer,
    status: u8,
    data: u8,
    configuration: u8,
    pending_busy: u8,
    strong_pullup: bool,
    phase: Phase,
    out: VecDeque<u8>,
    power_query: bool,
}

impl Default for State {
    fn default() -> Self {
        State {
            bridge_present: true,
            probe_present: true,
            parasite: false,
            rom: ROM,
            scratchpads: VecDeque::from([scratchpad(0x0191, 0x5F)]),
            busy_reads: 1,
            fail_after_writes: None,
            writes: Vec::new(),
            line_bytes: Vec::new(),
            pulled_up_bytes: Vec::new(),
            configured: Vec::new(),
            conversions: 0,
            scratchpad_reads: 0,
            copies: 0,
            pointer: Pointer::Status,
            status: 0,
            data: 0,
            configuration: 0,
            pending_busy: 0,
            strong_pullup: false,
            phase: Phase::Idle,
            out: VecDeque::new(),
            power_query: false,
        }
    }
}

impl State {
    fn line_reset(&mut self) {
        self.out.clear();
        self.power_query = false;
        self.phase = if self.probe_present { Phase::Rom } else { Phase::Idle };
        self.status = 0x08 | if self.probe_present { 0x02 } else { 0 };
    }

    fn line_write(&mut self, byte: u8) {
        self.line_bytes.push(byte);
        if self.strong_pullup {
            self.pulled_up_bytes.push(byte);
            self.strong_pullup = false;
        }
        self.phase = match (self.phase, byte) {
            (Phase::Rom, 0x33) => {
                self.out.extend(self.rom);
                Phase::Idle
            }
            (Phase::Rom, 0xCC) => Phase::Function,
            (Phase::Function, 0x44) => {
                self.conversions += 1;
                Phase::Idle
            }
            (Phase::Function, 0xBE) => {
                self.scratchpad_reads += 1;
                let image = if self.scratchpads.len() > 1 {
                    self.scratchpads.pop_front()
                } else {
                    self.scratchpads.front().copied()
                };
                self.out.extend(image.unwrap_or([0xFF; 9]));
                Phase::Idle
            }
            (Phase::Function, 0x4E) => Phase::WriteScratchpad(0),
            (Phase::Function, 0x48) => {
                self.copies += 1;
                Phase::Idle
            }
            (Phase::Function, 0xB4) => {
                self.power_query = true;
                Phase::Idle
            }
            (Phase::WriteScratchpad(n), _) => {
                self.configured.push(byte);
                if n < 2 {
                    Phase::WriteScratchpad(n + 1)
                } else {
                    Phase::Idle
                }
            }
            _ => Phase::Idle,
        };
    }

    fn line_read(&mut self) -> u8 {
        self.out.pop_front().unwrap_or(0xFF)
    }

    fn line_read_bit(&mut self) -> bool {
        if self.power_query {
            !self.parasite
        } else {
            self.line_read() & 0x01 != 0
        }
    }

    fn one_wire_done(&mut self) {
        self.pointer = Pointer::Status;
        self.pending_busy = self.busy_reads;
    }
}

/// Shared handle, so tests can inspect the chip while a driver owns a clone
#[derive(Clone, Default)]
pub struct FakeBridge(pub Rc<RefCell<State>>);

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::cell::RefMut<'_, State> {
        self.0.borrow_mut()
    }

    /// Serve only this temperature from now on
    pub fn set_temperature(&self, raw: u16) {
        let mut state = self.state();
        state.scratchpads = VecDeque::from([scratchpad(raw, 0x5F)]);
    }
}

impl Bus for FakeBridge {
    type Error = FakeError;

    fn write(&mut self, bytes: &[u8]) -> Result<(), FakeError> {
        let mut state = self.state();
        if let Some(remaining) = state.fail_after_writes.as_mut() {
            if *remaining == 0 {
                return Err(FakeError);
            }
            *remaining -= 1;
        }
        state.writes.push(bytes.to_vec());
        if !state.bridge_present {
            return Ok(());
        }
        match bytes {
            [0xF0] => {
                state.status = 0x18;
                state.configuration = 0;
                state.strong_pullup = false;
                state.pointer = Pointer::Status;
            }
            [0xD2, config] => {
                if config >> 4 == !config & 0x0F {
                    state.configuration = config & 0x0F;
                    state.strong_pullup = config & 0x04 != 0;
                    state.status &= !0x10;
                }
                state.pointer = Pointer::Configuration;
            }
            [0xB4] => {
                state.line_reset();
                state.one_wire_done();
            }
            [0xA5, byte] => {
                state.line_write(*byte);
                state.one_wire_done();
            }
            [0x96] => {
                state.data = state.line_read();
                state.one_wire_done();
            }
            [0x87, slot] => {
                let bit = if slot & 0x80 != 0 {
                    state.line_read_bit()
                } else {
                    false
                };
                state.status = (state.status & !0x20) | if bit { 0x20 } else { 0 };
                state.one_wire_done();
            }
            [0xE1, 0xF0] => state.pointer = Pointer::Status,
            [0xE1, 0xE1] => state.pointer = Pointer::Data,
            [0xE1, 0xC3] => state.pointer = Pointer::Configuration,
            _ => {}
        }
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), FakeError> {
        let mut state = self.state();
        if state.fail_after_writes == Some(0) {
            return Err(FakeError);
        }
        for b in buffer {
            *b = if !state.bridge_present {
                0x00
            } else {
                let pointer = state.pointer;
                match pointer {
                    Pointer::Status if state.pending_busy > 0 => {
                        state.pending_busy -= 1;
                        state.status | 0x01
                    }
                    Pointer::Status => state.status,
                    Pointer::Data => state.data,
                    Pointer::Configuration => state.configuration,
                }
            };
        }
        Ok(())
    }
}

/// Delay that only accumulates the requested time
#[derive(Default)]
pub struct FakeDelay {
    pub waited_ns: u64,
}

impl FakeDelay {
    pub fn waited_ms(&self) -> f64 {
        self.waited_ns as f64 / 1_000_000.0
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns += ns as u64;
    }
}
