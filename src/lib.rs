#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod fmt;

mod bus;
mod command;
pub mod config;
mod controller;
mod device;
mod driver;
pub mod ds18b20;
#[cfg(test)]
mod fake;
mod filter;
mod relay;
mod result;
mod rom;
mod sensor;
mod setpoint;
mod thermostat;

pub use bus::{Bus, Inverted};
pub use command::{BridgeCommand, Command, OpCode, Register};
pub use controller::{Controller, ControllerState, Drive, Mode};
pub use device::Device;
pub use driver::{BridgeConfig, BridgeStatus, Driver};
pub use ds18b20::{Ds18b20, Resolution, Scratchpad, SensorConfig};
pub use filter::AverageWindow;
pub use relay::{Actuator, Relays};
pub use result::Error;
pub use rom::{RomCode, RomCodeError};
pub use sensor::Sensor;
pub use setpoint::{Preset, SetpointConfig, Units};
pub use thermostat::{Fault, Report, RunState, Thermostat};

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected as 0x8C) lookup table
pub static CRC8_TABLE: [u8; 256] = crc8_table();

const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x01 != 0 {
                (crc >> 1) ^ 0x8C
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    data.iter()
        .fold(crc, |crc, byte| CRC8_TABLE[(crc ^ byte) as usize])
}

pub fn compute_crc8(data: &[u8]) -> u8 {
    compute_partial_crc8(0, data)
}

/// Checksum over `length` bytes of `data` starting at `offset`
///
/// Returns `None` for an empty or out of bounds range.
pub fn checksum(data: &[u8], offset: usize, length: usize) -> Option<u8> {
    let end = offset.checked_add(length)?;
    data.get(offset..end)
        .filter(|range| !range.is_empty())
        .map(compute_crc8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_published_values() {
        assert_eq!(&CRC8_TABLE[..8], &[0, 94, 188, 226, 97, 63, 221, 131]);
        assert_eq!(CRC8_TABLE[0x80], 140);
        assert_eq!(CRC8_TABLE[0xFF], 53);
    }

    #[test]
    fn rom_fixture_last_byte_is_crc() {
        // Example ROM from the DS18B20 datasheet CRC walkthrough
        let rom = [0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00, 0xA2];
        assert_eq!(compute_crc8(&rom[..7]), rom[7]);
        assert_eq!(compute_crc8(&rom), 0);
    }

    #[test]
    fn scratchpad_fixture_last_byte_is_crc() {
        let scratchpad = [0x91, 0x01, 0x4B, 0x46, 0x7F, 0xFF, 0x0F, 0x10, 0x25];
        assert_eq!(checksum(&scratchpad, 0, 8), Some(scratchpad[8]));
    }

    #[test]
    fn single_bit_flip_changes_crc() {
        let data = [0x28, 0xFF, 0x4C, 0x1A, 0x63, 0x16, 0x04];
        let reference = compute_crc8(&data);
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data;
                flipped[byte] ^= 1 << bit;
                assert_ne!(compute_crc8(&flipped), reference);
            }
        }
    }

    #[test]
    fn checksum_rejects_bad_ranges() {
        let data = [1u8, 2, 3];
        assert_eq!(checksum(&data, 0, 0), None);
        assert_eq!(checksum(&data, 2, 2), None);
        assert_eq!(checksum(&[], 0, 1), None);
        assert_eq!(checksum(&data, 1, 2), Some(compute_crc8(&data[1..])));
    }

    #[test]
    fn partial_crc_chains() {
        let data = [0x10, 0x20, 0x30, 0x40];
        let head = compute_partial_crc8(0, &data[..2]);
        assert_eq!(compute_partial_crc8(head, &data[2..]), compute_crc8(&data));
    }
}
