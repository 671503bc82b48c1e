//! DS2482 I2C to 1-Wire bridge.
//!
//! The bridge executes 1-Wire primitives on our behalf: we send a function
//! command over I2C, poll the status register until the 1-Wire busy flag
//! clears, and fetch results from the status or read data register.

use crate::command::Register;
use crate::config::MAX_BUSY_POLLS;
use crate::{BridgeCommand, Bus, Command, Error, OpCode};
use core::fmt::Debug;

/// Timing byte for the single bit command; 0x80 issues a read time slot
const READ_SLOT: u8 = 0x80;

/// Snapshot of the bridge status register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct BridgeStatus(u8);

impl BridgeStatus {
    pub const BUSY: u8 = 0x01;
    pub const PRESENCE: u8 = 0x02;
    pub const SHORT: u8 = 0x04;
    pub const LOGIC_LEVEL: u8 = 0x08;
    pub const DEVICE_RESET: u8 = 0x10;
    pub const SINGLE_BIT: u8 = 0x20;
    pub const TRIPLET_SECOND_BIT: u8 = 0x40;
    pub const BRANCH_DIRECTION: u8 = 0x80;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    const fn has(&self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// 1-Wire line is executing a command
    pub const fn is_busy(&self) -> bool {
        self.has(Self::BUSY)
    }

    /// A slave answered the last 1-Wire reset
    pub const fn presence(&self) -> bool {
        self.has(Self::PRESENCE)
    }

    pub const fn short_detected(&self) -> bool {
        self.has(Self::SHORT)
    }

    pub const fn logic_level(&self) -> bool {
        self.has(Self::LOGIC_LEVEL)
    }

    /// Set after a device reset until the first configuration write
    pub const fn device_reset(&self) -> bool {
        self.has(Self::DEVICE_RESET)
    }

    /// Line level sampled during the last single bit time slot
    pub const fn single_bit(&self) -> bool {
        self.has(Self::SINGLE_BIT)
    }

    pub const fn triplet_second_bit(&self) -> bool {
        self.has(Self::TRIPLET_SECOND_BIT)
    }

    pub const fn branch_direction(&self) -> bool {
        self.has(Self::BRANCH_DIRECTION)
    }
}

/// Bridge configuration bits
///
/// The register only accepts a write whose upper nibble is the one's
/// complement of the lower nibble, see [`BridgeConfig::encode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct BridgeConfig(u8);

impl BridgeConfig {
    pub const ACTIVE_PULLUP: Self = Self(0x01);
    pub const STRONG_PULLUP: Self = Self(0x04);
    pub const OVERDRIVE: Self = Self(0x08);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Register image: configuration bits low, their complement high
    pub const fn encode(&self) -> u8 {
        (!self.0 << 4) | (self.0 & 0x0F)
    }
}

pub struct Driver<B: Bus> {
    bus: B,
    busy_poll_limit: u16,
}

impl<E: Debug, B: Bus<Error = E>> Driver<B> {
    pub fn new(bus: B) -> Self {
        Self::with_busy_poll_limit(bus, MAX_BUSY_POLLS)
    }

    /// Uses at most `busy_poll_limit` status reads to wait for a 1-Wire command
    pub fn with_busy_poll_limit(bus: B, busy_poll_limit: u16) -> Self {
        Driver {
            bus,
            busy_poll_limit: busy_poll_limit.max(1),
        }
    }

    pub fn release(self) -> B {
        self.bus
    }

    /// Performs a device reset of the bridge itself
    ///
    /// Returns Err(BridgeNotPresent) unless the status register reports
    /// the reset, which is the only proof that a DS2482 is listening.
    pub fn reset_bridge(&mut self) -> Result<BridgeStatus, Error<E>> {
        self.write_bridge_command(BridgeCommand::DeviceReset, None)?;
        let status = self.read_status()?;
        if status.device_reset() {
            debug!("bridge reset, status {=u8:#x}", status.bits());
            Ok(status)
        } else {
            warn!("bridge reset not acknowledged, status {=u8:#x}", status.bits());
            Err(Error::BridgeNotPresent)
        }
    }

    pub fn write_configuration(&mut self, config: BridgeConfig) -> Result<(), Error<E>> {
        self.write_bridge_command(BridgeCommand::WriteConfiguration, Some(config.encode()))
    }

    /// Arms the strong pullup for the next 1-Wire byte, needed to power
    /// parasitic slaves through conversions and EEPROM writes
    pub fn strong_pullup(&mut self) -> Result<(), Error<E>> {
        self.write_configuration(BridgeConfig::STRONG_PULLUP)
    }

    /// Performs a 1-Wire reset and listens for a presence pulse
    /// Returns Err(NoChannelPresence) if no slave answered
    pub fn reset(&mut self) -> Result<BridgeStatus, Error<E>> {
        self.write_bridge_command(BridgeCommand::ChannelReset, None)?;
        let status = self.wait_idle()?;
        if status.presence() {
            Ok(status)
        } else {
            Err(Error::NoChannelPresence)
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, Error<E>> {
        self.write_bridge_command(BridgeCommand::SingleBit, Some(READ_SLOT))?;
        Ok(self.wait_idle()?.single_bit())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error<E>> {
        self.write_bridge_command(BridgeCommand::WriteByte, Some(byte))?;
        self.wait_idle()?;
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8, Error<E>> {
        self.write_bridge_command(BridgeCommand::ReadByte, None)?;
        self.wait_idle()?;
        self.write_bridge_command(BridgeCommand::SetReadPointer, Some(Register::ReadData.op_code()))?;
        let mut data = [0u8];
        self.bus.read(&mut data)?;
        Ok(data[0])
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), Error<E>> {
        for d in dst {
            *d = self.read_byte()?;
        }
        Ok(())
    }

    pub fn write_command(&mut self, cmd: impl OpCode) -> Result<(), Error<E>> {
        self.write_byte(cmd.op_code())
    }

    /// Addresses every slave on the line
    pub fn skip(&mut self) -> Result<(), Error<E>> {
        self.write_command(Command::SkipRom)
    }

    pub fn reset_write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Error<E>> {
        self.reset()?;
        self.write_bytes(write)?;
        self.read_bytes(read)?;
        Ok(())
    }

    pub fn reset_skip_write_read(
        &mut self,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Error<E>> {
        self.reset()?;
        self.skip()?;
        self.write_bytes(write)?;
        self.read_bytes(read)?;
        Ok(())
    }

    pub fn reset_skip_write_only(&mut self, write: &[u8]) -> Result<(), Error<E>> {
        self.reset()?;
        self.skip()?;
        self.write_bytes(write)?;
        Ok(())
    }

    /// Broadcasts a single function command, arming the strong pullup
    /// right before it when `strong_pullup` is set
    pub fn reset_skip_command(
        &mut self,
        cmd: impl OpCode,
        strong_pullup: bool,
    ) -> Result<(), Error<E>> {
        self.reset()?;
        self.skip()?;
        if strong_pullup {
            self.strong_pullup()?;
        }
        self.write_command(cmd)
    }

    fn write_bridge_command(&mut self, cmd: BridgeCommand, arg: Option<u8>) -> Result<(), Error<E>> {
        match arg {
            Some(arg) => self.bus.write(&[cmd.op_code(), arg])?,
            None => self.bus.write(&[cmd.op_code()])?,
        }
        Ok(())
    }

    fn read_status(&mut self) -> Result<BridgeStatus, Error<E>> {
        let mut status = [0u8];
        self.bus.read(&mut status)?;
        Ok(BridgeStatus::from_bits(status[0]))
    }

    /// Polls the status register until the 1-Wire busy flag clears
    fn wait_idle(&mut self) -> Result<BridgeStatus, Error<E>> {
        for _ in 0..self.busy_poll_limit {
            let status = self.read_status()?;
            if !status.is_busy() {
                return Ok(status);
            }
        }
        error!("1-Wire still busy after {=u16} status reads", self.busy_poll_limit);
        Err(Error::BusBusy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Bus replaying canned reads and recording every write
    #[derive(Default)]
    struct Script {
        written: Vec<Vec<u8>>,
        reads: VecDeque<u8>,
        fail_writes: bool,
    }

    impl Script {
        fn reading(reads: &[u8]) -> Self {
            Script {
                reads: reads.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    #[derive(Debug, PartialEq)]
    struct Nak;

    impl Bus for Script {
        type Error = Nak;

        fn write(&mut self, bytes: &[u8]) -> Result<(), Nak> {
            if self.fail_writes {
                return Err(Nak);
            }
            self.written.push(bytes.to_vec());
            Ok(())
        }

        fn read(&mut self, buffer: &mut [u8]) -> Result<(), Nak> {
            for b in buffer {
                *b = self.reads.pop_front().ok_or(Nak)?;
            }
            Ok(())
        }
    }

    #[test]
    fn configuration_is_nibble_doubled() {
        assert_eq!(BridgeConfig::empty().encode(), 0xF0);
        assert_eq!(BridgeConfig::ACTIVE_PULLUP.encode(), 0xE1);
        assert_eq!(BridgeConfig::STRONG_PULLUP.encode(), 0xB4);
        assert_eq!(BridgeConfig::OVERDRIVE.encode(), 0x78);
        let both = BridgeConfig::ACTIVE_PULLUP.union(BridgeConfig::STRONG_PULLUP);
        assert!(both.contains(BridgeConfig::STRONG_PULLUP));
        assert_eq!(both.encode(), 0xA5);
        for bits in 0..16u8 {
            let encoded = BridgeConfig(bits).encode();
            assert_eq!(encoded >> 4, !encoded & 0x0F);
        }
    }

    #[test]
    fn status_flags() {
        let status = BridgeStatus::from_bits(0x18);
        assert!(status.device_reset());
        assert!(status.logic_level());
        assert!(!status.is_busy());
        assert!(!status.presence());
        assert!(BridgeStatus::from_bits(0xE6).short_detected());
        assert!(BridgeStatus::from_bits(0xE6).triplet_second_bit());
        assert!(BridgeStatus::from_bits(0xE6).branch_direction());
    }

    #[test]
    fn bridge_reset_requires_reset_flag() {
        let mut driver = Driver::new(Script::reading(&[0x18]));
        assert_eq!(driver.reset_bridge(), Ok(BridgeStatus::from_bits(0x18)));
        assert_eq!(driver.release().written, [vec![0xF0]]);

        let mut driver = Driver::new(Script::reading(&[0x08]));
        assert_eq!(driver.reset_bridge(), Err(Error::BridgeNotPresent));
    }

    #[test]
    fn channel_reset_waits_and_checks_presence() {
        let mut driver = Driver::new(Script::reading(&[0x01, 0x01, 0x0A]));
        assert!(driver.reset().unwrap().presence());
        assert_eq!(driver.release().written, [vec![0xB4]]);

        let mut driver = Driver::new(Script::reading(&[0x01, 0x08]));
        assert_eq!(driver.reset(), Err(Error::NoChannelPresence));
    }

    #[test]
    fn read_byte_polls_then_reads_data_register() {
        let mut driver = Driver::new(Script::reading(&[0x01, 0x00, 0xAB]));
        assert_eq!(driver.read_byte(), Ok(0xAB));
        assert_eq!(driver.release().written, [vec![0x96], vec![0xE1, 0xE1]]);
    }

    #[test]
    fn write_byte_polls_until_idle() {
        let mut script = Script::reading(&[0x01, 0x01, 0x01, 0x08]);
        let mut driver = Driver::new(&mut script);
        driver.write_byte(0xCC).unwrap();
        assert_eq!(script.written, [vec![0xA5, 0xCC]]);
        assert!(script.reads.is_empty());
    }

    #[test]
    fn busy_poll_is_bounded() {
        let mut driver = Driver::with_busy_poll_limit(Script::reading(&[0x01; 8]), 5);
        assert_eq!(driver.write_byte(0x44), Err(Error::BusBusy));
        assert_eq!(driver.release().reads.len(), 3);
    }

    #[test]
    fn single_bit_uses_read_slot() {
        let mut driver = Driver::new(Script::reading(&[0x20, 0x00]));
        assert_eq!(driver.read_bit(), Ok(true));
        assert_eq!(driver.read_bit(), Ok(false));
        assert_eq!(driver.release().written, [vec![0x87, 0x80], vec![0x87, 0x80]]);
    }

    #[test]
    fn strong_pullup_precedes_command() {
        let mut driver = Driver::new(Script::reading(&[0x02, 0x00, 0x00]));
        driver.reset_skip_command(Command::SkipRom, true).unwrap();
        assert_eq!(
            driver.release().written,
            [vec![0xB4], vec![0xA5, 0xCC], vec![0xD2, 0xB4], vec![0xA5, 0xCC]]
        );
    }

    #[test]
    fn transport_errors_propagate() {
        let mut driver = Driver::new(Script {
            fail_writes: true,
            ..Default::default()
        });
        assert_eq!(driver.reset(), Err(Error::Transport(Nak)));
    }
}
