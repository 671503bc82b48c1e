use crate::{compute_crc8, Bus, Command, Driver, Error, OpCode};
use core::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    ops::Deref,
    str::FromStr,
};

/// Factory-lasered 64-bit identifier: family code, 48-bit serial, CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct RomCode {
    raw: [u8; Self::BYTES],
}

impl From<[u8; RomCode::BYTES]> for RomCode {
    fn from(raw: [u8; RomCode::BYTES]) -> Self {
        RomCode { raw }
    }
}

impl From<RomCode> for [u8; RomCode::BYTES] {
    fn from(rom: RomCode) -> [u8; RomCode::BYTES] {
        rom.raw
    }
}

impl Deref for RomCode {
    type Target = [u8; Self::BYTES];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl AsRef<[u8]> for RomCode {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

impl RomCode {
    /// The length of a ROM code in bytes
    pub const BYTES: usize = 8;

    pub fn family_code(&self) -> u8 {
        self.raw[0]
    }

    pub fn serial(&self) -> &[u8] {
        &self.raw[1..7]
    }

    pub fn crc(&self) -> u8 {
        self.raw[7]
    }

    /// CRC over the family code and serial number
    pub fn compute_crc8(&self) -> u8 {
        compute_crc8(&self.raw[..7])
    }

    pub fn validate<E: Debug>(&self) -> Result<(), Error<E>> {
        let computed = self.compute_crc8();
        if computed != self.crc() {
            Err(Error::RomChecksumInvalid {
                computed,
                expected: self.crc(),
            })
        } else {
            Ok(())
        }
    }

    /// Reads the ROM code of the only slave on the line
    ///
    /// The code is returned as read; call [`RomCode::validate`] before
    /// trusting it.
    pub fn read_single<B: Bus>(driver: &mut Driver<B>) -> Result<Self, Error<B::Error>> {
        let mut raw = [0u8; Self::BYTES];
        driver.reset_write_read(&[Command::ReadRom.op_code()], &mut raw)?;
        Ok(Self::from(raw))
    }
}

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RomCodeError {
    NotEnough,
    TooMany,
    Invalid,
}

impl FromStr for RomCode {
    type Err = RomCodeError;

    /// Parses 16 hex digits, optionally separated by spaces or colons
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut raw = [0u8; Self::BYTES];
        let mut digits = s.chars().filter(|c| !c.is_whitespace() && *c != ':');

        for byte in raw.iter_mut() {
            let (high, low) = match (digits.next(), digits.next()) {
                (Some(h), Some(l)) => (h, l),
                _ => return Err(RomCodeError::NotEnough),
            };
            match (high.to_digit(16), low.to_digit(16)) {
                (Some(h), Some(l)) => *byte = (h << 4 | l) as u8,
                _ => return Err(RomCodeError::Invalid),
            }
        }

        if digits.next().is_some() {
            return Err(RomCodeError::TooMany);
        }
        Ok(Self::from(raw))
    }
}

impl Display for RomCode {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        for (i, byte) in self.raw.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
