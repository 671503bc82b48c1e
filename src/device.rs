use crate::{Bus, Driver, Error, RomCode};
use core::fmt::Debug;

/// Generic 1-Wire slave
pub trait Device: Sized {
    /// Device family code, first byte of the ROM code
    const FAMILY_CODE: u8;

    fn rom(&self) -> &RomCode;

    /// Instantiate device from a ROM code without any checks
    fn from_rom_unchecked(rom: RomCode) -> Self;

    /// Instantiate device from a ROM code with a valid CRC and matching family
    fn from_rom<E: Debug>(rom: RomCode) -> Result<Self, Error<E>> {
        rom.validate()?;
        if rom.family_code() != Self::FAMILY_CODE {
            Err(Error::FamilyCodeMismatch {
                expected: Self::FAMILY_CODE,
                found: rom.family_code(),
            })
        } else {
            Ok(Self::from_rom_unchecked(rom))
        }
    }

    /// Identify the only slave on the line
    fn get_single<B: Bus>(driver: &mut Driver<B>) -> Result<Self, Error<B::Error>> {
        let rom = RomCode::read_single(driver)?;
        debug!("read ROM code {}", rom);
        Self::from_rom(rom)
    }
}
