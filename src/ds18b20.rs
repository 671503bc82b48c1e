use byteorder::{ByteOrder, LittleEndian};
use embedded_hal::delay::DelayNs;

use crate::config::{COPY_SETTLE_MS, SCRATCHPAD_READ_ATTEMPTS};
use crate::{compute_crc8, Bus, Device, Driver, Error, OpCode, RomCode, Sensor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Convert = 0x44,
    WriteScratchpad = 0x4E,
    ReadScratchpad = 0xBE,
    CopyScratchpad = 0x48,
    RecallE2 = 0xB8,
    ReadPowerSupply = 0xB4,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// ADC resolution, encoded as the configuration register value
///
/// Bits 5 and 6 select the resolution, the remaining bits read as 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Resolution {
    Bits9 = 0b0001_1111,
    Bits10 = 0b0011_1111,
    Bits11 = 0b0101_1111,
    #[default]
    Bits12 = 0b0111_1111,
}

impl Resolution {
    pub fn bits(&self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    pub fn config_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_config_byte(config: u8) -> Self {
        match config & 0x60 {
            0x00 => Resolution::Bits9,
            0x20 => Resolution::Bits10,
            0x40 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    /// Undefined low fraction bits of the raw reading
    pub fn fraction_shift(&self) -> u8 {
        12 - self.bits()
    }

    /// Degrees Celsius per significant count
    pub fn degrees_per_count(&self) -> f32 {
        0.0625 * (1u8 << self.fraction_shift()) as f32
    }

    /// Worst case conversion time: 750 ms at 12 bits, halved per bit removed
    pub fn conversion_time_us(&self) -> u32 {
        750_000 >> self.fraction_shift()
    }
}

/// Settings fixed when the probe is initialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    pub resolution: Resolution,
    /// Probe draws power from the data line and needs a strong pullup
    /// during conversions and EEPROM writes
    pub parasite_power: bool,
}

/// Image of the probe's 9-byte scratchpad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Scratchpad {
    raw: [u8; Self::BYTES],
}

impl From<[u8; Scratchpad::BYTES]> for Scratchpad {
    fn from(raw: [u8; Scratchpad::BYTES]) -> Self {
        Scratchpad { raw }
    }
}

impl Scratchpad {
    pub const BYTES: usize = 9;

    pub fn read<B: Bus>(driver: &mut Driver<B>) -> Result<Self, Error<B::Error>> {
        let mut raw = [0u8; Self::BYTES];
        driver.reset_skip_write_read(&[Command::ReadScratchpad.op_code()], &mut raw)?;
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &[u8; Self::BYTES] {
        &self.raw
    }

    pub fn temperature_raw(&self) -> u16 {
        LittleEndian::read_u16(&self.raw[0..2])
    }

    pub fn alarm_high(&self) -> i8 {
        self.raw[2] as i8
    }

    pub fn alarm_low(&self) -> i8 {
        self.raw[3] as i8
    }

    pub fn configuration(&self) -> u8 {
        self.raw[4]
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::from_config_byte(self.configuration())
    }

    pub fn crc(&self) -> u8 {
        self.raw[8]
    }

    pub fn compute_crc8(&self) -> u8 {
        compute_crc8(&self.raw[..8])
    }

    pub fn is_valid(&self) -> bool {
        self.compute_crc8() == self.crc()
    }
}

/// Decodes the 16-bit sign-extended two's complement temperature word
///
/// Fraction bits below the configured resolution are undefined and ignored.
pub fn decode_temperature(raw: u16, resolution: Resolution) -> f32 {
    let (sign, magnitude) = if raw & 0x8000 != 0 {
        (-1.0, raw.wrapping_neg())
    } else {
        (1.0, raw)
    };
    let counts = (magnitude & 0x000F) >> resolution.fraction_shift();
    let fraction = counts as f32 * resolution.degrees_per_count();
    let whole = (magnitude >> 4) as f32;
    sign * (whole + fraction)
}

#[derive(Debug, Clone, Copy)]
pub struct Ds18b20 {
    rom: RomCode,
    config: SensorConfig,
    scratchpad_attempts: u8,
}

impl From<Ds18b20> for RomCode {
    fn from(device: Ds18b20) -> Self {
        device.rom
    }
}

impl Ds18b20 {
    /// Brings up bridge and probe
    ///
    /// Resets the bridge, identifies the probe by its ROM code, detects
    /// parasite power and stores `resolution` in the probe's EEPROM.
    pub fn initialize<B: Bus>(
        driver: &mut Driver<B>,
        delay: &mut impl DelayNs,
        resolution: Resolution,
        scratchpad_attempts: u8,
    ) -> Result<Self, Error<B::Error>> {
        driver.reset_bridge()?;
        let device = Self::get_single(driver)?;
        let config = SensorConfig {
            resolution,
            parasite_power: Self::read_power_supply(driver)?,
        };
        if config.parasite_power {
            info!("probe {} is parasitically powered", device.rom);
        }
        Self::configure(driver, delay, config)?;
        info!("probe {} configured for {=u8} bit", device.rom, resolution.bits());
        Ok(Self {
            config,
            scratchpad_attempts: scratchpad_attempts.max(1),
            ..device
        })
    }

    /// Returns true when a probe on the line is parasitically powered
    pub fn read_power_supply<B: Bus>(driver: &mut Driver<B>) -> Result<bool, Error<B::Error>> {
        driver.reset_skip_write_only(&[Command::ReadPowerSupply.op_code()])?;
        // parasitic probes hold the line low for this slot
        Ok(!driver.read_bit()?)
    }

    fn configure<B: Bus>(
        driver: &mut Driver<B>,
        delay: &mut impl DelayNs,
        config: SensorConfig,
    ) -> Result<(), Error<B::Error>> {
        // alarm thresholds are unused and zeroed
        driver.reset_skip_write_only(&[
            Command::WriteScratchpad.op_code(),
            0x00,
            0x00,
            config.resolution.config_byte(),
        ])?;
        driver.reset_skip_command(Command::CopyScratchpad, config.parasite_power)?;
        if config.parasite_power {
            delay.delay_ms(COPY_SETTLE_MS);
        }
        Ok(())
    }

    pub fn config(&self) -> SensorConfig {
        self.config
    }

    pub fn resolution(&self) -> Resolution {
        self.config.resolution
    }

    pub fn is_parasite_powered(&self) -> bool {
        self.config.parasite_power
    }

    pub fn measure_temperature<B: Bus>(
        &self,
        driver: &mut Driver<B>,
    ) -> Result<Resolution, Error<B::Error>> {
        driver.reset_skip_command(Command::Convert, self.config.parasite_power)?;
        Ok(self.config.resolution)
    }

    /// Reads the scratchpad until its CRC checks out
    ///
    /// Gives up with `MeasurementFailed` after the configured number of reads.
    pub fn read_scratchpad<B: Bus>(
        &self,
        driver: &mut Driver<B>,
    ) -> Result<Scratchpad, Error<B::Error>> {
        for attempt in 1..=self.scratchpad_attempts {
            let scratchpad = Scratchpad::read(driver)?;
            if scratchpad.is_valid() {
                return Ok(scratchpad);
            }
            warn!(
                "scratchpad CRC mismatch on read {=u8}: computed {=u8:#x}, expected {=u8:#x}",
                attempt,
                scratchpad.compute_crc8(),
                scratchpad.crc()
            );
        }
        Err(Error::MeasurementFailed)
    }

    pub fn read_temperature<B: Bus>(
        &self,
        driver: &mut Driver<B>,
    ) -> Result<u16, Error<B::Error>> {
        Ok(self.read_scratchpad(driver)?.temperature_raw())
    }
}

impl Device for Ds18b20 {
    const FAMILY_CODE: u8 = 0x28;

    fn rom(&self) -> &RomCode {
        &self.rom
    }

    fn from_rom_unchecked(rom: RomCode) -> Self {
        Self {
            rom,
            config: SensorConfig::default(),
            scratchpad_attempts: SCRATCHPAD_READ_ATTEMPTS,
        }
    }
}

impl Sensor for Ds18b20 {
    fn start_measurement<B: Bus>(&self, driver: &mut Driver<B>) -> Result<u32, Error<B::Error>> {
        Ok(self.measure_temperature(driver)?.conversion_time_us())
    }

    fn read_measurement<B: Bus>(&self, driver: &mut Driver<B>) -> Result<f32, Error<B::Error>> {
        self.read_temperature(driver)
            .map(|raw| decode_temperature(raw, self.config.resolution))
    }
}
