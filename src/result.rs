use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Error type
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: Sized + Debug> {
    /// Bridge did not report a device reset
    BridgeNotPresent,
    /// No presence pulse after a 1-Wire reset
    NoChannelPresence,
    /// Bridge stayed busy for the whole status polling budget
    BusBusy,
    RomChecksumInvalid { computed: u8, expected: u8 },
    FamilyCodeMismatch { expected: u8, found: u8 },
    /// Every scratchpad read failed its checksum
    MeasurementFailed,
    Transport(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Transport(e)
    }
}

impl<E: Sized + Debug> Error<E> {
    /// Short human readable description, suitable for an error screen
    pub fn message(&self) -> &'static str {
        match self {
            Error::BridgeNotPresent => "DS2482 not found on I2C bus",
            Error::NoChannelPresence => "DS18B20 probe not found",
            Error::BusBusy => "1-Wire bus stuck busy",
            Error::RomChecksumInvalid { .. } => "Bad CRC on ROM code",
            Error::FamilyCodeMismatch { .. } => "Probe is not a DS18B20",
            Error::MeasurementFailed => "Bad CRC on every scratchpad read",
            Error::Transport(_) => "I2C bus transaction failed",
        }
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::RomChecksumInvalid { computed, expected } => write!(
                f,
                "{} (computed {:#04x}, expected {:#04x})",
                self.message(),
                computed,
                expected
            ),
            Error::FamilyCodeMismatch { expected, found } => write!(
                f,
                "{} (family {:#04x}, expected {:#04x})",
                self.message(),
                found,
                expected
            ),
            Error::Transport(e) => write!(f, "{}: {:?}", self.message(), e),
            _ => f.write_str(self.message()),
        }
    }
}
