//! Appliance constants and run-time configuration.
//!
//! Bus addressing and timing live here so a board port only has to touch
//! one file.

use crate::{Resolution, Units};

// Bus

/// I2C slave address of the DS2482-100 with AD0/AD1 tied low.
pub const BRIDGE_ADDRESS: u8 = 0x18;

/// I2C clock the bridge is wired for (kHz).
pub const BUS_FREQUENCY_KHZ: u32 = 50;

/// Status reads spent waiting for one 1-Wire command before giving up.
/// A byte takes under 1 ms on the line, far less than this many I2C reads.
pub const MAX_BUSY_POLLS: u16 = 1000;

// Sensor

/// Resolution programmed at start-up.
pub const DEFAULT_RESOLUTION: Resolution = Resolution::Bits11;

/// Scratchpad reads per measurement before reporting `MeasurementFailed`.
pub const SCRATCHPAD_READ_ATTEMPTS: u8 = 3;

/// Wait after a copy-scratchpad on a parasitically powered probe (ms).
pub const COPY_SETTLE_MS: u32 = 10;

// Control loop

/// Period of the control tick (seconds).
pub const CONTROL_INTERVAL_SECS: u64 = 2;

/// Splash screen time before the first control tick (seconds).
pub const STARTUP_INTERVAL_SECS: u64 = 3;

/// Inactivity before the presentation layer switches to its idle screen (seconds).
pub const IDLE_SCREEN_TIMEOUT_SECS: u64 = 10;

/// Depth of the moving average.
pub const AVERAGE_DEPTH: usize = 16;

pub const DEFAULT_UNITS: Units = Units::Fahrenheit;
pub const DEFAULT_TARGET: f32 = 68.0;
pub const DEFAULT_HYSTERESIS: f32 = 1.0;

/// Run-time choices for a [`Thermostat`](crate::Thermostat)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThermostatConfig {
    pub resolution: Resolution,
    pub units: Units,
    /// Target temperature, in `units`
    pub target: f32,
    /// Half width of the dead band, in `units`
    pub hysteresis: f32,
    pub scratchpad_attempts: u8,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            units: DEFAULT_UNITS,
            target: DEFAULT_TARGET,
            hysteresis: DEFAULT_HYSTERESIS,
            scratchpad_attempts: SCRATCHPAD_READ_ATTEMPTS,
        }
    }
}

impl ThermostatConfig {
    /// Celsius preset, 20 °C ± 0.5 at full resolution
    pub const fn celsius() -> Self {
        Self {
            resolution: Resolution::Bits12,
            units: Units::Celsius,
            target: 20.0,
            hysteresis: 0.5,
            scratchpad_attempts: SCRATCHPAD_READ_ATTEMPTS,
        }
    }
}
