/// Temperature units used for display, setpoint and averaging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Units {
    Celsius,
    #[default]
    Fahrenheit,
}

pub fn c_to_f(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn f_to_c(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

impl Units {
    pub fn from_celsius(&self, celsius: f32) -> f32 {
        match self {
            Units::Celsius => celsius,
            Units::Fahrenheit => c_to_f(celsius),
        }
    }

    /// Re-expresses `value`, given in `self`, in `other`
    pub fn convert(&self, value: f32, other: Units) -> f32 {
        match (self, other) {
            (Units::Celsius, Units::Fahrenheit) => c_to_f(value),
            (Units::Fahrenheit, Units::Celsius) => f_to_c(value),
            _ => value,
        }
    }

    pub fn toggled(&self) -> Units {
        match self {
            Units::Celsius => Units::Fahrenheit,
            Units::Fahrenheit => Units::Celsius,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Units::Celsius => "°C",
            Units::Fahrenheit => "°F",
        }
    }
}

/// Fermentation presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Preset {
    /// 55 °F / 13 °C
    Lager,
    /// 68 °F / 20 °C
    Ale,
}

impl Preset {
    pub fn target(&self, units: Units) -> f32 {
        match (self, units) {
            (Preset::Lager, Units::Fahrenheit) => 55.0,
            (Preset::Lager, Units::Celsius) => 13.0,
            (Preset::Ale, Units::Fahrenheit) => 68.0,
            (Preset::Ale, Units::Celsius) => 20.0,
        }
    }
}

/// Target temperature with its hysteresis band
///
/// `high` and `low` are derived and recomputed by every setter, so
/// `high >= target >= low` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetpointConfig {
    target: f32,
    hysteresis: f32,
    high: f32,
    low: f32,
    units: Units,
}

impl SetpointConfig {
    /// Negative hysteresis is taken by magnitude
    pub fn new(target: f32, hysteresis: f32, units: Units) -> Self {
        let mut setpoint = Self {
            target,
            hysteresis: hysteresis.abs(),
            high: target,
            low: target,
            units,
        };
        setpoint.update_band();
        setpoint
    }

    fn update_band(&mut self) {
        self.high = self.target + self.hysteresis;
        self.low = self.target - self.hysteresis;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn hysteresis(&self) -> f32 {
        self.hysteresis
    }

    pub fn high(&self) -> f32 {
        self.high
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
        self.update_band();
    }

    pub fn set_hysteresis(&mut self, hysteresis: f32) {
        self.hysteresis = hysteresis.abs();
        self.update_band();
    }

    /// Moves the target one degree up
    pub fn step_up(&mut self) {
        self.set_target(self.target + 1.0);
    }

    /// Moves the target one degree down
    pub fn step_down(&mut self) {
        self.set_target(self.target - 1.0);
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        self.set_target(preset.target(self.units));
    }

    /// Converts the target into `units`; the hysteresis magnitude is kept
    pub fn set_units(&mut self, units: Units) {
        if units != self.units {
            self.target = self.units.convert(self.target, units);
            self.units = units;
            self.update_band();
        }
    }
}

impl Default for SetpointConfig {
    fn default() -> Self {
        use crate::config::{DEFAULT_HYSTERESIS, DEFAULT_TARGET, DEFAULT_UNITS};
        Self::new(DEFAULT_TARGET, DEFAULT_HYSTERESIS, DEFAULT_UNITS)
    }
}
