//! Hysteresis (bang-bang) controller for a heat/cool pair.

use crate::SetpointConfig;

/// User selected operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Off,
    Cool,
    Heat,
    /// Heat or cool, whichever is needed
    Hold,
}

impl Mode {
    /// Cycles off → cool → heat → hold → off
    pub fn next(&self) -> Mode {
        match self {
            Mode::Off => Mode::Cool,
            Mode::Cool => Mode::Heat,
            Mode::Heat => Mode::Hold,
            Mode::Hold => Mode::Off,
        }
    }

    pub fn previous(&self) -> Mode {
        match self {
            Mode::Off => Mode::Hold,
            Mode::Hold => Mode::Heat,
            Mode::Heat => Mode::Cool,
            Mode::Cool => Mode::Off,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Off => "Off",
            Mode::Cool => "Cool",
            Mode::Heat => "Heat",
            Mode::Hold => "Hold",
        }
    }
}

/// What the controller is currently doing, derived from mode and temperature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerState {
    #[default]
    Idle,
    Heating,
    Cooling,
}

impl ControllerState {
    pub fn label(&self) -> &'static str {
        match self {
            ControllerState::Idle => "Idle",
            ControllerState::Heating => "Heating",
            ControllerState::Cooling => "Cooling",
        }
    }

    pub fn drive(&self) -> Drive {
        match self {
            ControllerState::Idle => Drive::Off,
            ControllerState::Heating => Drive::Heat,
            ControllerState::Cooling => Drive::Cool,
        }
    }
}

/// Actuator command; heat and cool can never be requested together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    #[default]
    Off,
    Heat,
    Cool,
}

impl Drive {
    pub fn heat_on(&self) -> bool {
        *self == Drive::Heat
    }

    pub fn cool_on(&self) -> bool {
        *self == Drive::Cool
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Controller {
    mode: Mode,
    state: ControllerState,
}

impl Controller {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            state: ControllerState::Idle,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn drive(&self) -> Drive {
        self.state.drive()
    }

    /// Takes effect on the next [`Controller::evaluate`]
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            info!("mode {} -> {}", self.mode.label(), mode.label());
            self.mode = mode;
        }
    }

    pub fn next_mode(&mut self) {
        self.set_mode(self.mode.next());
    }

    pub fn previous_mode(&mut self) {
        self.set_mode(self.mode.previous());
    }

    /// State following `state` for the filtered `average`
    ///
    /// Inside the band the previous state is kept, which is what stops the
    /// outputs from chattering around the target.
    pub fn next_state(
        mode: Mode,
        state: ControllerState,
        average: f32,
        setpoint: &SetpointConfig,
    ) -> ControllerState {
        let idle = state == ControllerState::Idle;
        let may_cool = mode == Mode::Cool || (mode == Mode::Hold && idle);
        let may_heat = mode == Mode::Heat || (mode == Mode::Hold && idle);
        let cooling =
            mode == Mode::Cool || (mode == Mode::Hold && state == ControllerState::Cooling);
        let heating =
            mode == Mode::Heat || (mode == Mode::Hold && state == ControllerState::Heating);

        if may_cool && average >= setpoint.high() {
            ControllerState::Cooling
        } else if may_heat && average <= setpoint.low() {
            ControllerState::Heating
        } else if (cooling && average <= setpoint.target())
            || (heating && average >= setpoint.target())
            || mode == Mode::Off
        {
            ControllerState::Idle
        } else {
            state
        }
    }

    /// Re-evaluates the state and returns the resulting drive
    pub fn evaluate(&mut self, average: f32, setpoint: &SetpointConfig) -> Drive {
        let next = Self::next_state(self.mode, self.state, average, setpoint);
        if next != self.state {
            info!(
                "{} -> {} at {} (band {}..{})",
                self.state.label(),
                next.label(),
                average,
                setpoint.low(),
                setpoint.high()
            );
            self.state = next;
        }
        self.drive()
    }

    /// Drops to idle regardless of mode, used on (re)start
    pub fn force_idle(&mut self) -> Drive {
        self.state = ControllerState::Idle;
        self.drive()
    }
}
