//! Polling orchestrator.
//!
//! [`Thermostat::tick`] is meant to be called every
//! [`CONTROL_INTERVAL_SECS`](crate::config::CONTROL_INTERVAL_SECS). Each tick
//! measures, feeds the average, re-evaluates the controller and switches
//! the relays. Any failure opens both relays and stops ticking until
//! [`Thermostat::start`] is called again.

use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use embedded_hal::delay::DelayNs;

use crate::config::ThermostatConfig;
use crate::{
    Actuator, AverageWindow, Bus, Controller, ControllerState, Drive, Driver, Ds18b20, Error,
    Mode, Preset, Sensor, SetpointConfig, Units,
};

/// Why the thermostat entered its safe state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault<E: Debug, A: Debug> {
    Sensor(Error<E>),
    Actuator(A),
    /// Tick requested while stopped or faulted
    NotRunning,
}

impl<E: Debug, A: Debug> From<Error<E>> for Fault<E, A> {
    fn from(e: Error<E>) -> Self {
        Fault::Sensor(e)
    }
}

impl<E: Debug, A: Debug> Fault<E, A> {
    /// Message for the error screen
    pub fn message(&self) -> &'static str {
        match self {
            Fault::Sensor(e) => e.message(),
            Fault::Actuator(_) => "Relay output failed",
            Fault::NotRunning => "Controller is not running",
        }
    }
}

impl<E: Debug, A: Debug> Display for Fault<E, A> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Fault::Sensor(e) => Display::fmt(e, f),
            Fault::Actuator(e) => write!(f, "{}: {:?}", self.message(), e),
            Fault::NotRunning => f.write_str(self.message()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// Not started yet
    #[default]
    Stopped,
    Running,
    /// Relays open, waiting for a restart
    Faulted,
}

/// Snapshot for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    /// Last decoded reading in Celsius
    pub celsius: Option<f32>,
    /// Moving average in `setpoint.units()`
    pub average: Option<f32>,
    pub setpoint: SetpointConfig,
    pub mode: Mode,
    pub state: ControllerState,
    /// What the relays are actually doing
    pub drive: Drive,
    pub run_state: RunState,
}

impl Report {
    pub fn units(&self) -> Units {
        self.setpoint.units()
    }
}

pub struct Thermostat<B: Bus, A: Actuator, D: DelayNs> {
    driver: Driver<B>,
    actuator: A,
    delay: D,
    config: ThermostatConfig,
    sensor: Option<Ds18b20>,
    window: AverageWindow,
    /// Displayed average; survives unit changes by conversion while the
    /// window itself restarts
    average: Option<f32>,
    last_reading: Option<f32>,
    setpoint: SetpointConfig,
    controller: Controller,
    drive: Drive,
    run_state: RunState,
    fault: Option<&'static str>,
}

impl<B, A, D> Thermostat<B, A, D>
where
    B: Bus,
    A: Actuator,
    D: DelayNs,
{
    /// Does not touch the hardware until [`Thermostat::start`]
    pub fn new(bus: B, actuator: A, delay: D, config: ThermostatConfig) -> Self {
        Self {
            driver: Driver::new(bus),
            actuator,
            delay,
            config,
            sensor: None,
            window: AverageWindow::new(config.units),
            average: None,
            last_reading: None,
            setpoint: SetpointConfig::new(config.target, config.hysteresis, config.units),
            controller: Controller::default(),
            drive: Drive::Off,
            run_state: RunState::Stopped,
            fault: None,
        }
    }

    /// Initializes the probe and takes the first reading
    ///
    /// Also the way out of the safe state. The controller is not evaluated
    /// until the first tick.
    pub fn start(&mut self) -> Result<Report, Fault<B::Error, A::Error>> {
        self.fault = None;
        self.controller.force_idle();
        match self.bring_up() {
            Ok(()) => {
                self.run_state = RunState::Running;
                info!("thermostat running");
                Ok(self.report())
            }
            Err(fault) => Err(self.enter_safe_state(fault)),
        }
    }

    fn bring_up(&mut self) -> Result<(), Fault<B::Error, A::Error>> {
        self.actuator.shut_off().map_err(Fault::Actuator)?;
        self.drive = Drive::Off;
        let sensor = Ds18b20::initialize(
            &mut self.driver,
            &mut self.delay,
            self.config.resolution,
            self.config.scratchpad_attempts,
        )?;
        self.sensor = Some(sensor);
        self.measure(&sensor)?;
        Ok(())
    }

    /// One control cycle
    pub fn tick(&mut self) -> Result<Report, Fault<B::Error, A::Error>> {
        let sensor = match (self.run_state, self.sensor) {
            (RunState::Running, Some(sensor)) => sensor,
            _ => return Err(Fault::NotRunning),
        };
        match self.control(&sensor) {
            Ok(()) => Ok(self.report()),
            Err(fault) => Err(self.enter_safe_state(fault)),
        }
    }

    fn control(&mut self, sensor: &Ds18b20) -> Result<(), Fault<B::Error, A::Error>> {
        self.measure(sensor)?;
        if let Some(average) = self.average {
            let drive = self.controller.evaluate(average, &self.setpoint);
            self.actuator.apply(drive).map_err(Fault::Actuator)?;
            self.drive = drive;
        }
        Ok(())
    }

    fn measure(&mut self, sensor: &Ds18b20) -> Result<f32, Error<B::Error>> {
        let celsius = sensor.request_measurement(&mut self.driver, &mut self.delay)?;
        self.window.record(celsius);
        self.average = self.window.average();
        self.last_reading = Some(celsius);
        debug!("measured {} C, average {}", celsius, self.average);
        Ok(celsius)
    }

    /// Opens both relays and halts ticking; averaging and controller state
    /// are left as they were
    fn enter_safe_state(
        &mut self,
        fault: Fault<B::Error, A::Error>,
    ) -> Fault<B::Error, A::Error> {
        if self.actuator.shut_off().is_err() {
            error!("relays did not confirm shut off");
        }
        self.drive = Drive::Off;
        self.run_state = RunState::Faulted;
        self.fault = Some(fault.message());
        error!("safe state: {}", fault.message());
        fault
    }

    pub fn report(&self) -> Report {
        Report {
            celsius: self.last_reading,
            average: self.average,
            setpoint: self.setpoint,
            mode: self.controller.mode(),
            state: self.controller.state(),
            drive: self.drive,
            run_state: self.run_state,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Message of the fault that stopped the thermostat
    pub fn fault_message(&self) -> Option<&'static str> {
        self.fault
    }

    pub fn sensor(&self) -> Option<&Ds18b20> {
        self.sensor.as_ref()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn config(&self) -> &ThermostatConfig {
        &self.config
    }

    pub fn setpoint(&self) -> &SetpointConfig {
        &self.setpoint
    }

    pub fn average(&self) -> Option<f32> {
        self.average
    }

    pub fn units(&self) -> Units {
        self.setpoint.units()
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.controller.set_mode(mode);
    }

    pub fn next_mode(&mut self) {
        self.controller.next_mode();
    }

    pub fn previous_mode(&mut self) {
        self.controller.previous_mode();
    }

    pub fn set_target(&mut self, target: f32) {
        self.setpoint.set_target(target);
    }

    pub fn step_target_up(&mut self) {
        self.setpoint.step_up();
    }

    pub fn step_target_down(&mut self) {
        self.setpoint.step_down();
    }

    pub fn set_hysteresis(&mut self, hysteresis: f32) {
        self.setpoint.set_hysteresis(hysteresis);
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        self.setpoint.apply_preset(preset);
    }

    /// Restarts averaging; setpoint and displayed average are converted
    pub fn set_units(&mut self, units: Units) {
        let previous = self.setpoint.units();
        if units == previous {
            return;
        }
        self.setpoint.set_units(units);
        self.window.set_units(units);
        self.average = self.average.map(|average| previous.convert(average, units));
        info!("units {} -> {}", previous.symbol(), units.symbol());
    }

    pub fn toggle_units(&mut self) {
        self.set_units(self.units().toggled());
    }

    pub fn release(self) -> (B, A, D) {
        (self.driver.release(), self.actuator, self.delay)
    }
}
