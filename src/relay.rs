use core::fmt::Debug;
use embedded_hal::digital::OutputPin;

use crate::Drive;

/// Output stage driven by the controller
pub trait Actuator {
    type Error: Debug;

    /// Switches the outputs to `drive`
    fn apply(&mut self, drive: Drive) -> Result<(), Self::Error>;

    /// Both outputs off
    fn shut_off(&mut self) -> Result<(), Self::Error> {
        self.apply(Drive::Off)
    }
}

/// Heat and cool relays on two output pins
///
/// Switching is break-before-make: the releasing relay opens before the
/// engaging one closes, so both are never energized, not even between the
/// two pin writes. Wrap a pin in [`Inverted`](crate::Inverted) for
/// active-low boards.
pub struct Relays<H, C> {
    heat: H,
    cool: C,
    drive: Drive,
}

impl<H, C> Relays<H, C>
where
    H: OutputPin,
    C: OutputPin<Error = H::Error>,
{
    /// Takes the pins and opens both relays
    pub fn new(heat: H, cool: C) -> Result<Self, H::Error> {
        let mut relays = Self {
            heat,
            cool,
            drive: Drive::Off,
        };
        relays.heat.set_low()?;
        relays.cool.set_low()?;
        Ok(relays)
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    pub fn is_heat_on(&self) -> bool {
        self.drive.heat_on()
    }

    pub fn is_cool_on(&self) -> bool {
        self.drive.cool_on()
    }

    pub fn release(self) -> (H, C) {
        (self.heat, self.cool)
    }
}

impl<H, C> Actuator for Relays<H, C>
where
    H: OutputPin,
    C: OutputPin<Error = H::Error>,
{
    type Error = H::Error;

    fn apply(&mut self, drive: Drive) -> Result<(), Self::Error> {
        match drive {
            Drive::Off => {
                self.heat.set_low()?;
                self.cool.set_low()?;
            }
            Drive::Heat => {
                self.cool.set_low()?;
                self.heat.set_high()?;
            }
            Drive::Cool => {
                self.heat.set_low()?;
                self.cool.set_high()?;
            }
        }
        if drive != self.drive {
            debug!("relays {} -> {}", self.drive, drive);
            self.drive = drive;
        }
        Ok(())
    }
}

impl<A: Actuator> Actuator for &mut A {
    type Error = A::Error;

    fn apply(&mut self, drive: Drive) -> Result<(), Self::Error> {
        (**self).apply(drive)
    }
}
