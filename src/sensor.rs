use crate::{Bus, Device, Driver, Error};
use embedded_hal::delay::DelayNs;

pub trait Sensor: Device {
    /// returns the microseconds required to wait until the measurement finished
    fn start_measurement<B: Bus>(&self, driver: &mut Driver<B>) -> Result<u32, Error<B::Error>>;

    /// returns the measured value in degrees Celsius
    fn read_measurement<B: Bus>(&self, driver: &mut Driver<B>) -> Result<f32, Error<B::Error>>;

    /// Starts a measurement, blocks for its conversion time and reads it back
    fn request_measurement<B: Bus>(
        &self,
        driver: &mut Driver<B>,
        delay: &mut impl DelayNs,
    ) -> Result<f32, Error<B::Error>> {
        let wait_us = self.start_measurement(driver)?;
        delay.delay_us(wait_us);
        self.read_measurement(driver)
    }
}
