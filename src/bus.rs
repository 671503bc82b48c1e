use core::fmt::Debug;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::i2c::{I2c, SevenBitAddress};

/// Byte transport to the bridge
///
/// Every call is a complete bus transaction. Timeouts are enforced by the
/// implementation and reported through `Self::Error`.
pub trait Bus {
    type Error: Debug;

    /// Writes `bytes` to the bridge
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Fills `buffer` with bytes from the bridge's current read pointer
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

/// I2C peripheral paired with the bridge's slave address
impl<I: I2c> Bus for (I, SevenBitAddress) {
    type Error = I::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write(self.1, bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.0.read(self.1, buffer)
    }
}

impl<B: Bus> Bus for &mut B {
    type Error = B::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(buffer)
    }
}

/// Inverted output wrapper, for active-low relay boards
pub struct Inverted<P>(pub P);

impl<P: ErrorType> ErrorType for Inverted<P> {
    type Error = P::Error;
}

impl<P> OutputPin for Inverted<P>
where
    P: OutputPin,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }
}
