//! # Getting started
//!
//! A platform agnostic driver for the [MS5803](https://www.te.com/usa-en/product-CAT-BLPS0013.html)
//! family of barometric pressure sensors from Measurement Specialties.
//!
//! This driver reads the factory calibration from the PROM and applies the
//! second order compensation from the datasheet to the on-chip 24 bit ADC
//! results. The sensor may be attached over I2C or SPI. Older register-style
//! parts with 16 bit ADC results are supported by [`register::RegisterSensor`].
//!
//! ## Example
//! ```rust
//! # // NOTE: Use real i2c instance for your app.
//! # use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//! # let i2c = I2cMock::new(&[I2cTransaction::write(0x76, vec![0x1E]),
//! #     I2cTransaction::write_read(0x76, vec![0xA0], vec![0x00, 0x00]),
//! #     I2cTransaction::write_read(0x76, vec![0xA2], vec![0xB5, 0x24]),
//! #     I2cTransaction::write_read(0x76, vec![0xA4], vec![0xAB, 0xCD]),
//! #     I2cTransaction::write_read(0x76, vec![0xA6], vec![0x71, 0x83]),
//! #     I2cTransaction::write_read(0x76, vec![0xA8], vec![0x6C, 0xC2]),
//! #     I2cTransaction::write_read(0x76, vec![0xAA], vec![0x7B, 0x41]),
//! #     I2cTransaction::write_read(0x76, vec![0xAC], vec![0x6E, 0x05]),
//! #     I2cTransaction::write_read(0x76, vec![0xAE], vec![0x00, 0x00]),
//! #     I2cTransaction::write(0x76, vec![0x58]),
//! #     I2cTransaction::write_read(0x76, vec![0x00], vec![0x7F, 0xFA, 0xE4]),
//! #     I2cTransaction::write(0x76, vec![0x48]),
//! #     I2cTransaction::write_read(0x76, vec![0x00], vec![0x41, 0xC9, 0xFE]),
//! # ]);
//! use ms5803::{Address, OverSamplingRatio, mock_utils::SleepNop};
//! // NOTE: You should implement the DelayUs trait for this driver to work
//! // correctly.
//! let mut pressure_sensor = ms5803::new_i2c(i2c, Address::High, SleepNop);
//! pressure_sensor.reset().unwrap();
//! pressure_sensor.begin().unwrap();
//! let measurement = pressure_sensor
//!     .read_temperature_and_pressure(OverSamplingRatio::R4096)
//!     .unwrap();
//! assert_eq!(measurement.temperature, 30.35);
//! assert_eq!(measurement.pressure, 752.6);
//! ```

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

mod fmt;

pub mod calibration;
pub mod compensation;
pub mod register;
pub mod sensor;
pub mod transport;

use embedded_hal::{
    blocking::{delay::DelayUs, spi::Transfer},
    digital::v2::OutputPin,
};

pub use calibration::CalibrationSet;
pub use compensation::CompensatedReading;
pub use sensor::{Measurement, Ms5803};
pub use transport::{
    Address, I2cMarker, I2cTransport, SpiError, SpiMarker, SpiTransport, Transport,
};

/// Mock utils is a set of tools to aid in testing and documenting you should not
/// use any of the mocks defined in this module in your release binaries.
pub mod mock_utils {
    /// A sleep implementation that does nothing and immediately exists. This is
    /// useful for testing and fuzzing.
    pub struct SleepNop;

    impl embedded_hal::blocking::delay::DelayUs<u32> for SleepNop {
        fn delay_us(&mut self, _us: u32) {
            // Nop
        }
    }
}

/// A catch all error for this driver
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    /// The bus transaction failed. Retrying is safe.
    TransportError(E),
    /// A measurement was requested before the calibration was read.
    NotInitialized,
    /// A raw value did not name a known setting.
    InvalidArgument(u8),
}

/// A raw byte that does not map onto any variant of a settings enum.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidArgument(pub u8);

impl<E> From<InvalidArgument> for SensorError<E> {
    fn from(InvalidArgument(value): InvalidArgument) -> Self {
        SensorError::InvalidArgument(value)
    }
}

/// The oversampling ratio to use internal to the ADC. This is analogous to taking
/// n samples and then takeing the average.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverSamplingRatio {
    R256 = 0x0,
    R512 = 0x2,
    R1024 = 0x4,
    R2048 = 0x6,
    R4096 = 0x8,
}

impl OverSamplingRatio {
    /// Maximum conversion time from the datasheet.
    pub fn conversion_time_us(&self) -> u32 {
        use OverSamplingRatio::*;
        match *self {
            R256 => 1_000,
            R512 => 3_000,
            R1024 => 4_000,
            R2048 => 6_000,
            R4096 => 10_000,
        }
    }
}

/// Parses the precision bits of a conversion command.
impl TryFrom<u8> for OverSamplingRatio {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use OverSamplingRatio::*;
        match value {
            0x0 => Ok(R256),
            0x2 => Ok(R512),
            0x4 => Ok(R1024),
            0x6 => Ok(R2048),
            0x8 => Ok(R4096),
            other => Err(InvalidArgument(other)),
        }
    }
}

/// Temperature units.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Units {
    Celsius = 0,
    Fahrenheit = 1,
}

impl Units {
    /// Converts a temperature in degrees Celsius into these units.
    pub fn convert_celsius(self, celsius: f32) -> f32 {
        match self {
            Units::Celsius => celsius,
            Units::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Converts hundredths of a degree Celsius into hundredths of these units.
    pub fn convert_centi_celsius(self, centi_celsius: i32) -> i32 {
        match self {
            Units::Celsius => centi_celsius,
            Units::Fahrenheit => centi_celsius * 9 / 5 + 3200,
        }
    }
}

impl TryFrom<u8> for Units {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Units::Celsius),
            1 => Ok(Units::Fahrenheit),
            other => Err(InvalidArgument(other)),
        }
    }
}

/// A command to send to the pressure sensor.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Command {
    Reset,
    ConvertD1(OverSamplingRatio),
    ConvertD2(OverSamplingRatio),
    AdcRead,
    PromRead(u8),
}

/// Convert the command into a single byte that can be sent over the bus.
impl From<Command> for u8 {
    fn from(val: Command) -> u8 {
        use Command::*;
        match val {
            Reset => 0x1E,
            ConvertD1(osr) => 0x40u8 | osr as u8,
            ConvertD2(osr) => 0x50u8 | osr as u8,
            AdcRead => 0x00,
            PromRead(address) => 0xA0u8 | (address << 1),
        }
    }
}

/// Create an uncalibrated driver for a sensor on an I2C bus.
///
/// # Example
///
/// ```
/// // NOTE: Use real i2c instance for your app.
/// use embedded_hal_mock::i2c::Mock as I2cMock;
/// use ms5803::{Address, mock_utils::SleepNop};
/// let i2c = I2cMock::new(&[]);
/// let pressure_sensor = ms5803::new_i2c(i2c, Address::Low, SleepNop);
/// ```
pub fn new_i2c<I2C: I2cMarker, D: DelayUs<u32>>(
    i2c: I2C,
    address: Address,
    sleep: D,
) -> Ms5803<I2cTransport<I2C>, D> {
    Ms5803::new(I2cTransport::new(i2c, address), sleep)
}

/// Create an uncalibrated driver for a sensor on an SPI bus.
///
/// Chip-select is driven high before the driver is returned.
pub fn new_spi<SPI: SpiMarker, CS: OutputPin, D: DelayUs<u32>>(
    spi: SPI,
    cs: CS,
    sleep: D,
) -> Result<Ms5803<SpiTransport<SPI, CS>, D>, SpiError<<SPI as Transfer<u8>>::Error, CS::Error>> {
    Ok(Ms5803::new(SpiTransport::new(spi, cs)?, sleep))
}
