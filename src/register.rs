//! Register-style parts of the family.
//!
//! These devices take commands through a command register and return 16 bit
//! results through a data register. Pressure compensation needs a fresh
//! temperature sample, so every pressure reading is a two step conversion.

use embedded_hal::blocking::delay::DelayUs;

use crate::{
    calibration::{self, CalibrationSet},
    compensation,
    transport::Transport,
    Command, InvalidArgument, SensorError, Units,
};

const COMMAND_REGISTER: u8 = 0xF1;
const DATA_REGISTER: u8 = 0xF5;

const COMMAND_GET_TEMPERATURE: u8 = 0x03;
const COMMAND_GET_PRESSURE: u8 = 0x01;

const TEMPERATURE_CONVERSION_TIME_US: u32 = 5_000;
const RESET_TIME_US: u32 = 3_000;

/// Pressure conversion mode, trading conversion time for resolution.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressureMode {
    Low = 0,
    Standard = 1,
    High = 2,
    Ultra = 3,
}

impl PressureMode {
    pub fn conversion_time_us(&self) -> u32 {
        use PressureMode::*;
        match *self {
            Low => 5_000,
            Standard => 11_000,
            High => 19_000,
            Ultra => 67_000,
        }
    }

    fn command(self) -> u8 {
        COMMAND_GET_PRESSURE | ((self as u8) << 3)
    }
}

impl TryFrom<u8> for PressureMode {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use PressureMode::*;
        match value {
            0 => Ok(Low),
            1 => Ok(Standard),
            2 => Ok(High),
            3 => Ok(Ultra),
            other => Err(InvalidArgument(other)),
        }
    }
}

/// A register-style sensor with eight calibration words C1 to C8 and a
/// 16 bit ADC.
pub struct RegisterSensor<T: Transport, D: DelayUs<u32>> {
    transport: T,
    sleep: D,
    calibration: Option<CalibrationSet>,
    calibration_hook: Option<fn(u8, u16)>,
}

impl<T: Transport, D: DelayUs<u32>> RegisterSensor<T, D> {
    pub fn new(transport: T, sleep: D) -> Self {
        Self {
            transport,
            sleep,
            calibration: None,
            calibration_hook: None,
        }
    }

    pub fn release(self) -> (T, D) {
        (self.transport, self.sleep)
    }

    pub fn calibration(&self) -> Option<&CalibrationSet> {
        self.calibration.as_ref()
    }

    /// Registers a function called with the index and value of every PROM word
    /// read by [`RegisterSensor::begin`].
    pub fn set_calibration_hook(&mut self, hook: fn(u8, u16)) {
        self.calibration_hook = Some(hook);
    }

    pub fn reset(&mut self) -> Result<(), SensorError<T::Error>> {
        let sleep = &mut self.sleep;
        self.transport
            .send_command_and_wait(Command::Reset.into(), || sleep.delay_us(RESET_TIME_US))
            .map_err(SensorError::TransportError)
    }

    /// Reads C1 to C8 from the PROM.
    pub fn begin(&mut self) -> Result<(), SensorError<T::Error>> {
        let calibration = calibration::read_prom(&mut self.transport, self.calibration_hook)
            .map_err(SensorError::TransportError)?;
        self.calibration = Some(calibration);
        Ok(())
    }

    fn convert(&mut self, command: u8, wait_us: u32) -> Result<u16, SensorError<T::Error>> {
        trace!("register command {=u8:#x}", command);
        self.transport
            .write(&[COMMAND_REGISTER, command])
            .map_err(SensorError::TransportError)?;
        self.sleep.delay_us(wait_us);
        self.transport
            .read_u16(DATA_REGISTER)
            .map_err(SensorError::TransportError)
    }

    /// Starts a temperature conversion and reads the raw result.
    pub fn read_raw_temperature(&mut self) -> Result<u16, SensorError<T::Error>> {
        self.convert(COMMAND_GET_TEMPERATURE, TEMPERATURE_CONVERSION_TIME_US)
    }

    /// Starts a pressure conversion and reads the raw result.
    pub fn read_raw_pressure(&mut self, mode: PressureMode) -> Result<u16, SensorError<T::Error>> {
        self.convert(mode.command(), mode.conversion_time_us())
    }

    /// Reads the first order temperature in hundredths of a degree Celsius or
    /// Fahrenheit.
    ///
    /// # Errors
    /// Returns [`SensorError::NotInitialized`] before
    /// [`RegisterSensor::begin`] has succeeded, or a transport error.
    pub fn read_temperature(&mut self, units: Units) -> Result<i32, SensorError<T::Error>> {
        let calibration = self.calibration.ok_or(SensorError::NotInitialized)?;
        let raw_temperature = self.read_raw_temperature()?;
        let celsius = compensation::register_temperature(raw_temperature, &calibration);
        Ok(units.convert_centi_celsius(celsius))
    }

    /// Reads the compensated pressure in the device's native units.
    ///
    /// # Errors
    /// Returns [`SensorError::NotInitialized`] before
    /// [`RegisterSensor::begin`] has succeeded, or a transport error.
    pub fn read_pressure(&mut self, mode: PressureMode) -> Result<i32, SensorError<T::Error>> {
        let calibration = self.calibration.ok_or(SensorError::NotInitialized)?;
        let raw_temperature = self.read_raw_temperature()?;
        let raw_pressure = self.read_raw_pressure(mode)?;
        Ok(compensation::register_pressure(
            raw_temperature,
            raw_pressure,
            &calibration,
        ))
    }
}
