use embedded_hal::blocking::delay::DelayUs;

use crate::{
    calibration::{self, CalibrationSet},
    compensation::{self, CompensatedReading},
    transport::Transport,
    Command, OverSamplingRatio, SensorError, Units,
};

/// Time the device needs to reload its PROM after a reset.
const RESET_TIME_US: u32 = 3_000;

/// A group of temperature and pressure samples. These are grouped as pressure
/// normalisation requires sampling the current temperature.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Millibar.
    pub pressure: f32,
}

impl Measurement {
    pub fn temperature_in(&self, units: Units) -> f32 {
        units.convert_celsius(self.temperature)
    }
}

impl From<CompensatedReading> for Measurement {
    fn from(reading: CompensatedReading) -> Self {
        Measurement {
            temperature: (reading.temperature as f32) / 100.0,
            pressure: (reading.pressure as f32) / 10.0,
        }
    }
}

/// An MS5803 with a 24 bit ADC, attached over any [`Transport`].
///
/// The driver must be calibrated with [`Ms5803::begin`] before any
/// compensated value can be read. Each measurement blocks for the full
/// conversion time of the requested oversampling ratio.
pub struct Ms5803<T: Transport, D: DelayUs<u32>> {
    transport: T,
    sleep: D,
    calibration: Option<CalibrationSet>,
    calibration_hook: Option<fn(u8, u16)>,
}

impl<T: Transport, D: DelayUs<u32>> Ms5803<T, D> {
    pub fn new(transport: T, sleep: D) -> Self {
        Self {
            transport,
            sleep,
            calibration: None,
            calibration_hook: None,
        }
    }

    /// Releases the transport and delay, consuming the driver.
    pub fn release(self) -> (T, D) {
        (self.transport, self.sleep)
    }

    /// The calibration read by the last successful [`Ms5803::begin`].
    pub fn calibration(&self) -> Option<&CalibrationSet> {
        self.calibration.as_ref()
    }

    /// Registers a function called with the index and value of every PROM word
    /// read by [`Ms5803::begin`].
    pub fn set_calibration_hook(&mut self, hook: fn(u8, u16)) {
        self.calibration_hook = Some(hook);
    }

    fn send(&mut self, command: Command) -> Result<(), SensorError<T::Error>> {
        let byte: u8 = command.into();
        trace!("ms5803 command {=u8:#x}", byte);
        self.transport
            .send_command(byte)
            .map_err(SensorError::TransportError)
    }

    /// Reset the internal state machine. This needs to be done once after
    /// power-up, before calling [`Ms5803::begin`].
    pub fn reset(&mut self) -> Result<(), SensorError<T::Error>> {
        let byte: u8 = Command::Reset.into();
        trace!("ms5803 command {=u8:#x}", byte);
        let sleep = &mut self.sleep;
        self.transport
            .send_command_and_wait(byte, || sleep.delay_us(RESET_TIME_US))
            .map_err(SensorError::TransportError)
    }

    /// Reads the factory calibration data from the PROM.
    ///
    /// # Errors
    /// Fails if there was a problem communicating over the bus. A failed read
    /// leaves the calibration from any earlier call in place.
    pub fn begin(&mut self) -> Result<(), SensorError<T::Error>> {
        let calibration = calibration::read_prom(&mut self.transport, self.calibration_hook)
            .map_err(SensorError::TransportError)?;
        self.calibration = Some(calibration);
        Ok(())
    }

    fn calibrated(&self) -> Result<CalibrationSet, SensorError<T::Error>> {
        self.calibration.ok_or(SensorError::NotInitialized)
    }

    fn convert(
        &mut self,
        command: Command,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<u32, SensorError<T::Error>> {
        self.send(command)?;
        self.sleep
            .delay_us(over_sampling_ratio.conversion_time_us());
        self.transport
            .read_u24(Command::AdcRead.into())
            .map_err(SensorError::TransportError)
    }

    /// Starts conversion and reads raw temperature, D2, from the sensor.
    pub fn read_raw_temperature(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<u32, SensorError<T::Error>> {
        self.convert(Command::ConvertD2(over_sampling_ratio), over_sampling_ratio)
    }

    /// Starts conversion and reads raw pressure, D1, from the sensor.
    pub fn read_raw_pressure(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<u32, SensorError<T::Error>> {
        self.convert(Command::ConvertD1(over_sampling_ratio), over_sampling_ratio)
    }

    /// Reads the first order compensated temperature.
    ///
    /// # Errors
    /// Returns [`SensorError::NotInitialized`] before [`Ms5803::begin`] has
    /// succeeded, or a transport error.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use embedded_hal_mock::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    /// # let mut transactions = (0u8..8)
    /// #     .map(|i| I2cTransaction::write_read(0x77, vec![0xA0 + 2 * i], vec![0, 0]))
    /// #     .collect::<Vec<_>>();
    /// # transactions[5] = I2cTransaction::write_read(0x77, vec![0xAA], vec![0x01, 0xF4]);
    /// # transactions[6] = I2cTransaction::write_read(0x77, vec![0xAC], vec![0x04, 0xB0]);
    /// # transactions.push(I2cTransaction::write(0x77, vec![0x50]));
    /// # transactions.push(I2cTransaction::write_read(0x77, vec![0x00], vec![0x7A, 0x12, 0x00]));
    /// # let i2c = I2cMock::new(&transactions);
    /// use ms5803::{Address, OverSamplingRatio, Units, mock_utils::SleepNop};
    /// let mut pressure_sensor = ms5803::new_i2c(i2c, Address::Low, SleepNop);
    /// pressure_sensor.begin().unwrap();
    /// let celsius = pressure_sensor
    ///     .read_temperature(Units::Celsius, OverSamplingRatio::R256)
    ///     .unwrap();
    /// assert!((celsius - 31.26).abs() < 0.01);
    /// ```
    pub fn read_temperature(
        &mut self,
        units: Units,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<f32, SensorError<T::Error>> {
        let calibration = self.calibrated()?;
        let raw_temperature = self.read_raw_temperature(over_sampling_ratio)?;
        let celsius = compensation::first_order_temperature_celsius(raw_temperature, &calibration);
        Ok(units.convert_celsius(celsius))
    }

    /// Reads the first order compensated temperature in hundredths of a
    /// degree Celsius.
    pub fn read_temperature_centi(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<i32, SensorError<T::Error>> {
        let calibration = self.calibrated()?;
        let raw_temperature = self.read_raw_temperature(over_sampling_ratio)?;
        Ok(compensation::first_order_temperature(
            raw_temperature,
            &calibration,
        ))
    }

    /// Reads the temperature and pressure samples from the sensor and applies
    /// the second order compensation.
    ///
    /// # Errors
    /// Returns [`SensorError::NotInitialized`] before [`Ms5803::begin`] has
    /// succeeded, or a transport error.
    pub fn read_temperature_and_pressure(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<Measurement, SensorError<T::Error>> {
        let calibration = self.calibrated()?;
        // Pressure compensation depends on dT, so temperature is always
        // converted first.
        let temperature = self.read_raw_temperature(over_sampling_ratio)?;
        let pressure = self.read_raw_pressure(over_sampling_ratio)?;

        Ok(compensation::compensate(temperature, pressure, &calibration).into())
    }

    /// Reads the temperature compensated pressure in millibar.
    pub fn read_pressure(
        &mut self,
        over_sampling_ratio: OverSamplingRatio,
    ) -> Result<f32, SensorError<T::Error>> {
        Ok(self
            .read_temperature_and_pressure(over_sampling_ratio)?
            .pressure)
    }
}
