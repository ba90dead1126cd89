#![no_main]
use embedded_hal_fuzz::{i2c::I2cFuzz, shared_data::FuzzData};
use libfuzzer_sys::fuzz_target;
use ms5803::{
    register::{PressureMode, RegisterSensor},
    Address, I2cTransport, OverSamplingRatio, Units,
};

type Error = ();

fuzz_target!(|data: &[u8]| {
    let data = FuzzData::new(data);
    let i2c: I2cFuzz<'_, Error> = I2cFuzz::new(data);
    let mut pressure_sensor = ms5803::new_i2c(i2c, Address::High, ms5803::mock_utils::SleepNop);
    if pressure_sensor.begin().is_ok() {
        // The readings are likely garbage. We don't care about the
        // result/error just if the compensation math crashes or not.
        let _ = pressure_sensor.read_temperature(Units::Fahrenheit, OverSamplingRatio::R4096);
        let _ = pressure_sensor.read_temperature_and_pressure(OverSamplingRatio::R4096);
    }

    let (transport, sleep) = pressure_sensor.release();
    let mut register_sensor = RegisterSensor::new(
        I2cTransport::new(transport.release(), Address::Low),
        sleep,
    );
    if register_sensor.begin().is_ok() {
        let _ = register_sensor.read_temperature(Units::Fahrenheit);
        let _ = register_sensor.read_pressure(PressureMode::Ultra);
    }
});
