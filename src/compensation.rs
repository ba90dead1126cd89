//! Conversion of raw ADC counts into calibrated values.
//!
//! Everything in here is pure integer arithmetic on the calibration set so it
//! can be checked against known vectors without a bus. Divisions by powers of
//! two are arithmetic shifts, which round towards negative infinity.

use crate::calibration::CalibrationSet;

/// Second order compensated temperature and pressure.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedReading {
    /// Hundredths of a degree Celsius.
    pub temperature: i32,
    /// Tenths of a millibar.
    pub pressure: i32,
}

/// Difference between the actual and reference temperature, dT.
pub fn delta_temperature(raw_temperature: u32, calibration: &CalibrationSet) -> i64 {
    raw_temperature as i64 - ((calibration.reference_temperature() as i64) << 8)
}

/// First order temperature in hundredths of a degree Celsius.
pub fn first_order_temperature(raw_temperature: u32, calibration: &CalibrationSet) -> i32 {
    let dt = delta_temperature(raw_temperature, calibration);
    (2000 + ((dt * calibration.temperature_coefficient_of_temperature() as i64) >> 23)) as i32
}

/// First order temperature in degrees Celsius without integer truncation.
pub fn first_order_temperature_celsius(raw_temperature: u32, calibration: &CalibrationSet) -> f32 {
    let dt = delta_temperature(raw_temperature, calibration) as f32;
    let temp_sens = calibration.temperature_coefficient_of_temperature() as f32;
    (2000.0 + dt * temp_sens / 8_388_608.0) / 100.0
}

/// Applies the full second order compensation to a temperature/pressure pair.
pub fn compensate(
    raw_temperature: u32,
    raw_pressure: u32,
    calibration: &CalibrationSet,
) -> CompensatedReading {
    let adc_pressure = raw_pressure as i64;
    let pressure_sensitivity = calibration.pressure_sensitivity() as i64;
    let pressure_offset = calibration.pressure_offset() as i64;
    let tcs = calibration.temperature_coefficient_of_pressure_sensitivity() as i64;
    let tco = calibration.temperature_coefficient_of_pressure_offset() as i64;
    let temp_sens = calibration.temperature_coefficient_of_temperature() as i64;

    let dt = delta_temperature(raw_temperature, calibration);

    // Actual temperature = 2000 + dT * TEMPSENS
    let temperature = 2000 + ((dt * temp_sens) >> 23);

    // OFF = OFF_T1 + TCO * dT
    let mut offset = (pressure_offset << 16) + ((tco * dt) >> 7);
    // SENS = SENS_T1 + TCS * dT
    let mut sensitivity = (pressure_sensitivity << 15) + ((tcs * dt) >> 8);

    let t2;
    let offset2;
    let sensitivity2;
    if temperature < 2000 {
        let low = (temperature - 2000).pow(2);
        t2 = (3 * dt.pow(2)) >> 33;
        let mut off2 = (3 * low) >> 1;
        let mut sens2 = (5 * low) >> 3;
        if temperature < -1500 {
            let very_low = (temperature + 1500).pow(2);
            off2 += 7 * very_low;
            sens2 += 4 * very_low;
        }
        offset2 = off2;
        sensitivity2 = sens2;
    } else {
        t2 = (7 * dt.pow(2)) >> 37;
        offset2 = (temperature - 2000).pow(2) >> 4;
        sensitivity2 = 0;
    }
    offset -= offset2;
    sensitivity -= sensitivity2;

    // P = D1 * SENS - OFF
    let pressure = (((adc_pressure * sensitivity) >> 21) - offset) >> 15;

    CompensatedReading {
        temperature: (temperature - t2) as i32,
        pressure: pressure as i32,
    }
}

/// First order temperature for the register-style devices in hundredths of a
/// degree Celsius. C5 and C6 are the fifth and sixth PROM words.
pub fn register_temperature(raw_temperature: u16, calibration: &CalibrationSet) -> i32 {
    let words = calibration.words();
    let dt = raw_temperature as i64 - ((words[4] as i64) << 8);
    (2000 + ((dt * words[5] as i64) >> 23)) as i32
}

/// Fixed point pressure for the register-style devices, which carry eight
/// calibration words C1 to C8 in PROM order and 16 bit ADC results.
pub fn register_pressure(
    raw_temperature: u16,
    raw_pressure: u16,
    calibration: &CalibrationSet,
) -> i32 {
    let c = |n: usize| calibration.words()[n - 1] as i64;
    let t = raw_temperature as i64;
    let p = raw_pressure as i64;

    let sensitivity = ((((c(5) * t) >> 15) * t) >> 19) + c(3) + ((c(4) * t) >> 17);
    let offset = ((((c(8) * t) >> 15) * t) >> 4) + ((c(7) * t) >> 3) + c(6) * 0x4000;

    ((sensitivity * p + offset) >> 14) as i32
}
