use crate::{transport::Transport, Command};

/// Number of 16 bit words held in the PROM.
pub const PROM_WORDS: usize = 8;

/// The factory calibration data as fetched from the PROM.
///
/// Word `i` is read with the command `0xA0 + 2 * i`. On the 24-bit ADC
/// devices word 0 holds factory data, words 1 to 6 hold the datasheet
/// coefficients C1 to C6 and word 7 holds the serial code and CRC.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSet {
    words: [u16; PROM_WORDS],
}

impl CalibrationSet {
    pub const fn new(words: [u16; PROM_WORDS]) -> Self {
        Self { words }
    }

    /// The raw PROM word at `index`, or `None` past the end of the PROM.
    pub fn coefficient(&self, index: usize) -> Option<u16> {
        self.words.get(index).copied()
    }

    pub fn words(&self) -> &[u16; PROM_WORDS] {
        &self.words
    }

    /// C1, pressure sensitivity SENS_T1.
    pub fn pressure_sensitivity(&self) -> u16 {
        self.words[1]
    }

    /// C2, pressure offset OFF_T1.
    pub fn pressure_offset(&self) -> u16 {
        self.words[2]
    }

    /// C3, temperature coefficient of pressure sensitivity TCS.
    pub fn temperature_coefficient_of_pressure_sensitivity(&self) -> u16 {
        self.words[3]
    }

    /// C4, temperature coefficient of pressure offset TCO.
    pub fn temperature_coefficient_of_pressure_offset(&self) -> u16 {
        self.words[4]
    }

    /// C5, reference temperature T_REF.
    pub fn reference_temperature(&self) -> u16 {
        self.words[5]
    }

    /// C6, temperature coefficient of the temperature TEMPSENS.
    pub fn temperature_coefficient_of_temperature(&self) -> u16 {
        self.words[6]
    }
}

/// Reads every PROM word in ascending order, handing each one to `hook`.
pub(crate) fn read_prom<T: Transport>(
    transport: &mut T,
    hook: Option<fn(u8, u16)>,
) -> Result<CalibrationSet, T::Error> {
    let mut words = [0u16; PROM_WORDS];
    for (index, word) in (0u8..).zip(words.iter_mut()) {
        *word = transport.read_u16(Command::PromRead(index).into())?;
        debug!("prom word {=u8} = {=u16}", index, *word);
        if let Some(hook) = hook {
            hook(index, *word);
        }
    }
    Ok(CalibrationSet::new(words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_coefficients_follow_prom_order() {
        let calibration = CalibrationSet::new([0x1234, 1, 2, 3, 4, 500, 1200, 7]);
        assert_eq!(calibration.coefficient(0), Some(0x1234));
        assert_eq!(calibration.pressure_sensitivity(), 1);
        assert_eq!(calibration.pressure_offset(), 2);
        assert_eq!(calibration.temperature_coefficient_of_pressure_sensitivity(), 3);
        assert_eq!(calibration.temperature_coefficient_of_pressure_offset(), 4);
        assert_eq!(calibration.reference_temperature(), 500);
        assert_eq!(calibration.temperature_coefficient_of_temperature(), 1200);
        assert_eq!(calibration.coefficient(7), Some(7));
        assert_eq!(calibration.coefficient(8), None);
    }
}
