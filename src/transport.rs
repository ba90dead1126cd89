//! Byte level access to the sensor over I2C or SPI.
//!
//! The sensor speaks the same command set over both buses: a single command
//! byte starts an operation and results are clocked out most significant byte
//! first. [`Transport`] captures that shape so the measurement logic never
//! has to know which bus it is talking to.

use embedded_hal::{
    blocking::{
        i2c::{Write as I2cWrite, WriteRead},
        spi::{Transfer, Write as SpiWrite},
    },
    digital::v2::OutputPin,
};

/// A bus capable of sending commands to the sensor and reading back results.
pub trait Transport {
    /// Error raised by the underlying bus.
    type Error;

    /// Writes `bytes` to the device in a single transaction.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Sends `command` then fills `buffer` with the bytes the device returns.
    fn write_read(&mut self, command: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Sends a single command byte.
    fn send_command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.write(&[command])
    }

    /// Sends a single command byte and runs `wait` before the transaction is
    /// considered finished. Buses with a chip-select keep the device selected
    /// for the whole wait.
    fn send_command_and_wait<F: FnOnce()>(
        &mut self,
        command: u8,
        wait: F,
    ) -> Result<(), Self::Error> {
        self.send_command(command)?;
        wait();
        Ok(())
    }

    /// Reads a big-endian 16 bit word in response to `command`.
    fn read_u16(&mut self, command: u8) -> Result<u16, Self::Error> {
        let mut buffer = [0u8; 2];
        self.write_read(command, &mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    /// Reads a big-endian 24 bit value in response to `command`.
    fn read_u24(&mut self, command: u8) -> Result<u32, Self::Error> {
        let mut buffer = [0u8; 4];
        // ADC is 24bit but we are storing in u32.
        self.write_read(command, &mut buffer[1..])?;
        Ok(u32::from_be_bytes(buffer))
    }
}

/// I2C address of the sensor, selected by the level of the CSB pin.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    High = 0x76,
    Low = 0x77,
}

pub trait I2cMarker: WriteRead + I2cWrite
where
    Self: I2cWrite<Error = <Self as WriteRead>::Error>,
{
}
impl<T: WriteRead + I2cWrite> I2cMarker for T where
    Self: I2cWrite<Error = <Self as WriteRead>::Error>
{
}

/// A sensor attached to an I2C bus.
pub struct I2cTransport<I2C: I2cMarker> {
    i2c: I2C,
    address: Address,
}

impl<I2C: I2cMarker> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Releases the i2c handle.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2cMarker> Transport for I2cTransport<I2C> {
    type Error = <I2C as WriteRead>::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address as u8, bytes)
    }

    fn write_read(&mut self, command: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address as u8, &[command], buffer)
    }
}

/// Error raised by [`SpiTransport`].
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError<S, P> {
    Spi(S),
    ChipSelect(P),
}

pub trait SpiMarker: Transfer<u8> + SpiWrite<u8>
where
    Self: SpiWrite<u8, Error = <Self as Transfer<u8>>::Error>,
{
}
impl<T: Transfer<u8> + SpiWrite<u8>> SpiMarker for T where
    Self: SpiWrite<u8, Error = <Self as Transfer<u8>>::Error>
{
}

/// A sensor attached to an SPI bus with a dedicated chip-select line.
///
/// Every transaction is framed by driving chip-select low and is released
/// again afterwards, including when the transfer itself fails.
pub struct SpiTransport<SPI: SpiMarker, CS: OutputPin> {
    spi: SPI,
    cs: CS,
}

type SpiResult<SPI, CS> =
    Result<(), SpiError<<SPI as Transfer<u8>>::Error, <CS as OutputPin>::Error>>;

impl<SPI: SpiMarker, CS: OutputPin> SpiTransport<SPI, CS> {
    /// Creates the transport, leaving chip-select deasserted.
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, SpiError<<SPI as Transfer<u8>>::Error, CS::Error>> {
        cs.set_high().map_err(SpiError::ChipSelect)?;
        Ok(Self { spi, cs })
    }

    /// Releases the spi handle and chip-select pin.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn framed<F>(&mut self, transaction: F) -> SpiResult<SPI, CS>
    where
        F: FnOnce(&mut SPI) -> Result<(), <SPI as Transfer<u8>>::Error>,
    {
        self.cs.set_low().map_err(SpiError::ChipSelect)?;
        let result = transaction(&mut self.spi).map_err(SpiError::Spi);
        let released = self.cs.set_high().map_err(SpiError::ChipSelect);
        result.and(released)
    }
}

impl<SPI: SpiMarker, CS: OutputPin> Transport for SpiTransport<SPI, CS> {
    type Error = SpiError<<SPI as Transfer<u8>>::Error, <CS as OutputPin>::Error>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.framed(|spi| spi.write(bytes))
    }

    fn send_command_and_wait<F: FnOnce()>(
        &mut self,
        command: u8,
        wait: F,
    ) -> Result<(), Self::Error> {
        self.framed(|spi| {
            spi.write(&[command])?;
            wait();
            Ok(())
        })
    }

    fn write_read(&mut self, command: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.framed(|spi| {
            spi.write(&[command])?;
            // Filler bytes clock the response out of the device.
            buffer.fill(0);
            spi.transfer(buffer)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::{
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
        pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
        spi::{Mock as SpiMock, Transaction as SpiTransaction},
        MockError,
    };
    use core::cell::RefCell;
    use std::{io::ErrorKind, vec::Vec};

    type Log = RefCell<Vec<&'static str>>;

    /// Bus that either accepts everything or fails every call.
    struct StubSpi {
        fail: bool,
        writes: usize,
    }

    impl Transfer<u8> for StubSpi {
        type Error = ();

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
            if self.fail {
                return Err(());
            }
            Ok(words)
        }
    }

    impl SpiWrite<u8> for StubSpi {
        type Error = ();

        fn write(&mut self, _words: &[u8]) -> Result<(), ()> {
            self.writes += 1;
            if self.fail {
                return Err(());
            }
            Ok(())
        }
    }

    /// Chip-select that records every level it is driven to.
    struct LoggedPin<'a> {
        log: &'a Log,
        fail_low: bool,
    }

    impl OutputPin for LoggedPin<'_> {
        type Error = ();

        fn set_low(&mut self) -> Result<(), ()> {
            if self.fail_low {
                return Err(());
            }
            self.log.borrow_mut().push("low");
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ()> {
            self.log.borrow_mut().push("high");
            Ok(())
        }
    }

    #[test]
    fn i2c_send_command_uses_selected_address() {
        for (address, byte) in [(Address::High, 0x76), (Address::Low, 0x77)] {
            let i2c = I2cMock::new(&[I2cTransaction::write(byte, vec![0x1E])]);
            let mut transport = I2cTransport::new(i2c, address);
            transport.send_command(0x1E).unwrap();
            assert_eq!(transport.address(), address);
            let mut i2c = transport.release();
            i2c.done();
        }
    }

    #[test]
    fn i2c_reads_are_big_endian() {
        let i2c = I2cMock::new(&[
            I2cTransaction::write_read(0x77, vec![0xA0], vec![0x12, 0x34]),
            I2cTransaction::write_read(0x77, vec![0x00], vec![0x12, 0x34, 0x56]),
        ]);
        let mut transport = I2cTransport::new(i2c, Address::Low);
        assert_eq!(transport.read_u16(0xA0).unwrap(), 0x1234);
        assert_eq!(transport.read_u24(0x00).unwrap(), 0x123456);
        let mut i2c = transport.release();
        i2c.done();
    }

    #[test]
    fn i2c_error_is_propagated() {
        let i2c = I2cMock::new(&[I2cTransaction::write(0x76, vec![0x48])
            .with_error(MockError::Io(ErrorKind::Other))]);
        let mut transport = I2cTransport::new(i2c, Address::High);
        transport.send_command(0x48).unwrap_err();
        let mut i2c = transport.release();
        i2c.done();
    }

    #[test]
    fn spi_frames_each_transaction_with_chip_select() {
        let spi = SpiMock::new(&[
            SpiTransaction::write(vec![0x1E]),
            SpiTransaction::write(vec![0x00]),
            SpiTransaction::transfer(vec![0x00, 0x00, 0x00], vec![0xAB, 0xCD, 0xEF]),
        ]);
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut transport = SpiTransport::new(spi, cs).unwrap();
        transport.send_command(0x1E).unwrap();
        assert_eq!(transport.read_u24(0x00).unwrap(), 0xABCDEF);
        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn spi_prom_word_read() {
        let spi = SpiMock::new(&[
            SpiTransaction::write(vec![0xA2]),
            SpiTransaction::transfer(vec![0x00, 0x00], vec![0x8E, 0x00]),
        ]);
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut transport = SpiTransport::new(spi, cs).unwrap();
        assert_eq!(transport.read_u16(0xA2).unwrap(), 0x8E00);
        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn spi_chip_select_error_skips_the_bus() {
        let log = Log::default();
        let spi = StubSpi { fail: false, writes: 0 };
        let cs = LoggedPin { log: &log, fail_low: true };
        let mut transport = SpiTransport::new(spi, cs).unwrap();
        assert_eq!(transport.send_command(0x1E), Err(SpiError::ChipSelect(())));
        let mut buffer = [0u8; 2];
        assert_eq!(
            transport.write_read(0xA0, &mut buffer),
            Err(SpiError::ChipSelect(()))
        );
        let (spi, _) = transport.release();
        assert_eq!(spi.writes, 0);
        assert_eq!(*log.borrow(), ["high"]);
    }

    #[test]
    fn spi_bus_error_still_releases_chip_select() {
        let log = Log::default();
        let spi = StubSpi { fail: true, writes: 0 };
        let cs = LoggedPin { log: &log, fail_low: false };
        let mut transport = SpiTransport::new(spi, cs).unwrap();
        assert_eq!(transport.send_command(0x48), Err(SpiError::Spi(())));
        assert_eq!(transport.read_u24(0x00), Err(SpiError::Spi(())));
        assert_eq!(*log.borrow(), ["high", "low", "high", "low", "high"]);
    }

    #[test]
    fn spi_holds_chip_select_while_waiting() {
        let log = Log::default();
        let spi = StubSpi { fail: false, writes: 0 };
        let cs = LoggedPin { log: &log, fail_low: false };
        let mut transport = SpiTransport::new(spi, cs).unwrap();
        transport
            .send_command_and_wait(0x1E, || log.borrow_mut().push("wait"))
            .unwrap();
        assert_eq!(*log.borrow(), ["high", "low", "wait", "high"]);
        let (spi, _) = transport.release();
        assert_eq!(spi.writes, 1);
    }

    #[test]
    fn i2c_waits_after_the_command() {
        let i2c = I2cMock::new(&[I2cTransaction::write(0x77, vec![0x1E])]);
        let mut transport = I2cTransport::new(i2c, Address::Low);
        let mut waited = false;
        transport.send_command_and_wait(0x1E, || waited = true).unwrap();
        assert!(waited);
        let mut i2c = transport.release();
        i2c.done();
    }
}
