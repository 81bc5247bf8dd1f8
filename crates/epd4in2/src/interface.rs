//! Command/data framing over SPI with a data/command select line.

use embedded_hal::{digital::OutputPin, spi::SpiDevice};

use crate::protocol;

/// Byte-level command channel of the panel controller.
pub trait CommandSink {
    type Error;

    /// Sends one command byte (D/C low).
    fn command(&mut self, command: u8) -> Result<(), Self::Error>;

    /// Sends a data burst (D/C high).
    fn data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends a command followed by its parameter bytes.
    fn command_with_data(&mut self, command: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.command(command)?;
        self.data(data)
    }
}

/// Bus-level failures.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BusError<SpiErr, PinErr> {
    Spi(SpiErr),
    Pin(PinErr),
}

/// SPI device plus D/C line.
///
/// Data bursts are split into transfers of at most `max_transfer` bytes since
/// spidev rejects messages larger than its buffer.
#[derive(Debug)]
pub struct Interface<SPI, DC> {
    spi: SPI,
    dc: DC,
    max_transfer: usize,
}

impl<SPI, DC> Interface<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC, max_transfer: usize) -> Self {
        let max_transfer = if max_transfer == 0 {
            protocol::DEFAULT_MAX_TRANSFER
        } else {
            max_transfer
        };
        Self {
            spi,
            dc,
            max_transfer,
        }
    }

    pub fn max_transfer(&self) -> usize {
        self.max_transfer
    }
}

impl<SPI, DC> CommandSink for Interface<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    type Error = BusError<SPI::Error, DC::Error>;

    fn command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.dc.set_low().map_err(BusError::Pin)?;
        self.spi.write(&[command]).map_err(BusError::Spi)
    }

    fn data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.dc.set_high().map_err(BusError::Pin)?;
        for chunk in protocol::transfer_chunks(data, self.max_transfer) {
            self.spi.write(chunk).map_err(BusError::Spi)?;
        }
        Ok(())
    }
}
