#![cfg_attr(not(test), no_std)]

//! Driver for the Waveshare-style 4.2" (400x300) black/white e-paper panel with a
//! servo-driven speaker pointer.

mod framebuffer;
pub mod interface;
pub mod lut;
pub mod protocol;

pub use framebuffer::{BLACK, FrameBuffer, PackError, WHITE};
pub use interface::{BusError, CommandSink, Interface};
pub use lut::{RefreshController, RefreshMode};

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    pwm::SetDutyCycle,
    spi::SpiDevice,
};
use log::{debug, warn};

/// Driver configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Largest single SPI transfer in bytes.
    pub max_transfer: usize,
    /// Interval between busy-line samples.
    pub busy_poll_ms: u32,
    /// Upper bound for one busy wait.
    pub busy_timeout_ms: u32,
    /// Time the servo is powered after a pointer move.
    pub settle_ms: u32,
    /// Length of each phase of the hardware reset pulse.
    pub reset_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_transfer: protocol::DEFAULT_MAX_TRANSFER,
            busy_poll_ms: 100,
            busy_timeout_ms: 30_000,
            settle_ms: 250,
            reset_ms: 200,
        }
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<SpiErr, PinErr, PwmErr> {
    /// SPI transaction failed.
    Spi(SpiErr),
    /// RST, D/C or BUSY pin operation failed.
    Pin(PinErr),
    /// Servo PWM update failed.
    Servo(PwmErr),
    /// BUSY stayed asserted longer than the configured timeout.
    BusyTimeout { waited_ms: u32 },
    /// Input parameters are outside supported bounds.
    InvalidInput,
}

impl<SpiErr, PinErr, PwmErr> From<BusError<SpiErr, PinErr>> for Error<SpiErr, PinErr, PwmErr> {
    fn from(err: BusError<SpiErr, PinErr>) -> Self {
        match err {
            BusError::Spi(err) => Self::Spi(err),
            BusError::Pin(err) => Self::Pin(err),
        }
    }
}

pub type DriverResult<SpiErr, PinErr, PwmErr> = Result<(), Error<SpiErr, PinErr, PwmErr>>;

type Result4in2<SPI, DC, SERVO> = DriverResult<
    <SPI as embedded_hal::spi::ErrorType>::Error,
    <DC as embedded_hal::digital::ErrorType>::Error,
    <SERVO as embedded_hal::pwm::ErrorType>::Error,
>;

/// 4.2" panel driver.
///
/// Owns the bus, the control pins and the servo. The previously shown frame is
/// kept because the controller computes its waveforms from the old and the new
/// image.
pub struct Epd4in2<SPI, DC, RST, BUSY, SERVO> {
    interface: Interface<SPI, DC>,
    rst: RST,
    busy: BUSY,
    servo: SERVO,
    config: Config,
    refresh: RefreshController,
    previous: FrameBuffer,
}

impl<SPI, DC, RST, BUSY, SERVO> Epd4in2<SPI, DC, RST, BUSY, SERVO>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin<Error = DC::Error>,
    BUSY: InputPin<Error = DC::Error>,
    SERVO: SetDutyCycle,
{
    /// Creates a new driver instance. Call [`Self::init`] before showing frames.
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY, servo: SERVO, config: Config) -> Self {
        Self {
            interface: Interface::new(spi, dc, config.max_transfer),
            rst,
            busy,
            servo,
            config,
            refresh: RefreshController::new(),
            previous: FrameBuffer::new(),
        }
    }

    /// Returns current configuration.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Currently loaded refresh tables.
    pub fn refresh_mode(&self) -> Option<RefreshMode> {
        self.refresh.state()
    }

    /// Frame the panel will use as the "old" image on the next refresh.
    pub fn previous_frame(&self) -> &FrameBuffer {
        &self.previous
    }

    /// Resets and powers the controller, loads the slow LUTs and primes channel 1
    /// with a white image.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result4in2<SPI, DC, SERVO> {
        self.servo.set_duty_cycle_fully_off().map_err(Error::Servo)?;
        self.reset(delay)?;

        self.interface
            .command_with_data(protocol::BOOSTER_SOFT_START, &protocol::BOOSTER_SOFT_START_DATA)?;
        self.interface.command(protocol::POWER_ON)?;
        self.wait_until_idle(delay)?;
        self.interface
            .command_with_data(protocol::PANEL_SETTING, &[protocol::PANEL_SETTING_DATA])?;

        self.refresh.slow(&mut self.interface)?;

        self.previous = FrameBuffer::new();
        self.interface.command_with_data(
            protocol::DATA_START_TRANSMISSION_1,
            self.previous.bytes(),
        )?;

        debug!(
            "epd: initialized, {} byte transfers",
            self.interface.max_transfer()
        );
        Ok(())
    }

    /// Hardware reset: RST high, low, high.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result4in2<SPI, DC, SERVO> {
        self.rst.set_high().map_err(Error::Pin)?;
        delay.delay_ms(self.config.reset_ms);
        self.rst.set_low().map_err(Error::Pin)?;
        delay.delay_ms(self.config.reset_ms);
        self.rst.set_high().map_err(Error::Pin)?;
        delay.delay_ms(self.config.reset_ms);
        Ok(())
    }

    /// Blanks the panel with a slow refresh.
    pub fn clear<D: DelayNs>(&mut self, delay: &mut D) -> Result4in2<SPI, DC, SERVO> {
        self.set_refresh_mode(RefreshMode::Slow)?;
        let white = FrameBuffer::new();
        self.interface
            .command_with_data(protocol::DATA_START_TRANSMISSION_1, white.bytes())?;
        self.interface
            .command_with_data(protocol::DATA_START_TRANSMISSION_2, white.bytes())?;
        self.previous = white;
        self.interface.command(protocol::DISPLAY_REFRESH)?;
        self.wait_until_idle(delay)
    }

    /// Loads the LUTs for `mode` unless they are already active.
    pub fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result4in2<SPI, DC, SERVO> {
        self.refresh.set(&mut self.interface, mode)?;
        Ok(())
    }

    /// Sends old and new image and triggers the refresh without waiting for it.
    pub fn transmit_frame(&mut self, frame: &FrameBuffer) -> Result4in2<SPI, DC, SERVO> {
        self.interface.command_with_data(
            protocol::DATA_START_TRANSMISSION_1,
            self.previous.bytes(),
        )?;
        self.interface
            .command_with_data(protocol::DATA_START_TRANSMISSION_2, frame.bytes())?;
        self.previous = frame.clone();
        self.interface.command(protocol::DISPLAY_REFRESH)?;
        Ok(())
    }

    /// Drives the pointer servo to `target` percent duty, holds it for the settle
    /// time and powers it off again.
    pub fn move_pointer<D: DelayNs>(
        &mut self,
        target: u8,
        delay: &mut D,
    ) -> Result4in2<SPI, DC, SERVO> {
        if target > 100 {
            return Err(Error::InvalidInput);
        }

        self.servo
            .set_duty_cycle_percent(target)
            .map_err(Error::Servo)?;
        delay.delay_ms(self.config.settle_ms);
        // Release the servo once settled.
        self.servo.set_duty_cycle_fully_off().map_err(Error::Servo)
    }

    /// Polls BUSY until the controller reports idle (line high).
    pub fn wait_until_idle<D: DelayNs>(&mut self, delay: &mut D) -> Result4in2<SPI, DC, SERVO> {
        let mut waited_ms = 0u32;
        while self.busy.is_low().map_err(Error::Pin)? {
            if waited_ms >= self.config.busy_timeout_ms {
                warn!("epd: busy line stuck after {}ms", waited_ms);
                return Err(Error::BusyTimeout { waited_ms });
            }
            delay.delay_ms(self.config.busy_poll_ms);
            waited_ms = waited_ms.saturating_add(self.config.busy_poll_ms);
        }

        if waited_ms > self.config.busy_poll_ms {
            debug!("epd: refresh finished after {}ms", waited_ms);
        }
        Ok(())
    }

    /// Shows `frame` and moves the pointer while the panel refreshes.
    pub fn show_and_move<D: DelayNs>(
        &mut self,
        frame: &FrameBuffer,
        mode: RefreshMode,
        pointer: u8,
        delay: &mut D,
    ) -> Result4in2<SPI, DC, SERVO> {
        self.set_refresh_mode(mode)?;
        self.transmit_frame(frame)?;
        self.move_pointer(pointer, delay)?;
        self.wait_until_idle(delay)
    }

    /// Powers the panel down into deep sleep and releases the servo.
    pub fn sleep<D: DelayNs>(&mut self, delay: &mut D) -> Result4in2<SPI, DC, SERVO> {
        self.interface.command(protocol::POWER_OFF)?;
        self.wait_until_idle(delay)?;
        self.interface
            .command_with_data(protocol::DEEP_SLEEP, &[protocol::DEEP_SLEEP_CHECK])?;
        self.servo.set_duty_cycle_fully_off().map_err(Error::Servo)
    }
}

#[cfg(test)]
mod tests;
