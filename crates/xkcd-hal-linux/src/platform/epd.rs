use std::path::Path;

use epd4in2::{Epd4in2, FrameBuffer, RefreshMode};
use linux_embedded_hal::{
    CdevPin, Delay, SpidevDevice,
    gpio_cdev::{Chip, LineRequestFlags},
    spidev::{SpiModeFlags, SpidevOptions},
};
use log::info;
use xkcd_core::device::PanelDevice;

use super::{
    servo::SysfsPwm,
    spi::{BUFSIZ_PARAM, discover_max_transfer},
};
use crate::{DeviceConfig, HalError};

const CONSUMER: &str = "xkcd-display";

type LinuxEpd = Epd4in2<SpidevDevice, CdevPin, CdevPin, CdevPin, SysfsPwm>;

/// The 4.2" panel wired to spidev, GPIO character device lines and a sysfs PWM
/// servo.
pub struct EpdPanel {
    epd: LinuxEpd,
    delay: Delay,
}

fn request_line(
    chip: &mut Chip,
    offset: u32,
    flags: LineRequestFlags,
    context: &'static str,
) -> Result<CdevPin, HalError> {
    let line = chip.get_line(offset).map_err(|e| HalError::bus(context, e))?;
    let handle = line
        .request(flags, 0, CONSUMER)
        .map_err(|e| HalError::bus(context, e))?;
    CdevPin::new(handle).map_err(|e| HalError::bus(context, e))
}

impl EpdPanel {
    pub fn open(config: &DeviceConfig) -> Result<Self, HalError> {
        let mut spi =
            SpidevDevice::open(&config.spi_path).map_err(|e| HalError::bus("opening SPI device", e))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(config.spi_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.configure(&options)
            .map_err(|e| HalError::bus("configuring SPI", e))?;

        let mut chip = Chip::new(&config.gpio_chip).map_err(|e| HalError::bus("opening GPIO chip", e))?;
        let rst = request_line(&mut chip, config.rst_pin, LineRequestFlags::OUTPUT, "RST line")?;
        let dc = request_line(&mut chip, config.dc_pin, LineRequestFlags::OUTPUT, "DC line")?;
        let busy = request_line(&mut chip, config.busy_pin, LineRequestFlags::INPUT, "BUSY line")?;

        let servo = SysfsPwm::open(config.pwm_chip, config.pwm_channel, config.servo_hz)?;

        let max_transfer = config
            .max_transfer_bytes
            .unwrap_or_else(|| discover_max_transfer(Path::new(BUFSIZ_PARAM)));
        info!(
            "epd: {} at {}Hz, {} byte transfers",
            config.spi_path.display(),
            config.spi_hz,
            max_transfer
        );

        Ok(Self {
            epd: Epd4in2::new(spi, dc, rst, busy, servo, config.driver_config(max_transfer)),
            delay: Delay,
        })
    }
}

fn driver_error(err: impl core::fmt::Debug) -> HalError {
    HalError::Driver(format!("{err:?}"))
}

impl PanelDevice for EpdPanel {
    type Error = HalError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.epd.init(&mut self.delay).map_err(driver_error)
    }

    fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        self.epd.set_refresh_mode(mode).map_err(driver_error)
    }

    fn transmit_frame(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error> {
        self.epd.transmit_frame(frame).map_err(driver_error)
    }

    fn move_pointer(&mut self, target: u8) -> Result<(), Self::Error> {
        self.epd
            .move_pointer(target, &mut self.delay)
            .map_err(driver_error)
    }

    fn wait_idle(&mut self) -> Result<(), Self::Error> {
        self.epd.wait_until_idle(&mut self.delay).map_err(driver_error)
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        self.epd.sleep(&mut self.delay).map_err(driver_error)
    }
}
