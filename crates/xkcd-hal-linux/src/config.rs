//! `[device]` configuration section.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Real panel on spidev/GPIO/PWM.
    Epd,
    /// Logs instead of drawing.
    #[default]
    Dummy,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub backend: Backend,
    pub spi_path: PathBuf,
    pub spi_hz: u32,
    pub gpio_chip: PathBuf,
    pub rst_pin: u32,
    pub dc_pin: u32,
    pub busy_pin: u32,
    pub pwm_chip: u32,
    pub pwm_channel: u32,
    pub servo_hz: u32,
    /// Discovered from the spidev module parameters when unset.
    pub max_transfer_bytes: Option<usize>,
    pub busy_poll_ms: u32,
    pub busy_timeout_ms: u32,
    pub settle_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Dummy,
            spi_path: PathBuf::from("/dev/spidev0.0"),
            spi_hz: 2_000_000,
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            rst_pin: 17,
            dc_pin: 25,
            busy_pin: 24,
            pwm_chip: 0,
            pwm_channel: 0,
            servo_hz: 50,
            max_transfer_bytes: None,
            busy_poll_ms: 100,
            busy_timeout_ms: 30_000,
            settle_ms: 250,
        }
    }
}

impl DeviceConfig {
    /// Driver timing for the given transfer limit.
    pub fn driver_config(&self, max_transfer: usize) -> epd4in2::Config {
        epd4in2::Config {
            max_transfer,
            busy_poll_ms: self.busy_poll_ms,
            busy_timeout_ms: self.busy_timeout_ms,
            settle_ms: self.settle_ms,
            ..epd4in2::Config::default()
        }
    }
}
