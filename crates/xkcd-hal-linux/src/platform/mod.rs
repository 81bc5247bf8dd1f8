//! Device backends.

mod epd;
pub mod servo;
pub mod spi;

pub use epd::EpdPanel;

use epd4in2::{FrameBuffer, RefreshMode};
use xkcd_core::device::{LoggingDevice, PanelDevice};

use crate::{Backend, DeviceConfig, HalError};

/// Backend selected by configuration.
pub enum Panel {
    Epd(EpdPanel),
    Dummy(LoggingDevice),
}

/// Opens the configured backend.
pub fn open_panel(config: &DeviceConfig) -> Result<Panel, HalError> {
    match config.backend {
        Backend::Epd => EpdPanel::open(config).map(Panel::Epd),
        Backend::Dummy => Ok(Panel::Dummy(LoggingDevice::new())),
    }
}

macro_rules! dispatch {
    ($self:ident, $device:ident => $call:expr) => {
        match $self {
            Panel::Epd($device) => $call,
            Panel::Dummy($device) => $call.map_err(|never| match never {}),
        }
    };
}

impl PanelDevice for Panel {
    type Error = HalError;

    fn init(&mut self) -> Result<(), Self::Error> {
        dispatch!(self, device => device.init())
    }

    fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        dispatch!(self, device => device.set_refresh_mode(mode))
    }

    fn transmit_frame(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error> {
        dispatch!(self, device => device.transmit_frame(frame))
    }

    fn move_pointer(&mut self, target: u8) -> Result<(), Self::Error> {
        dispatch!(self, device => device.move_pointer(target))
    }

    fn wait_idle(&mut self) -> Result<(), Self::Error> {
        dispatch!(self, device => device.wait_idle())
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        dispatch!(self, device => device.sleep())
    }
}
