use core::convert::Infallible;

use epd4in2::{FrameBuffer, RefreshMode};
use log::info;

use super::PanelDevice;

/// No-hardware device used during development; logs every call.
#[derive(Debug, Default)]
pub struct LoggingDevice {
    refresh: Option<RefreshMode>,
    pointer: Option<u8>,
    frames: usize,
}

impl LoggingDevice {
    pub const fn new() -> Self {
        Self {
            refresh: None,
            pointer: None,
            frames: 0,
        }
    }

    pub fn frames_shown(&self) -> usize {
        self.frames
    }

    pub fn pointer(&self) -> Option<u8> {
        self.pointer
    }
}

impl PanelDevice for LoggingDevice {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        info!("dummy display: init");
        self.refresh = Some(RefreshMode::Slow);
        Ok(())
    }

    fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        if self.refresh != Some(mode) {
            info!("dummy display: {} refresh", mode.as_str());
            self.refresh = Some(mode);
        }
        Ok(())
    }

    fn transmit_frame(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error> {
        self.frames += 1;
        info!("dummy display: frame {} {:?}", self.frames, frame);
        Ok(())
    }

    fn move_pointer(&mut self, target: u8) -> Result<(), Self::Error> {
        info!("dummy display: pointer to {}", target);
        self.pointer = Some(target);
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        info!("dummy display: going to sleep");
        Ok(())
    }
}
