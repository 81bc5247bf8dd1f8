//! Display device capability.

mod dummy;

pub use dummy::LoggingDevice;

use epd4in2::{FrameBuffer, RefreshMode};

/// E-paper panel with a speaker pointer.
///
/// Implementations own the bus exclusively; every call completes before the
/// next one starts.
pub trait PanelDevice {
    type Error: std::error::Error + Send + Sync + 'static;

    fn init(&mut self) -> Result<(), Self::Error>;
    fn set_refresh_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error>;
    /// Sends the frame and starts the refresh without waiting for it.
    fn transmit_frame(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error>;
    /// Moves the pointer to `target` percent servo duty.
    fn move_pointer(&mut self, target: u8) -> Result<(), Self::Error>;
    fn wait_idle(&mut self) -> Result<(), Self::Error>;
    fn sleep(&mut self) -> Result<(), Self::Error>;

    /// Shows `frame` and points at the speaker while the panel refreshes.
    fn show_and_move(
        &mut self,
        frame: &FrameBuffer,
        mode: RefreshMode,
        pointer: u8,
    ) -> Result<(), Self::Error> {
        self.set_refresh_mode(mode)?;
        self.transmit_frame(frame)?;
        self.move_pointer(pointer)?;
        self.wait_idle()
    }
}
