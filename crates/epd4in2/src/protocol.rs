//! Wire-level protocol constants for the 4.2" 400x300 e-paper panel.

/// Panel width in pixels.
pub const WIDTH: usize = 400;
/// Panel height in pixels.
pub const HEIGHT: usize = 300;
/// Number of bytes in one display line.
pub const LINE_BYTES: usize = WIDTH / 8;
/// Total framebuffer size in bytes.
pub const BUFFER_SIZE: usize = LINE_BYTES * HEIGHT;

/// Conservative single-transaction limit when the platform does not report one.
pub const DEFAULT_MAX_TRANSFER: usize = 512;

pub const PANEL_SETTING: u8 = 0x00;
pub const POWER_SETTING: u8 = 0x01;
pub const POWER_OFF: u8 = 0x02;
pub const POWER_OFF_SEQUENCE_SETTING: u8 = 0x03;
pub const POWER_ON: u8 = 0x04;
pub const POWER_ON_MEASURE: u8 = 0x05;
pub const BOOSTER_SOFT_START: u8 = 0x06;
pub const DEEP_SLEEP: u8 = 0x07;
/// Previous-image slot used as the reference for differential waveforms.
pub const DATA_START_TRANSMISSION_1: u8 = 0x10;
pub const DATA_STOP: u8 = 0x11;
pub const DISPLAY_REFRESH: u8 = 0x12;
/// New-image slot.
pub const DATA_START_TRANSMISSION_2: u8 = 0x13;
pub const VCOM_LUT: u8 = 0x20;
pub const W2W_LUT: u8 = 0x21;
pub const B2W_LUT: u8 = 0x22;
pub const W2B_LUT: u8 = 0x23;
pub const B2B_LUT: u8 = 0x24;
pub const PLL_CONTROL: u8 = 0x30;
pub const VCOM_AND_DATA_INTERVAL_SETTING: u8 = 0x50;
pub const RESOLUTION_SETTING: u8 = 0x61;
pub const GET_STATUS: u8 = 0x71;
pub const PARTIAL_WINDOW: u8 = 0x90;
pub const PARTIAL_IN: u8 = 0x91;
pub const PARTIAL_OUT: u8 = 0x92;

/// Booster soft-start phases sent after [`BOOSTER_SOFT_START`].
pub const BOOSTER_SOFT_START_DATA: [u8; 3] = [0x17, 0x17, 0x17];
/// 300x400 black/white mode with LUTs taken from registers.
pub const PANEL_SETTING_DATA: u8 = 0x3F;
/// Check code required by [`DEEP_SLEEP`].
pub const DEEP_SLEEP_CHECK: u8 = 0xA5;

/// Splits a data burst into transfers no longer than `max_transfer` bytes.
///
/// A zero limit falls back to [`DEFAULT_MAX_TRANSFER`].
#[inline]
pub fn transfer_chunks(data: &[u8], max_transfer: usize) -> core::slice::Chunks<'_, u8> {
    let size = if max_transfer == 0 {
        DEFAULT_MAX_TRANSFER
    } else {
        max_transfer
    };
    data.chunks(size)
}
