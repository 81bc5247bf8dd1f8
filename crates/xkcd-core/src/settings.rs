//! Startup validation of the `[playback]` and `[render]` sections.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("render canvas is {width}x{height}, the panel is {panel_width}x{panel_height}")]
    CanvasSize {
        width: u32,
        height: u32,
        panel_width: u32,
        panel_height: u32,
    },
    #[error("padding {padding} leaves no room for text")]
    Padding { padding: u32 },
    #[error("font_size_hint must be at least 1")]
    ZeroFontHint,
    #[error("pointer.{target} = {duty} is above 100% servo duty")]
    PointerDuty { target: &'static str, duty: u8 },
}
