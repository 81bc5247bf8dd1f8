//! Panel rendering: fitted text drawn onto a bilevel canvas.

use std::path::PathBuf;

use epd4in2::{BLACK, FrameBuffer, PackError, WHITE, protocol};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    fit::{BoxSize, FitError, TextFit, TextMetrics, fit_text},
    settings::SettingsError,
};

/// 8-bit grayscale image that only ever holds [`WHITE`] or [`BLACK`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    threshold: u8,
    pixels: Vec<u8>,
}

impl Canvas {
    /// White canvas. Glyph coverage at or above `threshold` paints black.
    pub fn new(width: u32, height: u32, threshold: u8) -> Self {
        Self {
            width,
            height,
            threshold,
            pixels: vec![WHITE; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixel intensities.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Applies glyph coverage at `(x, y)`. Out-of-bounds positions are ignored.
    pub fn cover(&mut self, x: i32, y: i32, coverage: u8) {
        if coverage < self.threshold || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index] = BLACK;
    }

    pub fn is_black(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.pixels[y as usize * self.width as usize + x as usize] == BLACK
    }

    /// Packs the canvas into a panel frame.
    pub fn to_frame(&self) -> Result<FrameBuffer, PackError> {
        FrameBuffer::pack(self.pixels.iter().copied())
    }
}

/// Text rendering engine.
pub trait Rasterizer: TextMetrics {
    /// Draws `lines` left-aligned starting at `x`, with the first baseline at
    /// `baseline_y`. Line advance matches what [`TextMetrics::measure`] reports.
    fn draw(&self, canvas: &mut Canvas, lines: &[String], font_size: u32, x: i32, baseline_y: i32);
}

/// `[render]` configuration section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub font_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub font_size_hint: u32,
    pub black_threshold: u8,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("xkcd-script.ttf"),
            width: protocol::WIDTH as u32,
            height: protocol::HEIGHT as u32,
            padding: 5,
            font_size_hint: 12,
            black_threshold: 128,
        }
    }
}

impl RenderSettings {
    /// Area available to text once padding is removed.
    pub fn text_box(&self) -> BoxSize {
        BoxSize::new(
            self.width.saturating_sub(self.padding.saturating_mul(2)),
            self.height.saturating_sub(self.padding.saturating_mul(2)),
        )
    }

    /// Rejects settings that would fail on every panel.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let (panel_width, panel_height) = (protocol::WIDTH as u32, protocol::HEIGHT as u32);
        if (self.width, self.height) != (panel_width, panel_height) {
            return Err(SettingsError::CanvasSize {
                width: self.width,
                height: self.height,
                panel_width,
                panel_height,
            });
        }
        if self.text_box().is_degenerate() {
            return Err(SettingsError::Padding {
                padding: self.padding,
            });
        }
        if self.font_size_hint == 0 {
            return Err(SettingsError::ZeroFontHint);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error("canvas does not match the panel")]
    Frame(#[from] PackError),
}

/// A rendered panel and where its text was placed.
#[derive(Clone, Debug)]
pub struct RenderedPanel {
    pub canvas: Canvas,
    pub fit: TextFit,
    pub x: i32,
    pub baseline_y: i32,
}

/// Renders one text per panel image.
pub struct PanelRenderer<R> {
    rasterizer: R,
    settings: RenderSettings,
}

impl<R: Rasterizer> PanelRenderer<R> {
    pub fn new(rasterizer: R, settings: RenderSettings) -> Self {
        Self {
            rasterizer,
            settings,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Fits `text` into the padded box and draws it centred.
    pub fn render(&self, text: &str) -> Result<RenderedPanel, FitError> {
        let settings = &self.settings;
        let bounds = settings.text_box();
        let fit = fit_text(&self.rasterizer, text, bounds, settings.font_size_hint)?;

        let x = settings.padding + (bounds.width - fit.width) / 2;
        let top = settings.padding + (bounds.height - fit.height) / 2;
        let x = x as i32;
        let baseline_y = (top + fit.character_height) as i32;

        let mut canvas = Canvas::new(settings.width, settings.height, settings.black_threshold);
        self.rasterizer
            .draw(&mut canvas, &fit.lines, fit.font_size, x, baseline_y);

        Ok(RenderedPanel {
            canvas,
            fit,
            x,
            baseline_y,
        })
    }

    /// Renders `text` straight into a panel frame.
    pub fn render_frame(&self, text: &str) -> Result<FrameBuffer, RenderError> {
        let panel = self.render(text)?;
        Ok(panel.canvas.to_frame()?)
    }
}
