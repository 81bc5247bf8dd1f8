use std::{fs, path::Path};

use fontdue::{Font, FontSettings};
use xkcd_core::{
    fit::{FontMetrics, TextMetrics},
    layout::{Canvas, Rasterizer},
};

use crate::HalError;

/// Vertical metrics of one font size.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LineBox {
    ascent: f32,
    advance: f32,
}

/// TrueType rasterizer backed by `fontdue`.
pub struct FontRasterizer {
    font: Font,
}

impl FontRasterizer {
    pub fn load(path: &Path) -> Result<Self, HalError> {
        let bytes = fs::read(path)
            .map_err(|e| HalError::io(format!("reading font {}", path.display()), e))?;
        Self::from_bytes(path, bytes)
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Self, HalError> {
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|message| {
            HalError::Font {
                path: path.to_path_buf(),
                message: message.to_string(),
            }
        })?;
        Ok(Self { font })
    }

    fn line_box(&self, px: f32) -> LineBox {
        match self.font.horizontal_line_metrics(px) {
            Some(metrics) => LineBox {
                ascent: metrics.ascent,
                advance: metrics.new_line_size,
            },
            None => LineBox {
                ascent: px,
                advance: px * 1.2,
            },
        }
    }

    fn line_width(&self, line: &str, px: f32) -> f32 {
        let mut width = 0.0;
        let mut previous = None;
        for glyph in line.chars() {
            if let Some(left) = previous {
                width += self.font.horizontal_kern(left, glyph, px).unwrap_or(0.0);
            }
            width += self.font.metrics(glyph, px).advance_width;
            previous = Some(glyph);
        }
        width
    }
}

impl TextMetrics for FontRasterizer {
    fn measure(&self, text: &str, font_size: u32) -> FontMetrics {
        let px = font_size as f32;
        let line_box = self.line_box(px);
        let widest = text
            .lines()
            .map(|line| self.line_width(line, px))
            .fold(0.0f32, f32::max);
        let lines = text.lines().count().max(1) as f32;

        FontMetrics {
            width: widest.ceil() as u32,
            height: (line_box.advance * lines).ceil() as u32,
            character_height: line_box.ascent.ceil() as u32,
        }
    }
}

impl Rasterizer for FontRasterizer {
    fn draw(&self, canvas: &mut Canvas, lines: &[String], font_size: u32, x: i32, baseline_y: i32) {
        let px = font_size as f32;
        let line_box = self.line_box(px);

        for (row, line) in lines.iter().enumerate() {
            let baseline = baseline_y + (row as f32 * line_box.advance).round() as i32;
            let mut pen = x as f32;
            let mut previous = None;
            for glyph in line.chars() {
                if let Some(left) = previous {
                    pen += self.font.horizontal_kern(left, glyph, px).unwrap_or(0.0);
                }
                previous = Some(glyph);

                let (metrics, coverage) = self.font.rasterize(glyph, px);
                let left = (pen + metrics.xmin as f32).round() as i32;
                let top = baseline - (metrics.ymin + metrics.height as i32);
                for (index, value) in coverage.iter().enumerate() {
                    let gx = (index % metrics.width.max(1)) as i32;
                    let gy = (index / metrics.width.max(1)) as i32;
                    canvas.cover(left + gx, top + gy, *value);
                }
                pen += metrics.advance_width;
            }
        }
    }
}
