//! In-memory framebuffer and pixel packing for the 4.2" panel.

use crate::protocol::{BUFFER_SIZE, HEIGHT, LINE_BYTES, WIDTH};

/// Pixel intensity treated as black when packing. Every other value is white.
pub const BLACK: u8 = 0;
/// Pixel intensity used for white pixels.
pub const WHITE: u8 = 0xFF;

/// Packing failures.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PackError {
    /// The intensity stream did not produce exactly [`BUFFER_SIZE`] bytes.
    Length { expected: usize, actual: usize },
}

impl core::fmt::Display for PackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Length { expected, actual } => {
                write!(f, "packed {actual} bytes, panel needs {expected}")
            }
        }
    }
}

impl core::error::Error for PackError {}

/// 1bpp framebuffer for the panel.
///
/// Bit mapping within one byte: bit 7 is the leftmost pixel, a set bit is white.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: [u8; BUFFER_SIZE],
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let black = self.bytes.iter().map(|b| b.count_zeros()).sum::<u32>();
        f.debug_struct("FrameBuffer")
            .field("black_pixels", &black)
            .finish()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Creates a new all-white framebuffer.
    pub const fn new() -> Self {
        Self {
            bytes: [WHITE; BUFFER_SIZE],
        }
    }

    /// Packs a row-major stream of pixel intensities.
    ///
    /// Pixels are consumed in groups of eight. Each group starts as `0xFF` and the
    /// bit at `7 - index` is cleared for every pixel equal to [`BLACK`]. A trailing
    /// short group keeps its missing pixels white. The packed stream must be exactly
    /// [`BUFFER_SIZE`] bytes long.
    pub fn pack<I>(pixels: I) -> Result<Self, PackError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut frame = Self::new();
        let mut produced = 0usize;
        let mut byte = WHITE;
        let mut group_pos = 0usize;

        for pixel in pixels {
            if pixel == BLACK {
                byte &= !(0x80 >> group_pos);
            }
            group_pos += 1;

            if group_pos == 8 {
                if produced < BUFFER_SIZE {
                    frame.bytes[produced] = byte;
                }
                produced += 1;
                byte = WHITE;
                group_pos = 0;
            }
        }

        if group_pos != 0 {
            if produced < BUFFER_SIZE {
                frame.bytes[produced] = byte;
            }
            produced += 1;
        }

        if produced != BUFFER_SIZE {
            return Err(PackError::Length {
                expected: BUFFER_SIZE,
                actual: produced,
            });
        }

        Ok(frame)
    }

    /// Returns the underlying framebuffer bytes.
    pub fn bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.bytes
    }

    /// Sets a pixel state.
    ///
    /// Returns `true` when pixel is in bounds, `false` otherwise.
    pub fn set_pixel(&mut self, x: usize, y: usize, black: bool) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }

        let byte_index = y * LINE_BYTES + (x / 8);
        let bit_mask = 1u8 << (7 - (x % 8));

        if black {
            self.bytes[byte_index] &= !bit_mask;
        } else {
            self.bytes[byte_index] |= bit_mask;
        }

        true
    }

    /// Reads a pixel state, `Some(true)` for black.
    pub fn is_black(&self, x: usize, y: usize) -> Option<bool> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }

        let byte_index = y * LINE_BYTES + (x / 8);
        let bit_mask = 1u8 << (7 - (x % 8));
        Some((self.bytes[byte_index] & bit_mask) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXELS: usize = WIDTH * HEIGHT;

    #[test]
    fn black_group_packs_to_zero_and_white_group_to_ff() {
        let mut pixels = vec![WHITE; PIXELS];
        pixels[..8].fill(BLACK);

        let frame = FrameBuffer::pack(pixels).unwrap();
        assert_eq!(frame.bytes()[0], 0x00);
        assert_eq!(frame.bytes()[1], 0xFF);
    }

    #[test]
    fn only_the_black_sentinel_clears_bits() {
        let mut pixels = vec![WHITE; PIXELS];
        pixels[0] = BLACK;
        pixels[3] = 1;
        pixels[7] = BLACK;

        let frame = FrameBuffer::pack(pixels).unwrap();
        assert_eq!(frame.bytes()[0], 0b0111_1110);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        let err = FrameBuffer::pack(vec![WHITE; PIXELS - 8]).unwrap_err();
        assert_eq!(
            err,
            PackError::Length {
                expected: BUFFER_SIZE,
                actual: BUFFER_SIZE - 1
            }
        );

        let err = FrameBuffer::pack(vec![WHITE; PIXELS + 3]).unwrap_err();
        assert_eq!(
            err,
            PackError::Length {
                expected: BUFFER_SIZE,
                actual: BUFFER_SIZE + 1
            }
        );
    }

    #[test]
    fn pixel_bit_mapping_is_msb_first_within_byte() {
        let mut fb = FrameBuffer::new();

        assert!(fb.set_pixel(0, 0, true));
        assert!(fb.set_pixel(7, 0, true));
        assert!(fb.set_pixel(8, 0, true));

        assert_eq!(fb.bytes()[0], 0b0111_1110);
        assert_eq!(fb.bytes()[1], 0b0111_1111);
        assert_eq!(fb.is_black(7, 0), Some(true));
        assert_eq!(fb.is_black(6, 0), Some(false));
    }

    #[test]
    fn out_of_bounds_pixel_is_ignored() {
        let mut fb = FrameBuffer::new();

        assert!(!fb.set_pixel(WIDTH, 0, true));
        assert!(!fb.set_pixel(0, HEIGHT, true));
        assert_eq!(fb.is_black(WIDTH, HEIGHT), None);
        assert!(fb.bytes().iter().all(|b| *b == WHITE));
    }
}
