//! Text rendering backends.

mod font;

pub use font::FontRasterizer;
