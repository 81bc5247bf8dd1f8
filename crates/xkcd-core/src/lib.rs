//! Dialog playback for the xkcd e-paper display.
//!
//! Hardware, fonts, the filesystem and OS signals are reached through the
//! capability traits in [`device`], [`layout`], [`playlist`] and [`signals`], so
//! the whole loop runs against fakes in tests.

pub mod device;
pub mod dialog;
pub mod fit;
pub mod layout;
pub mod narrator;
pub mod playback;
pub mod playlist;
pub mod settings;
pub mod signals;

pub use epd4in2::{FrameBuffer, RefreshMode};
