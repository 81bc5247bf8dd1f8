//! Linux glue for the xkcd display: spidev and GPIO character devices, a sysfs
//! PWM servo and a TrueType rasterizer.

pub mod config;
pub mod platform;
pub mod render;

use std::{io, path::PathBuf};

use thiserror::Error;

pub use config::{Backend, DeviceConfig};
pub use platform::{Panel, open_panel};
pub use render::FontRasterizer;

#[derive(Debug, Error)]
pub enum HalError {
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("{context}: {message}")]
    Bus {
        context: &'static str,
        message: String,
    },
    #[error("display driver: {0}")]
    Driver(String),
    #[error("font {}: {message}", .path.display())]
    Font { path: PathBuf, message: String },
}

impl HalError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn bus(context: &'static str, err: impl core::fmt::Display) -> Self {
        Self::Bus {
            context,
            message: err.to_string(),
        }
    }
}
