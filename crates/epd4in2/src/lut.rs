//! Waveform lookup tables and the refresh-mode controller.

use log::debug;

use crate::{
    interface::CommandSink,
    protocol::{B2B_LUT, B2W_LUT, VCOM_LUT, W2B_LUT, W2W_LUT},
};

/// Waveform family used for the next refresh.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefreshMode {
    /// Full flashing refresh, minimal ghosting.
    Slow,
    /// Short partial waveform, faster but leaves ghosting.
    Quick,
}

impl RefreshMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Quick => "quick",
        }
    }
}

const LUT_VCOM0: [u8; 44] = [
    0x40, 0x17, 0x00, 0x00, 0x00, 0x02, 0x00, 0x17, 0x17, 0x00, 0x00, 0x02, 0x00, 0x0A, 0x01,
    0x00, 0x00, 0x01, 0x00, 0x0E, 0x0E, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_VCOM0_QUICK: [u8; 44] = [
    0x00, 0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_WW: [u8; 42] = [
    0x40, 0x17, 0x00, 0x00, 0x00, 0x02, 0x90, 0x17, 0x17, 0x00, 0x00, 0x02, 0x40, 0x0A, 0x01,
    0x00, 0x00, 0x01, 0xA0, 0x0E, 0x0E, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_WW_QUICK: [u8; 42] = [
    0xA0, 0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_BW: [u8; 42] = LUT_WW;

const LUT_BW_QUICK: [u8; 42] = [
    0xA0, 0x0E, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_BB: [u8; 42] = [
    0x80, 0x17, 0x00, 0x00, 0x00, 0x02, 0x90, 0x17, 0x17, 0x00, 0x00, 0x02, 0x80, 0x0A, 0x01,
    0x00, 0x00, 0x01, 0x50, 0x0E, 0x0E, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_BB_QUICK: [u8; 42] = [
    0x50, 0x0E, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const LUT_WB: [u8; 42] = LUT_BB;

const LUT_WB_QUICK: [u8; 42] = LUT_BB_QUICK;

/// `(command, table)` pairs uploaded for one refresh mode, VCOM first.
pub type LutChain = [(u8, &'static [u8]); 5];

const LUT_SLOW: LutChain = [
    (VCOM_LUT, &LUT_VCOM0),
    (W2W_LUT, &LUT_WW),
    (B2W_LUT, &LUT_BW),
    (W2B_LUT, &LUT_WB),
    (B2B_LUT, &LUT_BB),
];

const LUT_QUICK: LutChain = [
    (VCOM_LUT, &LUT_VCOM0_QUICK),
    (W2W_LUT, &LUT_WW_QUICK),
    (B2W_LUT, &LUT_BW_QUICK),
    (W2B_LUT, &LUT_WB_QUICK),
    (B2B_LUT, &LUT_BB_QUICK),
];

/// Returns the LUT upload sequence for a refresh mode.
pub fn lut_chain(mode: RefreshMode) -> &'static LutChain {
    match mode {
        RefreshMode::Slow => &LUT_SLOW,
        RefreshMode::Quick => &LUT_QUICK,
    }
}

/// Tracks which LUT family is loaded in the controller.
///
/// Uploading a LUT family is slow, so [`RefreshController::set`] only talks to
/// the panel when the requested mode differs from the loaded one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RefreshController {
    state: Option<RefreshMode>,
}

impl RefreshController {
    pub const fn new() -> Self {
        Self { state: None }
    }

    /// Currently loaded mode, `None` until the first upload.
    pub fn state(&self) -> Option<RefreshMode> {
        self.state
    }

    /// Loads the slow LUTs unconditionally. Used during panel initialization.
    pub fn slow<B: CommandSink>(&mut self, bus: &mut B) -> Result<(), B::Error> {
        self.force(bus, RefreshMode::Slow)
    }

    /// Switches to `mode`. Returns `Ok(true)` when tables were transmitted.
    pub fn set<B: CommandSink>(&mut self, bus: &mut B, mode: RefreshMode) -> Result<bool, B::Error> {
        if self.state == Some(mode) {
            return Ok(false);
        }

        self.force(bus, mode)?;
        Ok(true)
    }

    /// Transmits the tables for `mode` regardless of the recorded state.
    pub fn force<B: CommandSink>(&mut self, bus: &mut B, mode: RefreshMode) -> Result<(), B::Error> {
        debug!("epd: loading {} refresh tables", mode.as_str());
        // A failed upload leaves an unknown mix of tables loaded.
        self.state = None;
        for (command, table) in lut_chain(mode) {
            bus.command(*command)?;
            bus.data(table)?;
        }
        self.state = Some(mode);
        Ok(())
    }
}
