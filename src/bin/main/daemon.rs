//! Foreground service: wires the Linux backends into the playback loop.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use xkcd_core::{
    layout::PanelRenderer,
    playback::{PlaybackParts, PlaybackService, ThreadPacer},
    playlist::DialogDir,
    signals::{AtomicSignalFlags, Signal},
};
use xkcd_hal_linux::{FontRasterizer, open_panel};

use crate::{lifecycle::Daemon, settings::AppConfig};

const SIGNAL_MAP: [(libc::c_int, Signal); 5] = [
    (SIGTERM, Signal::Terminate),
    (SIGINT, Signal::Terminate),
    (SIGHUP, Signal::Reload),
    (SIGUSR1, Signal::Resume),
    (SIGUSR2, Signal::Pause),
];

fn register_signals(flags: &AtomicSignalFlags) -> Result<()> {
    for (signal, kind) in SIGNAL_MAP {
        signal_hook::flag::register(signal, flags.flag(kind))
            .with_context(|| format!("failed to register handler for signal {signal}"))?;
    }
    Ok(())
}

pub fn run(service: &Daemon, dialogs_dir: &Path, config: AppConfig) -> Result<()> {
    let store = DialogDir::open(dialogs_dir).context("invalid dialogs directory")?;
    let _pid = service.claim()?;

    let flags = AtomicSignalFlags::new();
    register_signals(&flags)?;

    let rasterizer = FontRasterizer::load(&config.render.font_path)?;
    let device = open_panel(&config.device).context("failed to open display")?;
    info!(
        "xkcd service started with {:?} backend, pid {}, dialogs in {}",
        config.device.backend,
        std::process::id(),
        store.root().display()
    );

    let parts = PlaybackParts {
        store,
        device,
        renderer: PanelRenderer::new(rasterizer, config.render),
        signals: flags,
        pacer: ThreadPacer,
        rng: rand::thread_rng(),
    };
    let mut playback = PlaybackService::new(parts, config.playback);
    let result = playback.run().context("playback stopped");
    info!("xkcd service stopped");
    result
}
