//! `xkcd`: controls the xkcd e-paper dialog display.

use std::process::ExitCode;

#[path = "main/cli.rs"]
mod cli;
#[path = "main/daemon.rs"]
mod daemon;
#[path = "main/lifecycle.rs"]
mod lifecycle;
#[path = "main/preview.rs"]
mod preview;
#[path = "main/settings.rs"]
mod settings;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
