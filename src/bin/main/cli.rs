//! Command line entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use xkcd_core::playlist::DialogDir;

use crate::{
    daemon,
    lifecycle::{Daemon, LOG_FILE, PID_FILE},
    preview,
    settings::AppConfig,
};

#[derive(Parser)]
#[command(name = "xkcd")]
#[command(version)]
#[command(about = "Control the dedicated xkcd display")]
struct Cli {
    /// Configuration file [default: /etc/xkcd-display.toml when present]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the xkcd display service
    Start {
        /// Directory holding the dialog text files
        dialogs_dir: PathBuf,
    },
    /// Quit the xkcd display service
    #[command(alias = "quit")]
    Stop,
    /// Is the xkcd display service running?
    Status,
    /// Gracefully reload the dialogs after the current one
    Reload,
    /// Show the dialogs on the display
    Play,
    /// Pause the dialogs on the display
    Pause,
    /// Render one dialog to panel images in a directory
    ///
    /// Without an output directory the images go to a temporary directory and
    /// are always shown.
    #[command(alias = "test")]
    Render {
        /// Dialog text file
        dialog_file: PathBuf,
        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        outdir: Option<PathBuf>,
        /// Open the generated images
        #[arg(long)]
        show: bool,
    },
    /// Run the service in the foreground
    #[command(hide = true)]
    Run { dialogs_dir: PathBuf },
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Sends `signal` to a running service, printing `message` first.
fn notify(daemon: &Daemon, signal: libc::c_int, message: &str) -> Result<()> {
    if !daemon.is_running()? {
        println!("xkcd service not running");
        return Ok(());
    }
    println!("{message}");
    daemon.send_signal(signal)?;
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_level);

    let service = Daemon::new(PID_FILE, LOG_FILE);
    match cli.command {
        Commands::Start { dialogs_dir } => {
            DialogDir::open(&dialogs_dir).context("cannot start xkcd service")?;
            if service.is_running()? {
                println!("xkcd service already running");
                return Ok(());
            }
            println!("starting xkcd service");
            service.spawn(&dialogs_dir, cli.config.as_deref())
        }
        Commands::Stop => notify(&service, libc::SIGTERM, "stopping xkcd service"),
        Commands::Status => {
            if service.is_running()? {
                println!("xkcd service is running.");
            } else {
                println!("xkcd service is stopped.");
            }
            Ok(())
        }
        Commands::Reload => notify(&service, libc::SIGHUP, "gracefully reloading changes"),
        Commands::Play => notify(&service, libc::SIGUSR1, "showing the dialogs"),
        Commands::Pause => notify(&service, libc::SIGUSR2, "pausing the dialogs"),
        Commands::Render {
            dialog_file,
            outdir,
            show,
        } => preview::render_dialog(&dialog_file, outdir.as_deref(), show, config.render),
        Commands::Run { dialogs_dir } => daemon::run(&service, &dialogs_dir, config),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn aliases_map_to_commands() {
        let quit = Cli::try_parse_from(["xkcd", "quit"]).unwrap();
        assert!(matches!(quit.command, Commands::Stop));

        let test = Cli::try_parse_from(["xkcd", "test", "d.txt", "-o", "out"]).unwrap();
        assert!(matches!(
            test.command,
            Commands::Render { outdir: Some(_), show: false, .. }
        ));
    }

    #[test]
    fn start_requires_dialogs_dir() {
        assert!(Cli::try_parse_from(["xkcd", "start"]).is_err());
    }
}
