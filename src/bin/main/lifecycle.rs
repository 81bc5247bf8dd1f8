//! PID-file based service lifecycle.

use std::{
    fs::{self, OpenOptions},
    io,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{Context, Result, bail};
use log::{debug, warn};

pub const PID_FILE: &str = "/tmp/xkcdd.pid";
pub const LOG_FILE: &str = "/tmp/xkcdd.log";

/// Handle on the background service identified by its PID file.
#[derive(Clone, Debug)]
pub struct Daemon {
    pid_file: PathBuf,
    log_file: PathBuf,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("cannot resolve {}", path.display()))
}

fn process_alive(pid: libc::pid_t) -> bool {
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 only checks for existence and permissions.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

impl Daemon {
    pub fn new(pid_file: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            log_file: log_file.into(),
        }
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// PID of the running service. Stale or unreadable PID files count as not
    /// running.
    pub fn pid(&self) -> Result<Option<libc::pid_t>> {
        let raw = match fs::read_to_string(&self.pid_file) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read {}", self.pid_file.display())
                });
            }
        };
        let Ok(pid) = raw.trim().parse::<libc::pid_t>() else {
            debug!("lifecycle: ignoring malformed pid file");
            return Ok(None);
        };
        Ok(process_alive(pid).then_some(pid))
    }

    pub fn is_running(&self) -> Result<bool> {
        Ok(self.pid()?.is_some())
    }

    /// Delivers `signal` to the running service.
    pub fn send_signal(&self, signal: libc::c_int) -> Result<()> {
        let Some(pid) = self.pid()? else {
            bail!("xkcd service not running");
        };
        // SAFETY: plain syscall on a pid read from our own PID file.
        if unsafe { libc::kill(pid, signal) } != 0 {
            return Err(io::Error::last_os_error())
                .with_context(|| format!("failed to signal process {pid}"));
        }
        Ok(())
    }

    /// Starts `xkcd run` detached from the terminal's process group.
    ///
    /// The child keeps the caller's working directory, so a default font path
    /// resolves as it would for `xkcd start`. Its log output is appended to the
    /// log file.
    pub fn spawn(&self, dialogs_dir: &Path, config: Option<&Path>) -> Result<()> {
        let exe = std::env::current_exe().context("cannot locate the xkcd binary")?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("failed to open {}", self.log_file.display()))?;

        let mut command = Command::new(exe);
        if let Some(config) = config {
            command.arg("--config").arg(absolute(config)?);
        }
        command
            .arg("run")
            .arg(absolute(dialogs_dir)?)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .process_group(0);
        let child = command.spawn().context("failed to start xkcd service")?;
        debug!(
            "lifecycle: spawned service with pid {}, logging to {}",
            child.id(),
            self.log_file.display()
        );
        Ok(())
    }

    /// Writes the current PID, refusing when another instance is alive.
    pub fn claim(&self) -> Result<PidGuard> {
        if let Some(pid) = self.pid()? {
            bail!("xkcd service already running (pid {pid})");
        }
        fs::write(&self.pid_file, format!("{}\n", std::process::id()))
            .with_context(|| format!("failed to write {}", self.pid_file.display()))?;
        Ok(PidGuard {
            path: self.pid_file.clone(),
        })
    }
}

/// Removes the PID file when dropped.
#[derive(Debug)]
pub struct PidGuard {
    path: PathBuf,
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!("lifecycle: removing {} failed: {}", self.path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_malformed_pid_file_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = Daemon::new(dir.path().join("xkcdd.pid"), dir.path().join("xkcdd.log"));
        assert!(!daemon.is_running().unwrap());

        fs::write(daemon.pid_file(), "not a pid").unwrap();
        assert!(!daemon.is_running().unwrap());
    }

    #[test]
    fn stale_pid_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = Daemon::new(dir.path().join("xkcdd.pid"), dir.path().join("xkcdd.log"));
        fs::write(daemon.pid_file(), format!("{}", libc::pid_t::MAX)).unwrap();
        assert!(!daemon.is_running().unwrap());
        assert!(daemon.send_signal(libc::SIGHUP).is_err());
    }

    #[test]
    fn claim_writes_own_pid_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = Daemon::new(dir.path().join("xkcdd.pid"), dir.path().join("xkcdd.log"));

        let guard = daemon.claim().unwrap();
        assert_eq!(
            daemon.pid().unwrap(),
            Some(std::process::id() as libc::pid_t)
        );
        assert!(daemon.claim().is_err());

        drop(guard);
        assert!(!daemon.pid_file().exists());
    }

    #[test]
    fn relative_paths_are_resolved_against_the_working_directory() {
        let resolved = absolute(Path::new("dialogs")).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, std::env::current_dir().unwrap().join("dialogs"));
    }
}
