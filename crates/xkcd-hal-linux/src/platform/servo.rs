use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use embedded_hal::pwm::{self, ErrorKind, SetDutyCycle};
use log::{debug, warn};

use crate::HalError;

pub const SYSFS_PWM_ROOT: &str = "/sys/class/pwm";

/// Resolution of [`SysfsPwm`] duty cycles: 0.01 %.
pub const MAX_DUTY: u16 = 10_000;

const EXPORT_ATTEMPTS: u32 = 20;
const EXPORT_RETRY: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct PwmError(io::Error);

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pwm: {}", self.0)
    }
}

impl std::error::Error for PwmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl pwm::Error for PwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Servo signal on a sysfs PWM channel.
#[derive(Debug)]
pub struct SysfsPwm {
    channel_dir: PathBuf,
    period_ns: u64,
}

fn write_attr(dir: &Path, name: &str, value: impl fmt::Display) -> io::Result<()> {
    fs::write(dir.join(name), value.to_string())
}

impl SysfsPwm {
    pub fn open(chip: u32, channel: u32, frequency_hz: u32) -> Result<Self, HalError> {
        Self::open_at(Path::new(SYSFS_PWM_ROOT), chip, channel, frequency_hz)
    }

    /// Exports (if needed), configures and enables `pwmchip{chip}/pwm{channel}`
    /// below `root` with the output held low.
    pub fn open_at(
        root: &Path,
        chip: u32,
        channel: u32,
        frequency_hz: u32,
    ) -> Result<Self, HalError> {
        let chip_dir = root.join(format!("pwmchip{chip}"));
        let channel_dir = chip_dir.join(format!("pwm{channel}"));

        if !channel_dir.is_dir() {
            write_attr(&chip_dir, "export", channel)
                .map_err(|e| HalError::io(format!("exporting {}", channel_dir.display()), e))?;
        }
        // udev adjusts permissions of freshly exported channels asynchronously.
        let mut attempts = 0;
        while !channel_dir.join("period").exists() {
            attempts += 1;
            if attempts >= EXPORT_ATTEMPTS {
                return Err(HalError::io(
                    format!("waiting for {}", channel_dir.display()),
                    io::Error::from(io::ErrorKind::NotFound),
                ));
            }
            thread::sleep(EXPORT_RETRY);
        }

        let period_ns = 1_000_000_000 / u64::from(frequency_hz.max(1));
        let configure = || -> io::Result<()> {
            write_attr(&channel_dir, "duty_cycle", 0)?;
            write_attr(&channel_dir, "period", period_ns)?;
            write_attr(&channel_dir, "enable", 1)
        };
        configure().map_err(|e| HalError::io(format!("configuring {}", channel_dir.display()), e))?;

        debug!("servo: {} at {}Hz", channel_dir.display(), frequency_hz);
        Ok(Self {
            channel_dir,
            period_ns,
        })
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }
}

impl pwm::ErrorType for SysfsPwm {
    type Error = PwmError;
}

impl SetDutyCycle for SysfsPwm {
    fn max_duty_cycle(&self) -> u16 {
        MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = u64::from(duty.min(MAX_DUTY));
        let duty_ns = self.period_ns * duty / u64::from(MAX_DUTY);
        write_attr(&self.channel_dir, "duty_cycle", duty_ns).map_err(PwmError)
    }
}

impl Drop for SysfsPwm {
    fn drop(&mut self) {
        if let Err(err) = write_attr(&self.channel_dir, "enable", 0) {
            warn!("servo: disabling {} failed: {}", self.channel_dir.display(), err);
        }
    }
}
