//! Playback state machine: picks dialogs, shows their panels and reacts to
//! signals at fixed checkpoints.

use std::time::Duration;

use epd4in2::{FrameBuffer, RefreshMode};
use log::{info, warn};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    device::PanelDevice,
    dialog::{Dialog, DialogError, SpokenLine},
    layout::{PanelRenderer, Rasterizer, RenderError},
    narrator::{Narrator, normalize},
    playlist::{DialogEntry, DialogStore, Playlist},
    settings::SettingsError,
    signals::{Signal, SignalFlags},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Running,
    Paused,
    Terminating,
}

/// What to do when a single dialog cannot be shown.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and pick another dialog.
    #[default]
    Skip,
    /// Stop the daemon.
    Abort,
}

/// Servo duty percent per speaker.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PointerTargets {
    pub cueball: u8,
    pub megan: u8,
    pub center: u8,
}

impl Default for PointerTargets {
    fn default() -> Self {
        Self {
            cueball: 5,
            megan: 9,
            center: 7,
        }
    }
}

impl PointerTargets {
    /// Unknown speakers get the center position.
    pub fn for_speaker(&self, speaker: &str) -> u8 {
        if speaker.eq_ignore_ascii_case(Narrator::Cueball.as_str()) {
            self.cueball
        } else if speaker.eq_ignore_ascii_case(Narrator::Megan.as_str()) {
            self.megan
        } else {
            self.center
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (target, duty) in [
            ("cueball", self.cueball),
            ("megan", self.megan),
            ("center", self.center),
        ] {
            if duty > 100 {
                return Err(SettingsError::PointerDuty { target, duty });
            }
        }
        Ok(())
    }
}

/// `[playback]` configuration section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackSettings {
    pub panel_base_delay_secs: f64,
    pub panel_per_space_delay_secs: f64,
    pub transition_dwell_secs: f64,
    pub pause_poll_secs: f64,
    pub start_paused: bool,
    pub on_dialog_error: FailurePolicy,
    pub goodbye_text: String,
    pub pointer: PointerTargets,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            panel_base_delay_secs: 5.0,
            panel_per_space_delay_secs: 0.5,
            transition_dwell_secs: 5.0,
            pause_poll_secs: 1.0,
            start_paused: false,
            on_dialog_error: FailurePolicy::Skip,
            goodbye_text: "Be excellent to each other".to_string(),
            pointer: PointerTargets::default(),
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl PlaybackSettings {
    /// Reading time for one panel: base delay plus a share per space.
    pub fn panel_delay(&self, line: &SpokenLine) -> Duration {
        secs(self.panel_base_delay_secs + self.panel_per_space_delay_secs * line.space_count() as f64)
    }

    pub fn transition_dwell(&self) -> Duration {
        secs(self.transition_dwell_secs)
    }

    pub fn pause_poll(&self) -> Duration {
        secs(self.pause_poll_secs)
    }

    /// Rejects pointer targets the servo cannot reach.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.pointer.validate()
    }
}

/// Timed waits between panels.
pub trait Pacer {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("invalid settings")]
    Settings(#[from] SettingsError),
    #[error("no dialogs to play")]
    EmptyPlaylist,
    #[error("scanning dialogs failed")]
    Scan(#[source] BoxError),
    #[error("reading dialog `{id}` failed")]
    Read {
        id: String,
        #[source]
        source: BoxError,
    },
    #[error("dialog `{id}` is malformed")]
    Dialog {
        id: String,
        #[source]
        source: DialogError,
    },
    #[error("rendering `{text}` failed")]
    Render {
        text: String,
        #[source]
        source: RenderError,
    },
    #[error("display device failed")]
    Device(#[source] BoxError),
}

impl PlaybackError {
    /// Failures confined to a single dialog. A canvas that does not pack into a
    /// frame breaks every dialog and is not one of them.
    pub fn is_dialog_local(&self) -> bool {
        matches!(
            self,
            Self::Read { .. }
                | Self::Dialog { .. }
                | Self::Render {
                    source: RenderError::Fit(_),
                    ..
                }
        )
    }
}

fn device_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> PlaybackError {
    PlaybackError::Device(Box::new(err))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DialogOutcome {
    Completed,
    Interrupted,
}

/// Capabilities the playback loop drives.
pub struct PlaybackParts<S, D, R, F, P, G> {
    pub store: S,
    pub device: D,
    pub renderer: PanelRenderer<R>,
    pub signals: F,
    pub pacer: P,
    pub rng: G,
}

/// The daemon loop.
pub struct PlaybackService<S, D, R, F, P, G> {
    store: S,
    device: D,
    renderer: PanelRenderer<R>,
    signals: F,
    pacer: P,
    rng: G,
    settings: PlaybackSettings,
    playlist: Playlist,
    state: PlaybackState,
    previous: Option<String>,
}

impl<S, D, R, F, P, G> PlaybackService<S, D, R, F, P, G>
where
    S: DialogStore,
    D: PanelDevice,
    R: Rasterizer,
    F: SignalFlags,
    P: Pacer,
    G: Rng,
{
    pub fn new(parts: PlaybackParts<S, D, R, F, P, G>, settings: PlaybackSettings) -> Self {
        let state = if settings.start_paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Running
        };
        Self {
            store: parts.store,
            device: parts.device,
            renderer: parts.renderer,
            signals: parts.signals,
            pacer: parts.pacer,
            rng: parts.rng,
            settings,
            playlist: Playlist::default(),
            state,
            previous: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn renderer(&self) -> &PanelRenderer<R> {
        &self.renderer
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Runs until a terminate signal, then shows the goodbye screen and puts the
    /// device to sleep.
    pub fn run(&mut self) -> Result<(), PlaybackError> {
        self.settings.validate()?;
        self.renderer.settings().validate()?;

        self.playlist = self.scan()?;
        if self.playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        info!("playback: {} dialogs", self.playlist.len());

        self.device.init().map_err(device_error)?;

        match self.play_loop() {
            Ok(()) => self.goodbye(),
            Err(err) => {
                if let Err(sleep_err) = self.device.sleep() {
                    warn!("playback: device sleep after failure failed: {}", sleep_err);
                }
                Err(err)
            }
        }
    }

    fn play_loop(&mut self) -> Result<(), PlaybackError> {
        let mut idle_warned = false;
        loop {
            if !self.checkpoint() {
                return Ok(());
            }
            if self.state == PlaybackState::Paused {
                self.pacer.pause(self.settings.pause_poll());
                continue;
            }

            let Some(entry) = self.playlist.choose(&mut self.rng).cloned() else {
                if !idle_warned {
                    warn!("playback: playlist is empty, waiting for reload");
                    idle_warned = true;
                }
                self.pacer.pause(self.settings.pause_poll());
                continue;
            };
            idle_warned = false;

            info!("playback: selected {}", entry.id);
            match self.play_dialog(&entry) {
                Ok(DialogOutcome::Completed) => self.previous = Some(entry.id),
                Ok(DialogOutcome::Interrupted) => {
                    info!("playback: {} interrupted", entry.id);
                    self.previous = Some(entry.id);
                }
                Err(err)
                    if err.is_dialog_local()
                        && self.settings.on_dialog_error == FailurePolicy::Skip =>
                {
                    warn!("playback: skipping {}: {}", entry.id, error_chain(&err));
                    self.pacer.pause(self.settings.pause_poll());
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Observes pending signals. Returns `false` once terminating.
    fn checkpoint(&mut self) -> bool {
        if self.signals.observe(Signal::Terminate, false) {
            if self.state != PlaybackState::Terminating {
                info!("playback: terminating");
            }
            self.state = PlaybackState::Terminating;
            return false;
        }

        if self.signals.observe(Signal::Reload, true) {
            match self.scan() {
                Ok(playlist) => {
                    info!("playback: reloaded, {} dialogs", playlist.len());
                    self.playlist = playlist;
                }
                Err(err) => warn!("playback: reload failed, keeping playlist: {}", error_chain(&err)),
            }
        }

        if self.signals.observe(Signal::Pause, true) && self.state == PlaybackState::Running {
            info!("playback: paused");
            self.state = PlaybackState::Paused;
        }

        if self.signals.observe(Signal::Resume, true) && self.state == PlaybackState::Paused {
            info!("playback: resumed");
            self.state = PlaybackState::Running;
        }

        true
    }

    fn scan(&mut self) -> Result<Playlist, PlaybackError> {
        self.store
            .scan()
            .map_err(|err| PlaybackError::Scan(Box::new(err)))
    }

    fn load(&mut self, entry: &DialogEntry) -> Result<Dialog, PlaybackError> {
        let raw = self.store.read(entry).map_err(|err| PlaybackError::Read {
            id: entry.id.clone(),
            source: Box::new(err),
        })?;
        let dialog_error = |source| PlaybackError::Dialog {
            id: entry.id.clone(),
            source,
        };
        let mut dialog = Dialog::parse(entry.id.clone(), &raw).map_err(dialog_error)?;
        dialog.lines = normalize(&dialog.lines).map_err(dialog_error)?;
        Ok(dialog)
    }

    fn render(&self, text: &str) -> Result<FrameBuffer, PlaybackError> {
        self.renderer
            .render_frame(text)
            .map_err(|source| PlaybackError::Render {
                text: text.to_string(),
                source,
            })
    }

    fn play_dialog(&mut self, entry: &DialogEntry) -> Result<DialogOutcome, PlaybackError> {
        let dialog = self.load(entry)?;
        let panels = dialog
            .lines
            .iter()
            .map(|line| self.render(&line.text))
            .collect::<Result<Vec<_>, _>>()?;

        let transition = match &self.previous {
            None => format!("Starting with {}", dialog.id),
            Some(previous) => format!("Goodbye {}, Hello {}", previous, dialog.id),
        };
        let frame = self.render(&transition)?;
        self.device
            .show_and_move(&frame, RefreshMode::Slow, self.settings.pointer.center)
            .map_err(device_error)?;
        self.pacer.pause(self.settings.transition_dwell());

        for (index, (line, frame)) in dialog.lines.iter().zip(&panels).enumerate() {
            if self.signals.observe(Signal::Terminate, false) {
                return Ok(DialogOutcome::Interrupted);
            }

            let mode = if index == 0 {
                RefreshMode::Slow
            } else {
                RefreshMode::Quick
            };
            let pointer = self.settings.pointer.for_speaker(&line.speaker);
            let dwell = self.settings.panel_delay(line);
            info!(
                "playback: {} panel {} ({}, {} refresh, {:.1}s)",
                dialog.id,
                index + 1,
                line.speaker,
                mode.as_str(),
                dwell.as_secs_f64()
            );
            self.device
                .show_and_move(frame, mode, pointer)
                .map_err(device_error)?;
            self.pacer.pause(dwell);
        }

        Ok(DialogOutcome::Completed)
    }

    fn goodbye(&mut self) -> Result<(), PlaybackError> {
        self.state = PlaybackState::Terminating;
        match self.render(&self.settings.goodbye_text) {
            Ok(frame) => self
                .device
                .show_and_move(&frame, RefreshMode::Slow, self.settings.pointer.center)
                .map_err(device_error)?,
            Err(err) => warn!("playback: goodbye screen skipped: {}", error_chain(&err)),
        }
        info!("playback: display going to sleep");
        self.device.sleep().map_err(device_error)
    }
}

/// Error message with all its sources, for log lines.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
