//! Level-triggered signal flags observed by the playback loop.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Requests the daemon reacts to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Signal {
    Terminate,
    Reload,
    Pause,
    Resume,
}

/// Store of pending signals.
pub trait SignalFlags {
    /// Reports whether `kind` is pending, clearing it when `clear` is set.
    fn observe(&self, kind: Signal, clear: bool) -> bool;
}

/// Flags backed by shared atomics. Handlers only store `true`; clones share the
/// same flags.
#[derive(Clone, Debug, Default)]
pub struct AtomicSignalFlags {
    terminate: Arc<AtomicBool>,
    reload: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
    resume: Arc<AtomicBool>,
}

impl AtomicSignalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag to hand to a signal handler registration.
    pub fn flag(&self, kind: Signal) -> Arc<AtomicBool> {
        Arc::clone(self.slot(kind))
    }

    pub fn raise(&self, kind: Signal) {
        self.slot(kind).store(true, Ordering::SeqCst);
    }

    fn slot(&self, kind: Signal) -> &Arc<AtomicBool> {
        match kind {
            Signal::Terminate => &self.terminate,
            Signal::Reload => &self.reload,
            Signal::Pause => &self.pause,
            Signal::Resume => &self.resume,
        }
    }
}

impl SignalFlags for AtomicSignalFlags {
    fn observe(&self, kind: Signal, clear: bool) -> bool {
        let slot = self.slot(kind);
        if clear {
            slot.swap(false, Ordering::SeqCst)
        } else {
            slot.load(Ordering::SeqCst)
        }
    }
}
