//! Dialog discovery and random selection.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

/// A dialog file eligible for playback.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DialogEntry {
    /// File stem, shown on transition screens.
    pub id: String,
    pub path: PathBuf,
}

impl DialogEntry {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Snapshot of eligible dialogs. A rescan builds a new playlist that replaces
/// the old one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Playlist {
    entries: Vec<DialogEntry>,
}

impl Playlist {
    pub fn new(entries: Vec<DialogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DialogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Uniform random pick; repeats are allowed.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&DialogEntry> {
        self.entries.choose(rng)
    }
}

/// Source of dialog files.
pub trait DialogStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn scan(&mut self) -> Result<Playlist, Self::Error>;
    fn read(&mut self, entry: &DialogEntry) -> Result<String, Self::Error>;
}

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("dialogs directory {0} does not exist or is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory of `*.txt` dialog files. Hidden files are ignored.
#[derive(Clone, Debug)]
pub struct DialogDir {
    root: PathBuf,
}

impl DialogDir {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PlaylistError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PlaylistError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_dialog_file(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| !name.starts_with('.'));
    visible && path.extension().is_some_and(|ext| ext == "txt") && path.is_file()
}

impl DialogStore for DialogDir {
    type Error = PlaylistError;

    fn scan(&mut self) -> Result<Playlist, Self::Error> {
        let io_error = |source| PlaylistError::Io {
            path: self.root.clone(),
            source,
        };
        let mut entries = Vec::new();
        for item in fs::read_dir(&self.root).map_err(io_error)? {
            let path = item.map_err(io_error)?.path();
            if !is_dialog_file(&path) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            entries.push(DialogEntry::new(id, path.clone()));
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("playlist: {} dialogs in {}", entries.len(), self.root.display());
        Ok(Playlist::new(entries))
    }

    fn read(&mut self, entry: &DialogEntry) -> Result<String, Self::Error> {
        fs::read_to_string(&entry.path).map_err(|source| PlaylistError::Io {
            path: entry.path.clone(),
            source,
        })
    }
}
