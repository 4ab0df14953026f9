use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// On-disk layout of the best score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreRecord {
    #[serde(rename = "bestScore")]
    pub best_score: u32,
}

/// Persistence for the best level ever completed
pub trait ScoreStore {
    /// Stored best score, or 0 when nothing usable is stored
    fn load(&self) -> u32;
    fn save(&self, level: u32) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::score_path().unwrap_or_else(|| PathBuf::from("tatsumakeeb_score.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> u32 {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(record) = serde_json::from_slice::<ScoreRecord>(&bytes) {
                return record.best_score;
            }
            log::warn!("ignoring unreadable score file {}", self.path.display());
        }
        0
    }

    fn save(&self, level: u32) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&ScoreRecord { best_score: level })?;
        fs::write(&self.path, data)
    }
}

/// In-memory store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    best: Cell<u32>,
    saves: Cell<usize>,
}

impl MemoryScoreStore {
    pub fn new(best: u32) -> Self {
        Self {
            best: Cell::new(best),
            saves: Cell::new(0),
        }
    }

    /// Number of times `save` has been called
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> u32 {
        self.best.get()
    }

    fn save(&self, level: u32) -> std::io::Result<()> {
        self.best.set(level);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

impl<S: ScoreStore + ?Sized> ScoreStore for std::rc::Rc<S> {
    fn load(&self) -> u32 {
        (**self).load()
    }

    fn save(&self, level: u32) -> std::io::Result<()> {
        (**self).save(level)
    }
}
