//! Persist the high score to disk (XDG config or ~/.config/tower-builder).

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "tower-builder";
const FILENAME: &str = "high_score.json";

/// Where the session reads and writes its best score. Implementations never fail
/// towards the caller: a broken store reads as 0 and drops writes.
pub trait HighScoreStore {
    fn load_high_score(&self) -> u32;
    fn save_high_score(&self, score: u32);
}

#[derive(Debug, Error)]
pub enum HighScoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid high score file: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk shape: `{"high_score": N}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HighScoreFile {
    #[serde(default)]
    high_score: u32,
}

/// Returns the default path to the high score file (config dir / tower-builder / high_score.json).
pub fn default_path() -> PathBuf {
    path_from_env(
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        std::env::var("HOME").ok().as_deref(),
    )
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`, else the working directory.
fn path_from_env(xdg_config_home: Option<&str>, home: Option<&str>) -> PathBuf {
    let base = match (xdg_config_home, home) {
        (Some(xdg), _) if !xdg.is_empty() => PathBuf::from(xdg),
        (_, Some(home)) => PathBuf::from(home).join(".config"),
        (_, None) => PathBuf::from("."),
    };
    base.join(APP_DIR).join(FILENAME)
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<u32, HighScoreError> {
        let content = fs::read_to_string(&self.path)?;
        let file: HighScoreFile = serde_json::from_str(&content)?;
        Ok(file.high_score)
    }

    /// Creates the parent directory if needed.
    pub fn write(&self, score: u32) -> Result<(), HighScoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&HighScoreFile { high_score: score })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(default_path())
    }
}

impl HighScoreStore for JsonFileStore {
    fn load_high_score(&self) -> u32 {
        match self.read() {
            Ok(score) => score,
            // First run: nothing saved yet.
            Err(HighScoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => {
                log::warn!("could not load high score from {}: {e}", self.path.display());
                0
            }
        }
    }

    fn save_high_score(&self, score: u32) {
        if let Err(e) = self.write(score) {
            log::warn!("could not save high score to {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// In-memory store; the shared cell lets tests observe saves after the session owns the store.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct MemoryStore {
        pub(crate) initial: u32,
        pub(crate) saved: Rc<Cell<Option<u32>>>,
    }

    impl HighScoreStore for MemoryStore {
        fn load_high_score(&self) -> u32 {
            self.initial
        }

        fn save_high_score(&self, score: u32) {
            self.saved.set(Some(score));
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tower-builder-test-{}-{name}", std::process::id()))
            .join(FILENAME)
    }

    #[test]
    fn config_path_prefers_xdg_then_home() {
        assert_eq!(
            path_from_env(Some("/xdg"), Some("/home/me")),
            PathBuf::from("/xdg/tower-builder/high_score.json")
        );
        assert_eq!(
            path_from_env(Some(""), Some("/home/me")),
            PathBuf::from("/home/me/.config/tower-builder/high_score.json")
        );
        assert_eq!(
            path_from_env(None, Some("/home/me")),
            PathBuf::from("/home/me/.config/tower-builder/high_score.json")
        );
        assert_eq!(
            path_from_env(None, None),
            PathBuf::from("./tower-builder/high_score.json")
        );
    }

    #[test]
    fn round_trip_through_file() {
        let path = scratch_path("round-trip");
        let store = JsonFileStore::new(&path);
        store.save_high_score(420);
        assert_eq!(store.load_high_score(), 420);
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"high_score":420}"#);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_loads_as_zero() {
        let store = JsonFileStore::new(scratch_path("missing"));
        assert!(matches!(store.read(), Err(HighScoreError::Io(_))));
        assert_eq!(store.load_high_score(), 0);
    }

    #[test]
    fn corrupt_file_loads_as_zero() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.read(), Err(HighScoreError::Json(_))));
        assert_eq!(store.load_high_score(), 0);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_key_defaults_to_zero() {
        let path = scratch_path("no-key");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{}").unwrap();
        assert_eq!(JsonFileStore::new(&path).read().unwrap(), 0);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn unwritable_location_is_swallowed() {
        // Parent "directory" is a regular file, so create_dir_all fails.
        let blocker = scratch_path("blocker");
        fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        fs::write(&blocker, "{}").unwrap();
        let store = JsonFileStore::new(blocker.join("nested.json"));
        store.save_high_score(99);
        assert!(store.write(99).is_err());
        let _ = fs::remove_dir_all(blocker.parent().unwrap());
    }
}
