use ballotbox::{MemStore, StoreError};
use fs2::FileExt;
use std::env::var;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_STATE_PATH: &str = "./ballotbox.json";
pub const DEFAULT_MASTER_PHRASE_PATH: &str = "./master_phrase.txt";

pub struct Config {
    pub state_path: PathBuf,
    pub master_phrase_path: PathBuf,
}

/// Exclusive hold on the state file. Released when dropped.
pub struct StateLock {
    _file: File,
}

impl Config {
    pub fn from_env() -> Self {
        let state_path = match var("BALLOTBOX_STATE_PATH") {
            Ok(val) => val,
            Err(_e) => DEFAULT_STATE_PATH.to_owned(),
        };

        let master_phrase_path = match var("BALLOTBOX_MASTER_PHRASE_FILE") {
            Ok(val) => val,
            Err(_e) => DEFAULT_MASTER_PHRASE_PATH.to_owned(),
        };

        Config {
            state_path: expand(&state_path),
            master_phrase_path: expand(&master_phrase_path),
        }
    }

    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(mut self, matches: &clap::ArgMatches) -> Self {
        if let Some(path) = matches.value_of("state") {
            self.state_path = expand(path);
        }
        if let Some(path) = matches.value_of("master-phrase") {
            self.master_phrase_path = expand(path);
        }
        self
    }

    /// Block until no other process is modifying the state file.
    ///
    /// The lock lives on a sibling `.lock` file, since saving replaces the state file itself.
    pub fn lock_state(&self) -> Result<StateLock, String> {
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .map_err(|e| format!("unable to open {}: {}", path.display(), e))?;
        file.lock_exclusive()
            .map_err(|e| format!("unable to lock {}: {}", path.display(), e))?;
        Ok(StateLock { _file: file })
    }

    fn lock_path(&self) -> PathBuf {
        let mut path = self.state_path.clone().into_os_string();
        path.push(".lock");
        PathBuf::from(path)
    }

    pub fn load_store(&self) -> Result<MemStore, String> {
        let json = std::fs::read_to_string(&self.state_path).map_err(|e| {
            format!("unable to read {}: {}", self.state_path.display(), e)
        })?;
        MemStore::from_json(&json)
            .map_err(|e| format!("unable to load {}: {}", self.state_path.display(), e))
    }

    /// Replace the state file in one rename, so readers never see a partial write
    pub fn save_store(&self, store: &MemStore) -> Result<(), String> {
        let json = store.to_json().map_err(|e: StoreError| e.to_string())?;
        let write_error = |e: &dyn std::fmt::Display| {
            format!("unable to write {}: {}", self.state_path.display(), e)
        };

        let dir = match self.state_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(|e| write_error(&e))?;
        file.write_all(json.as_bytes()).map_err(|e| write_error(&e))?;
        file.as_file().sync_all().map_err(|e| write_error(&e))?;
        file.persist(&self.state_path).map_err(|e| write_error(&e))?;
        Ok(())
    }

    /// Load, modify and save the store while holding the state lock
    pub fn update_store<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&MemStore) -> T,
    {
        let _lock = self.lock_state()?;
        let store = self.load_store()?;
        let outcome = f(&store);
        self.save_store(&store)?;
        Ok(outcome)
    }
}

/// Expand `~` and environment variables in a path
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(path),
    }
}
