use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::models::Session;

/// Key of the record holding the in-progress session.
pub const CURRENT_KEY: &str = "current";
/// Directory of sealed pomodoro records.
pub const HISTORY_KEY: &str = "history";

const TIME_KEY_FORMAT: &str = "%Y-%m-%d_%H%M%S";
const EXTENSION: &str = "json";

/// Formats an instant as a store key (`YYYY-MM-DD_HHMMSS`, UTC).
///
/// Keys sort lexically in time order, which is what history range
/// queries rely on.
pub fn time_key(t: DateTime<Utc>) -> String {
    t.format(TIME_KEY_FORMAT).to_string()
}

/// Persistence used by the pomodoro state machine.
pub trait Store {
    /// Loads the current session. A missing record yields an empty session.
    fn get_current(&self) -> Result<Session, StoreError>;

    /// Overwrites the current session.
    fn save_current(&mut self, session: &Session) -> Result<(), StoreError>;

    /// Appends a completed pomodoro to history, keyed by its end time.
    fn save_pomodoro(&mut self, record: &Session) -> Result<(), StoreError>;

    /// Lists history records with keys in `[from, to)`, oldest first.
    /// Either bound may be omitted.
    fn list_history(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Session>, StoreError>;
}

/// Stores each record as a pretty-printed JSON file below a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `path`, creating it and its history
    /// directory if needed.
    pub fn new(path: impl AsRef<Path>) -> Result<FileStore, StoreError> {
        let root = path.as_ref().to_path_buf();
        let history = root.join(HISTORY_KEY);
        fs::create_dir_all(&history)
            .map_err(|e| StoreError::io("creating store directory", &history, e))?;
        Ok(FileStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes the current session record. A missing record is fine.
    pub fn clear_current(&self) -> Result<(), StoreError> {
        let path = self.file(CURRENT_KEY);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("removing", path, e)),
        }
    }

    /// Reads the record stored under `key`.
    pub fn read(&self, key: &str) -> Result<Session, StoreError> {
        let path = self.file(key);
        let mut f = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| StoreError::io("opening", &path, e))?;
        let mut s = String::new();
        f.read_to_string(&mut s)
            .map_err(|e| StoreError::io("reading", &path, e))?;
        serde_json::from_str(&s).map_err(|source| StoreError::Decode { path, source })
    }

    /// Writes `session` under `key`, replacing any existing record.
    pub fn save(&self, key: &str, session: &Session) -> Result<(), StoreError> {
        let res = self.write(key, session);
        match &res {
            Ok(()) => info!(key, "saved pomodoro"),
            Err(err) => error!(key, %err, "saving pomodoro"),
        }
        res
    }

    fn write(&self, key: &str, session: &Session) -> Result<(), StoreError> {
        let s = serde_json::to_string_pretty(session).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        let path = self.file(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| StoreError::io("creating parent directory for", dir, e))?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StoreError::io("creating", &path, e))?;
        f.write_all(s.as_bytes())
            .map_err(|e| StoreError::io("writing", &path, e))?;
        Ok(())
    }

    /// History keys within `[from, to)`, sorted.
    pub fn list_keys(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>, StoreError> {
        let from = from.map(time_key);
        let to = to.map(time_key);

        let dir = self.root.join(HISTORY_KEY);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("reading directory", dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io("reading directory", &dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if from.as_deref().is_some_and(|from| name < from) {
                continue;
            }
            if to.as_deref().is_some_and(|to| name >= to) {
                continue;
            }
            keys.push(format!("{HISTORY_KEY}/{name}"));
        }
        keys.sort();
        Ok(keys)
    }

    fn file(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{EXTENSION}"))
    }
}

impl Store for FileStore {
    fn get_current(&self) -> Result<Session, StoreError> {
        match self.read(CURRENT_KEY) {
            Ok(session) => Ok(session),
            Err(err) if err.is_not_found() => {
                debug!("no current session on disk");
                Ok(Session::default())
            }
            Err(err) => Err(err),
        }
    }

    fn save_current(&mut self, session: &Session) -> Result<(), StoreError> {
        self.save(CURRENT_KEY, session)?;
        // audit trail of every committed current session
        let snapshot = format!("{CURRENT_KEY}/{}", time_key(Utc::now()));
        self.save(&snapshot, session)
    }

    fn save_pomodoro(&mut self, record: &Session) -> Result<(), StoreError> {
        let end = record.end.or(record.start).unwrap_or_else(Utc::now);
        self.save(&format!("{HISTORY_KEY}/{}", time_key(end)), record)
    }

    fn list_history(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Session>, StoreError> {
        self.list_keys(from, to)?
            .iter()
            .map(|key| self.read(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn time_key_is_utc_and_sortable() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(time_key(t), "2024-03-09_070503");
        let later = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert!(time_key(t) < time_key(later));
    }
}
