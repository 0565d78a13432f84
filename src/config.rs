//! User configuration and data directory resolution.
//!
//! Settings live in `config.json` inside the data directory. The file is
//! written with defaults on first run so it is easy to find and edit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.json";
pub const DATA_DIR_ENV: &str = "POMO_DIR";
const DEFAULT_DIR_NAME: &str = ".pomo";

/// Resolves the data directory.
///
/// The path is determined in the following order:
/// 1. an explicit override (the `--data-dir` flag).
/// 2. `POMO_DIR` environment variable.
/// 3. `~/.pomo`.
pub fn data_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(p) = explicit {
        return Ok(p);
    }
    if let Some(p) = std::env::var_os(DATA_DIR_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// On-disk shape of the configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
struct RawConfig {
    daily_goal: u32,
    pomodoro: String,
    #[serde(rename = "break")]
    short_break: String,
    long_break: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        RawConfig {
            daily_goal: 0,
            pomodoro: "25m".into(),
            short_break: "5m".into(),
            long_break: "15m".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Pomodoros to aim for per day; zero means no goal.
    pub daily_goal: u32,
    pub pomodoro: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            daily_goal: 0,
            pomodoro: Duration::minutes(25),
            short_break: Duration::minutes(5),
            long_break: Duration::minutes(15),
        }
    }
}

impl Config {
    /// Loads `config.json` from `dir`, writing the defaults first if it is missing.
    pub fn load(dir: &Path) -> Result<Config, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str::<RawConfig>(&s).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let raw = RawConfig::default();
                write_default(&path, &raw)?;
                info!(path = %path.display(), "wrote default configuration");
                raw
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    action: "reading",
                    path,
                    source,
                })
            }
        };
        Config::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Config, ConfigError> {
        let duration = |key: &'static str, value: String| {
            parse_duration(&value).ok_or(ConfigError::InvalidDuration { key, value })
        };
        Ok(Config {
            daily_goal: raw.daily_goal,
            pomodoro: duration("pomodoro", raw.pomodoro)?,
            short_break: duration("break", raw.short_break)?,
            long_break: duration("long_break", raw.long_break)?,
        })
    }
}

fn write_default(path: &Path, raw: &RawConfig) -> Result<(), ConfigError> {
    let io_err = |action, source| ConfigError::Io {
        action,
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| io_err("creating directory for", e))?;
    }
    let s = serde_json::to_string_pretty(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, s).map_err(|e| io_err("writing", e))
}

/// Parses durations such as `25m`, `1h30m`, `90s` or `0.5h`.
///
/// Returns `None` for empty, unit-less, or non-positive input.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();
    let mut total_ms = 0.0_f64;
    let mut current = String::new();
    let mut saw_unit = false;

    for ch in s.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current.push(ch);
            continue;
        }
        let unit_ms = match ch {
            'h' => 3_600_000.0,
            'm' => 60_000.0,
            's' => 1_000.0,
            c if c.is_whitespace() => continue,
            _ => return None,
        };
        let n: f64 = current.parse().ok()?;
        total_ms += n * unit_ms;
        current.clear();
        saw_unit = true;
    }

    if !current.is_empty() || !saw_unit || total_ms <= 0.0 || !total_ms.is_finite() {
        return None;
    }
    Some(Duration::milliseconds(total_ms.round() as i64))
}
