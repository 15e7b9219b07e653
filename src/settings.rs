// src/settings.rs
//
// Persisted controller settings: last port, last baud rate and theme.
// Reading never fails (a missing or corrupt file yields defaults) and
// write failures are logged and swallowed.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::serial::BaudRate;

/// Settings file name, kept in the user's home directory
pub const SETTINGS_FILE_NAME: &str = ".juma_rs232_gui.json";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baud: Option<BaudRate>,
}

/// Where settings live between runs
pub trait SettingsStore {
    /// Load settings, falling back to defaults on any failure.
    fn load(&self) -> Settings;

    /// Save settings. Failures are logged, never returned.
    fn save(&self, settings: &Settings);
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.juma_rs232_gui.json` (current directory if home is unknown)
    pub fn default_location() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Settings, String> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read settings: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    fn write(&self, settings: &Settings) -> Result<(), String> {
        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(&self.path, content).map_err(|e| format!("Failed to write settings: {}", e))
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match self.read() {
            Ok(settings) => settings,
            Err(e) => {
                tlog!("[settings] {} ({}), using defaults", e, self.path.display());
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) {
        if let Err(e) = self.write(settings) {
            tlog!("[settings] {} ({})", e, self.path.display());
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Store that keeps settings in memory; clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryRecord>>,
}

#[derive(Debug, Default)]
struct MemoryRecord {
    settings: Settings,
    saves: usize,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryRecord { settings, saves: 0 })),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.inner.borrow().settings.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Settings {
        self.snapshot()
    }

    fn save(&self, settings: &Settings) {
        let mut record = self.inner.borrow_mut();
        record.settings = settings.clone();
        record.saves += 1;
    }
}
