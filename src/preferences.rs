//! Session preference store: the persisted color theme
//!
//! Values live in a scoped key-value store (`qareport.*` keys). The theme is
//! read once when the store is opened and updated write-then-apply: the
//! in-memory value only changes after the write succeeded, and listeners are
//! told only when the resolved light/dark theme actually changes.

use crate::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const KEY_PREFIX: &str = "qareport.";
pub const THEME_KEY: &str = "qareport.theme";
pub const PREFERENCES_FILENAME: &str = ".qareport-prefs.json";

/// Minimal persistent key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Page-lifetime store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write
    pub fn read_only() -> Self {
        Self {
            values: BTreeMap::new(),
            read_only: true,
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.read_only {
            return Err(ReportError::Preferences(format!(
                "store is read-only, cannot set {key}"
            )));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// JSON object on disk. A missing or corrupt file reads as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file: PreferencesFile,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<PreferencesFile>(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt preferences file");
                PreferencesFile::default()
            }),
            Err(_) => PreferencesFile::default(),
        };
        Self { path, file }
    }

    /// Store named [`PREFERENCES_FILENAME`] inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(PREFERENCES_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.file.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.file.clone();
        next.values.insert(key.to_string(), value.to_string());
        next.updated = Some(chrono::Utc::now().to_rfc3339());
        let content = serde_json::to_string_pretty(&next)
            .map_err(|e| ReportError::Preferences(e.to_string()))?;
        fs::write(&self.path, content).map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.file = next;
        Ok(())
    }
}

/// Stored theme choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    Auto,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::Auto => "auto",
        }
    }

    /// Toggle cycle: light, dark, auto, light
    pub fn next(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Auto,
            ThemePreference::Auto => ThemePreference::Light,
        }
    }

    pub fn resolve(self, system: ResolvedTheme) -> ResolvedTheme {
        match self {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::Auto => system,
        }
    }
}

impl std::str::FromStr for ThemePreference {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "auto" => Ok(ThemePreference::Auto),
            other => Err(ReportError::Preferences(format!("unknown theme '{other}'"))),
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme actually applied to rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    #[default]
    Dark,
}

type Listener = Box<dyn FnMut(ResolvedTheme)>;

pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
    theme: ThemePreference,
    system: ResolvedTheme,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("theme", &self.theme)
            .field("system", &self.system)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PreferenceStore {
    /// Open over `store`, reading the theme once. An unreadable value falls
    /// back to auto.
    pub fn new(store: Box<dyn KeyValueStore>, system: ResolvedTheme) -> Self {
        let theme = match store.get(THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "ignoring unknown stored theme");
                ThemePreference::Auto
            }),
            None => ThemePreference::Auto,
        };
        Self {
            store,
            theme,
            system,
            listeners: Vec::new(),
        }
    }

    pub fn in_memory(system: ResolvedTheme) -> Self {
        Self::new(Box::new(MemoryStore::new()), system)
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    pub fn system(&self) -> ResolvedTheme {
        self.system
    }

    pub fn resolved(&self) -> ResolvedTheme {
        self.theme.resolve(self.system)
    }

    /// Register a callback run whenever the resolved theme changes
    pub fn subscribe(&mut self, listener: impl FnMut(ResolvedTheme) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Persist `theme`, then apply it. A failed write changes nothing.
    pub fn set_theme(&mut self, theme: ThemePreference) -> Result<ResolvedTheme> {
        self.store.set(THEME_KEY, theme.as_str())?;
        let before = self.resolved();
        self.theme = theme;
        let after = self.resolved();
        tracing::debug!(theme = %theme, "theme preference stored");
        if before != after {
            self.notify(after);
        }
        Ok(after)
    }

    pub fn toggle_theme(&mut self) -> Result<ThemePreference> {
        let next = self.theme.next();
        self.set_theme(next)?;
        Ok(next)
    }

    /// The ambient system preference changed
    pub fn set_system_theme(&mut self, system: ResolvedTheme) {
        let before = self.resolved();
        self.system = system;
        let after = self.resolved();
        if before != after {
            self.notify(after);
        }
    }

    /// Read any scoped value; `key` is given without the prefix
    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(&format!("{KEY_PREFIX}{key}"))
    }

    fn notify(&mut self, theme: ResolvedTheme) {
        for listener in &mut self.listeners {
            listener(theme);
        }
    }
}
