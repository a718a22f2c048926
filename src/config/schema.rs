//! Config schema and deserialization

use crate::export::{CopyFeedback, ExportFormatter, DEFAULT_DETAIL_MAX, DEFAULT_INDENT_CAP};
use crate::preferences::{ResolvedTheme, PREFERENCES_FILENAME};
use crate::sort::SortState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COPY_CONFIRMATION_MS: u64 = 900;

/// Root config structure for .qareportrc.json
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Deepest Execution Log level that still gets its own indentation on export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_indent_cap: Option<usize>,

    /// Maximum characters of assertion detail on export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion_detail_max: Option<usize>,

    /// How long a copy control shows its confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_confirmation_ms: Option<u64>,

    /// Preferences file, relative to this config's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_file: Option<String>,

    /// Ambient theme that "auto" resolves to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_theme: Option<ResolvedTheme>,

    /// Initial sort, e.g. "duration:desc"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<String>,

    /// File this config was loaded from (not part of the file format)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        indent_cap: Option<usize>,
        detail_max: Option<usize>,
        system_theme: Option<ResolvedTheme>,
    ) -> Self {
        if indent_cap.is_some() {
            self.export_indent_cap = indent_cap;
        }
        if detail_max.is_some() {
            self.assertion_detail_max = detail_max;
        }
        if system_theme.is_some() {
            self.system_theme = system_theme;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values only fill gaps
        if self.export_indent_cap.is_none() {
            self.export_indent_cap = base.export_indent_cap;
        }
        if self.assertion_detail_max.is_none() {
            self.assertion_detail_max = base.assertion_detail_max;
        }
        if self.copy_confirmation_ms.is_none() {
            self.copy_confirmation_ms = base.copy_confirmation_ms;
        }
        if self.preferences_file.is_none() {
            self.preferences_file = base.preferences_file;
        }
        if self.system_theme.is_none() {
            self.system_theme = base.system_theme;
        }
        if self.default_sort.is_none() {
            self.default_sort = base.default_sort;
        }
    }

    pub fn export_formatter(&self) -> ExportFormatter {
        ExportFormatter::new(
            self.export_indent_cap.unwrap_or(DEFAULT_INDENT_CAP),
            self.assertion_detail_max.unwrap_or(DEFAULT_DETAIL_MAX),
        )
    }

    pub fn copy_feedback(&self) -> CopyFeedback {
        CopyFeedback::new(Duration::from_millis(
            self.copy_confirmation_ms
                .unwrap_or(DEFAULT_COPY_CONFIRMATION_MS),
        ))
    }

    pub fn system_theme(&self) -> ResolvedTheme {
        self.system_theme.unwrap_or_default()
    }

    /// Parsed `defaultSort`, if any
    pub fn default_sort(&self) -> crate::Result<Option<SortState>> {
        self.default_sort.as_deref().map(str::parse::<SortState>).transpose()
    }

    /// Where the preference store lives: beside the config file, else in
    /// `work_dir`
    pub fn preferences_path(&self, work_dir: &Path) -> PathBuf {
        let base = self
            .source
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(work_dir);
        match &self.preferences_file {
            Some(file) if Path::new(file).is_absolute() => PathBuf::from(file),
            Some(file) => base.join(file),
            None => base.join(PREFERENCES_FILENAME),
        }
    }
}
