//! JSON reporter for machine-readable output

use crate::logs::{LogRecord, LogView};
use crate::tree::RenderedLine;
use crate::view::ReportView;
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|_| fallback.to_string())
    }

    /// The reconciled table
    pub fn report(&self, view: &ReportView) -> String {
        self.encode(view, "{}")
    }

    /// Visible log records plus the logger filter state
    pub fn report_logs(&self, view: &LogView) -> String {
        let records: Vec<&LogRecord> = view.visible_records().collect();
        let output = JsonLogs {
            records,
            loggers: view.loggers().items(),
            selected: view.loggers().checked_items().collect(),
            search: view.search(),
            total: view.records().len(),
        };
        self.encode(&output, "{}")
    }

    /// Rendered tree lines
    pub fn report_tree(&self, lines: &[RenderedLine], matches: usize) -> String {
        self.encode(&JsonTree { lines, matches }, "{}")
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonLogs<'a> {
    records: Vec<&'a LogRecord>,
    loggers: &'a [String],
    selected: Vec<&'a str>,
    search: &'a str,
    total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonTree<'a> {
    lines: &'a [RenderedLine],
    matches: usize,
}
