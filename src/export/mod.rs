//! Plain-text export of detail panels and log tables
//!
//! The text mirrors what is on screen: `Key: value` lines, with the Execution
//! Log expanded into one glyph-prefixed line per step or assertion. Indentation
//! is two spaces per depth, capped so deep trees stop drifting right.

mod clipboard;

pub use clipboard::{Clipboard, ClipboardError, CopyFeedback, MemoryClipboard};

use crate::logs::{LogRecord, LogView};
use crate::tree::{status_glyph, steps, StepItem};
use crate::{DetailValue, StepNode, TestRow, EXECUTION_LOG_KEY};

pub const DEFAULT_INDENT_CAP: usize = 3;
pub const DEFAULT_DETAIL_MAX: usize = 120;

const ELLIPSIS: char = '…';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormatter {
    /// Deepest level that still gets its own indentation
    pub indent_cap: usize,
    /// Hard cap on assertion detail length, in characters
    pub detail_max: usize,
}

impl Default for ExportFormatter {
    fn default() -> Self {
        Self {
            indent_cap: DEFAULT_INDENT_CAP,
            detail_max: DEFAULT_DETAIL_MAX,
        }
    }
}

impl ExportFormatter {
    pub fn new(indent_cap: usize, detail_max: usize) -> Self {
        Self {
            indent_cap,
            detail_max,
        }
    }

    fn indent(&self, depth: usize) -> String {
        "  ".repeat(depth.min(self.indent_cap))
    }

    /// Export a row's detail panel. Entry controls are never part of the text.
    pub fn export_detail(&self, row: &TestRow) -> String {
        let mut lines = Vec::new();
        for entry in &row.details {
            match &entry.value {
                DetailValue::Steps { steps } => {
                    let header = if entry.key.is_empty() {
                        EXECUTION_LOG_KEY
                    } else {
                        entry.key.as_str()
                    };
                    lines.push(format!("{header}:"));
                    lines.extend(self.step_lines(steps));
                }
                DetailValue::Text { text }
                | DetailValue::Log { text }
                | DetailValue::Json { text } => {
                    lines.push(format!("{}: {}", entry.key, text.trim_end()));
                }
                DetailValue::Image { src } => lines.push(format!("{}: {}", entry.key, src)),
            }
        }
        lines.join("\n")
    }

    /// One line per step/assertion in document order. Attachment markers are
    /// not exported.
    pub fn step_lines(&self, nodes: &[StepNode]) -> Vec<String> {
        let tree = steps::build(nodes);
        let mut out = Vec::new();
        for id in tree.walk() {
            let Some(item) = tree.payload(id) else {
                continue;
            };
            let indent = self.indent(tree.depth(id));
            match item {
                StepItem::Step { label, passed } => {
                    out.push(format!("{indent}{} {label}", status_glyph(*passed)));
                }
                StepItem::Assertion {
                    label,
                    passed,
                    detail,
                } => {
                    let mut line = format!("{indent}{} {label}", status_glyph(*passed));
                    if let Some(detail) = detail.as_deref().filter(|d| !d.trim().is_empty()) {
                        line.push_str(&format!(" ({})", self.render_detail(detail)));
                    }
                    out.push(line);
                }
                StepItem::Attachment { .. } => {}
            }
        }
        out
    }

    /// Compact single-line rendering of assertion detail, truncated to the cap.
    /// Structured (JSON) detail is re-serialized compactly.
    pub fn render_detail(&self, detail: &str) -> String {
        let flat = match serde_json::from_str::<serde_json::Value>(detail) {
            Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| detail.to_string()),
            Err(_) => detail.split_whitespace().collect::<Vec<_>>().join(" "),
        };
        truncate(&flat, self.detail_max)
    }

    /// Export log records, continuation lines indented under their record
    pub fn export_logs<'a, I>(&self, records: I) -> String
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        let mut lines = Vec::new();
        for record in records {
            let mut head = record.level.as_str().to_string();
            if !record.logger.is_empty() {
                head.push(' ');
                head.push_str(&record.logger);
            }
            if let Some(location) = &record.location {
                head.push(' ');
                head.push_str(location);
            }
            let mut message = record.message.lines();
            if let Some(first) = message.next().filter(|m| !m.is_empty()) {
                head.push(' ');
                head.push_str(first);
            }
            lines.push(head);
            lines.extend(message.map(|m| format!("  {m}")));
        }
        lines.join("\n")
    }

    /// Export only what the log view currently shows
    pub fn export_log_view(&self, view: &LogView) -> String {
        self.export_logs(view.visible_records())
    }
}

/// Cut `text` to at most `max` characters, ending with an ellipsis when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}
