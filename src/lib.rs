//! QAReport: interactive test report engine
//!
//! This library takes the data model captured by a test-execution harness
//! (tests, step trees, assertions, attachments, raw log text) and provides the
//! interactive side of the report: filtering, searching, sorting, expanding,
//! log reconstruction, attachment trees and plain-text export.

pub mod config;
pub mod error;
pub mod expansion;
pub mod export;
pub mod filter;
pub mod logging;
pub mod logs;
pub mod preferences;
pub mod reporter;
pub mod session;
pub mod sort;
pub mod tree;
pub mod view;

pub use error::{ReportError, Result};
pub use session::{Intent, ReportEngine, SessionState};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Key of the distinguished detail entry holding the step tree
pub const EXECUTION_LOG_KEY: &str = "Execution Log";

/// The full harness document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report title shown in the header
    #[serde(default)]
    pub title: Option<String>,
    /// One row per executed test, in harness order
    pub tests: Vec<TestRow>,
}

impl Report {
    /// Parse a harness document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let report: Report = serde_json::from_str(text).map_err(ReportError::InvalidDocument)?;
        tracing::debug!(tests = report.tests.len(), "loaded report document");
        Ok(report)
    }

    /// Read and parse a harness document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Look up a row by its harness id
    pub fn row(&self, id: &str) -> Option<&TestRow> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Look up a row or fail with [`ReportError::UnknownTest`]
    pub fn require_row(&self, id: &str) -> Result<&TestRow> {
        self.row(id)
            .ok_or_else(|| ReportError::UnknownTest(id.to_string()))
    }

    /// Distinct component tags across all rows, sorted
    pub fn components(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .tests
            .iter()
            .flat_map(|t| t.components.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

/// A single test row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRow {
    /// Harness-assigned identity (node id)
    pub id: String,
    /// Display name (the harness "title")
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Wall-clock duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Component tags, possibly empty
    #[serde(default)]
    pub components: Vec<String>,
    /// Free-text summary included in row search
    #[serde(default)]
    pub summary: String,
    /// Detail panel entries in display order
    #[serde(default)]
    pub details: Vec<DetailEntry>,
    /// Raw captured log text for this test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
}

impl TestRow {
    /// Text the row search axis matches against
    pub fn search_text(&self) -> String {
        let mut text = String::with_capacity(self.name.len() + self.summary.len() + self.id.len() + 2);
        text.push_str(&self.name);
        text.push('\n');
        text.push_str(&self.id);
        if !self.summary.is_empty() {
            text.push('\n');
            text.push_str(&self.summary);
        }
        text
    }

    /// Find a detail entry by key
    pub fn detail(&self, key: &str) -> Option<&DetailEntry> {
        self.details.iter().find(|d| d.key == key)
    }

    /// The Execution Log step tree, if the harness recorded one
    pub fn execution_log(&self) -> Option<&[StepNode]> {
        self.details.iter().find_map(|d| match &d.value {
            DetailValue::Steps { steps } => Some(steps.as_slice()),
            _ => None,
        })
    }

    /// The raw log blob: the row's own `logs`, else the first `log` detail entry
    pub fn log_text(&self) -> Option<&str> {
        self.logs.as_deref().or_else(|| {
            self.details.iter().find_map(|d| match &d.value {
                DetailValue::Log { text } => Some(text.as_str()),
                _ => None,
            })
        })
    }
}

/// Test outcome, a closed set produced by the harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Error,
    Skipped,
    Xfailed,
    Xpassed,
}

impl TestStatus {
    pub const ALL: [TestStatus; 6] = [
        TestStatus::Passed,
        TestStatus::Failed,
        TestStatus::Error,
        TestStatus::Skipped,
        TestStatus::Xfailed,
        TestStatus::Xpassed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Error => "error",
            TestStatus::Skipped => "skipped",
            TestStatus::Xfailed => "xfailed",
            TestStatus::Xpassed => "xpassed",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestStatus {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        TestStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReportError::UnknownStatus(s.to_string()))
    }
}

/// One key/value line of a detail panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailEntry {
    pub key: String,
    pub value: DetailValue,
    /// Action buttons rendered next to the value (never exported)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<String>,
}

/// Payload of a detail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetailValue {
    /// Plain text
    Text { text: String },
    /// Raw interleaved log blob
    Log { text: String },
    /// JSON attachment, kept as text until a tree view is opened
    Json { text: String },
    /// Opaque binary reference (data URI or path)
    Image { src: String },
    /// The Execution Log step tree
    Steps { steps: Vec<StepNode> },
}

/// A node of the Execution Log tree, tagged once by the harness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepNode {
    Step {
        message: String,
        passed: bool,
        #[serde(default)]
        children: Vec<StepNode>,
    },
    #[serde(rename = "assert")]
    Assertion {
        label: String,
        passed: bool,
        /// Plain text, or structured detail kept as compact JSON text
        #[serde(
            default,
            deserialize_with = "detail_text",
            skip_serializing_if = "Option::is_none"
        )]
        details: Option<String>,
    },
    Attachment {
        label: String,
        #[serde(default)]
        content_type: AttachmentKind,
        #[serde(default)]
        data: String,
    },
}

impl StepNode {
    /// Display label of the node
    pub fn label(&self) -> &str {
        match self {
            StepNode::Step { message, .. } => message,
            StepNode::Assertion { label, .. } => label,
            StepNode::Attachment { label, .. } => label,
        }
    }

    /// Pass/fail status; attachments carry none
    pub fn passed(&self) -> Option<bool> {
        match self {
            StepNode::Step { passed, .. } | StepNode::Assertion { passed, .. } => Some(*passed),
            StepNode::Attachment { .. } => None,
        }
    }

    /// Direct children (only steps have any)
    pub fn children(&self) -> &[StepNode] {
        match self {
            StepNode::Step { children, .. } => children,
            _ => &[],
        }
    }
}

/// Assertion detail as text: strings pass through, other JSON values become
/// their compact serialization, `null` means none
fn detail_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// Content type of a step-tree attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    #[default]
    Text,
    Json,
    Image,
}
