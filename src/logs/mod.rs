//! Log reconstruction: raw interleaved log text to structured records
//!
//! The harness captures log output as one newline-delimited blob per test.
//! A record starts at a line shaped like
//! `LEVEL <logger>:<file>:<line> <message>` or `LEVEL <message>`; any other
//! non-blank line is a continuation of the open record (stack traces,
//! pretty-printed payloads). Blank lines are skipped and never close a record.

mod view;

pub use view::{LogMatch, LogView};

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Map a level token as emitted by the harness. `WARN`/`WARNING` and
    /// `FATAL`/`CRITICAL` are the only accepted aliases.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARNING" | "WARN" => Some(LogLevel::Warning),
            "ERROR" => Some(LogLevel::Error),
            "CRITICAL" | "FATAL" => Some(LogLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconstructed log record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: LogLevel,
    /// Logger name; empty when the line carried no logger prefix
    pub logger: String,
    /// `file:line` of the emitting call, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Message text, continuation lines joined with `\n`
    pub message: String,
    /// 1-indexed line in the blob where the record starts
    pub line: usize,
}

/// Output of [`reconstruct`]: records in blob order plus the distinct loggers
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconstructedLog {
    pub records: Vec<LogRecord>,
    /// Distinct non-empty logger names, used to populate the logger filter
    pub loggers: BTreeSet<String>,
}

impl ReconstructedLog {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

const LEVELS: &str = "DEBUG|INFO|WARNING|WARN|ERROR|CRITICAL|FATAL";

fn full_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^({LEVELS})\s+([^\s:]+):([^\s:]+):(\d+)(?:\s+(.*))?$"
        ))
        .expect("valid log record pattern")
    })
}

fn level_only_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^({LEVELS})(?:\s+(.*))?$")).expect("valid log level pattern")
    })
}

/// Try to start a record from a single line
fn parse_record_start(line: &str, line_no: usize) -> Option<LogRecord> {
    if let Some(caps) = full_pattern().captures(line) {
        let level = LogLevel::from_token(&caps[1])?;
        return Some(LogRecord {
            level,
            logger: caps[2].to_string(),
            location: Some(format!("{}:{}", &caps[3], &caps[4])),
            message: caps.get(5).map(|m| m.as_str().to_string()).unwrap_or_default(),
            line: line_no,
        });
    }
    let caps = level_only_pattern().captures(line)?;
    Some(LogRecord {
        level: LogLevel::from_token(&caps[1])?,
        logger: String::new(),
        location: None,
        message: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        line: line_no,
    })
}

/// Rebuild structured records from a raw log blob.
///
/// Not incremental: callers always pass the full blob.
pub fn reconstruct(text: &str) -> ReconstructedLog {
    let mut out = ReconstructedLog::default();
    let mut current: Option<LogRecord> = None;
    let mut dropped = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(record) = parse_record_start(line, idx + 1) {
            if let Some(done) = current.take() {
                out.records.push(done);
            }
            if !record.logger.is_empty() {
                out.loggers.insert(record.logger.clone());
            }
            current = Some(record);
            continue;
        }

        match current.as_mut() {
            Some(record) => {
                record.message.push('\n');
                record.message.push_str(line);
            }
            // Nothing to continue: the line is unattributable
            None => dropped += 1,
        }
    }

    if let Some(done) = current.take() {
        out.records.push(done);
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped log lines before the first record");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_multiline_record() {
        let log = reconstruct("INFO  mod.x:file.py:10 hello\nworld\nERROR mod.y:file.py:20 boom");
        assert_eq!(log.records.len(), 2);

        let first = &log.records[0];
        assert_eq!(first.level, LogLevel::Info);
        assert_eq!(first.logger, "mod.x");
        assert_eq!(first.location.as_deref(), Some("file.py:10"));
        assert_eq!(first.message, "hello\nworld");
        assert_eq!(first.line, 1);

        let second = &log.records[1];
        assert_eq!(second.level, LogLevel::Error);
        assert_eq!(second.logger, "mod.y");
        assert_eq!(second.message, "boom");
        assert_eq!(second.line, 3);
    }

    #[test]
    fn level_only_line_has_empty_logger() {
        let log = reconstruct("WARNING disk almost full");
        assert_eq!(log.records.len(), 1);
        assert_eq!(log.records[0].level, LogLevel::Warning);
        assert_eq!(log.records[0].logger, "");
        assert_eq!(log.records[0].location, None);
        assert_eq!(log.records[0].message, "disk almost full");
        assert!(log.loggers.is_empty());
    }

    #[test]
    fn blank_lines_do_not_terminate_record() {
        let log = reconstruct("ERROR app:m.py:3 Traceback\n\n  File \"m.py\"\n\nValueError: x");
        assert_eq!(log.records.len(), 1);
        assert_eq!(
            log.records[0].message,
            "Traceback\n  File \"m.py\"\nValueError: x"
        );
    }

    #[test]
    fn orphan_lines_before_first_record_are_dropped() {
        let log = reconstruct("garbage\n\nINFO ok");
        assert_eq!(log.records.len(), 1);
        assert_eq!(log.records[0].message, "ok");
    }

    #[test]
    fn aliases_map_to_same_severity() {
        let log = reconstruct("WARN a\nWARNING b\nFATAL c\nCRITICAL d\nDEBUG e");
        let levels: Vec<_> = log.records.iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![
                LogLevel::Warning,
                LogLevel::Warning,
                LogLevel::Critical,
                LogLevel::Critical,
                LogLevel::Debug
            ]
        );
    }

    #[test]
    fn level_prefix_must_be_whole_token() {
        let log = reconstruct("INFO start\nINFORMATION is not a level\nTRACE neither");
        assert_eq!(log.records.len(), 1);
        assert_eq!(
            log.records[0].message,
            "start\nINFORMATION is not a level\nTRACE neither"
        );
    }

    #[test]
    fn collects_distinct_loggers() {
        let log = reconstruct(
            "INFO b.svc:x.py:1 one\nINFO a.svc:x.py:2 two\nDEBUG b.svc:x.py:3 three\nINFO bare",
        );
        let loggers: Vec<_> = log.loggers.iter().cloned().collect();
        assert_eq!(loggers, vec!["a.svc", "b.svc"]);
    }

    #[test]
    fn record_with_empty_message() {
        let log = reconstruct("ERROR\nINFO mod:f.py:9");
        assert_eq!(log.records.len(), 2);
        assert_eq!(log.records[0].message, "");
        assert_eq!(log.records[1].logger, "mod");
        assert_eq!(log.records[1].message, "");
    }

    #[test]
    fn crlf_input() {
        let log = reconstruct("INFO a:f.py:1 x\r\ny\r\n");
        assert_eq!(log.records[0].message, "x\ny");
    }

    #[test]
    fn empty_blob() {
        assert!(reconstruct("").is_empty());
        assert!(reconstruct("\n\n  \n").is_empty());
    }
}
