use super::{reconstruct, LogRecord, ReconstructedLog};
use crate::filter::search::term_regex;
use crate::filter::{contains_ignore_case, highlight, mark, MultiSelect};
use serde::Serialize;

/// One search hit: index into [`LogView::records`] plus the byte range in
/// that record's message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogMatch {
    pub record: usize,
    pub start: usize,
    pub end: usize,
}

/// An open log view: reconstructed records, a logger multi-select and a
/// search term applied conjunctively. The term matches record messages only.
#[derive(Debug, Clone, Default)]
pub struct LogView {
    log: ReconstructedLog,
    loggers: MultiSelect,
    search: String,
    matches: Vec<LogMatch>,
    current: Option<usize>,
}

impl LogView {
    pub fn new(text: &str) -> Self {
        Self::from_log(reconstruct(text))
    }

    pub fn from_log(log: ReconstructedLog) -> Self {
        let loggers = MultiSelect::new(log.loggers.iter().cloned());
        Self {
            log,
            loggers,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.log.records
    }

    pub fn loggers(&self) -> &MultiSelect {
        &self.loggers
    }

    pub fn toggle_logger(&mut self, logger: &str) {
        self.loggers.toggle(logger);
        self.refresh_matches();
    }

    pub fn toggle_all_loggers(&mut self) {
        self.loggers.toggle_all();
        self.refresh_matches();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Replace the term; the match list is rebuilt and navigation restarts
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.refresh_matches();
    }

    /// Records without a logger fail an active logger restriction
    pub fn is_visible(&self, record: &LogRecord) -> bool {
        self.loggers.matches_one(&record.logger)
            && contains_ignore_case(&record.message, self.search.trim())
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &LogRecord> {
        self.log.records.iter().filter(|r| self.is_visible(r))
    }

    pub fn visible_count(&self) -> usize {
        self.visible_records().count()
    }

    /// Hits across visible records, in record order
    pub fn matches(&self) -> &[LogMatch] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn current(&self) -> Option<&LogMatch> {
        self.current.and_then(|i| self.matches.get(i))
    }

    /// 1-based position and total
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current.map(|i| (i + 1, self.matches.len()))
    }

    /// Advance to the next hit, wrapping after the last
    pub fn next_match(&mut self) -> Option<LogMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let idx = self.current.map_or(0, |i| (i + 1) % len);
        self.current = Some(idx);
        self.matches.get(idx).copied()
    }

    /// Step back, wrapping before the first
    pub fn previous_match(&mut self) -> Option<LogMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        let idx = self.current.map_or(len - 1, |i| (i + len - 1) % len);
        self.current = Some(idx);
        self.matches.get(idx).copied()
    }

    /// Message with search matches wrapped in `open`/`close`
    pub fn marked_message(&self, record: &LogRecord, open: &str, close: &str) -> String {
        mark(&record.message, self.search.trim(), open, close)
    }

    pub fn reset(&mut self) {
        self.loggers.reset();
        self.search.clear();
        self.refresh_matches();
    }

    fn refresh_matches(&mut self) {
        self.matches.clear();
        self.current = None;
        let term = self.search.trim();
        if term_regex(term).is_none() {
            return;
        }
        for (record, entry) in self.log.records.iter().enumerate() {
            if !self.is_visible(entry) {
                continue;
            }
            let mut offset = 0;
            for seg in highlight(&entry.message, term) {
                if seg.matched {
                    self.matches.push(LogMatch {
                        record,
                        start: offset,
                        end: offset + seg.text.len(),
                    });
                }
                offset += seg.text.len();
            }
        }
        tracing::debug!(term, matches = self.matches.len(), "log search updated");
    }
}
