//! Console reporter with colored output

use crate::filter::highlight;
use crate::logs::{LogLevel, LogView};
use crate::preferences::ResolvedTheme;
use crate::session::ReportEngine;
use crate::sort::SortColumn;
use crate::tree::RenderedLine;
use crate::view::{ReportView, RowView};
use crate::TestStatus;
use colored::{ColoredString, Colorize};

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
    theme: ResolvedTheme,
}

impl ConsoleReporter {
    pub fn new(theme: ResolvedTheme) -> Self {
        Self {
            use_colors: true,
            verbose: false,
            theme,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output (hidden rows are listed too)
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    pub fn report(&self, engine: &ReportEngine) {
        print!("{}", self.render(engine));
    }

    /// Table plus the detail panel of every open row
    pub fn render(&self, engine: &ReportEngine) -> String {
        let view = engine.view();
        let mut out = String::new();
        out.push_str(&self.render_header(&view));
        for row in &view.rows {
            if !row.visible && !self.verbose {
                continue;
            }
            out.push_str(&self.render_row(row));
            if row.open {
                if let Ok(detail) = engine.export_detail(&row.id) {
                    for line in detail.lines() {
                        out.push_str(&format!("      {line}\n"));
                    }
                }
            }
        }
        out.push_str(&self.render_footer(&view));
        out
    }

    /// One line per row: `name  status  duration`
    pub fn render_quiet(&self, view: &ReportView) -> String {
        view.visible_rows()
            .map(|r| format!("{}: {} ({:.2}s)\n", r.name, self.status(r.status), r.duration))
            .collect()
    }

    fn render_header(&self, view: &ReportView) -> String {
        let mut out = String::new();
        let title = view.title.as_deref().unwrap_or("Test Report");
        out.push_str(&format!("\n{}\n", self.bold(title)));

        let counts: Vec<String> = view
            .counts
            .iter()
            .map(|c| {
                let label = format!("{} {}/{}", c.status, c.visible, c.total);
                if c.active {
                    self.bold(&label).to_string()
                } else {
                    self.status_text(c.status, &label).to_string()
                }
            })
            .collect();
        out.push_str(&format!("   {}\n", counts.join(" | ")));

        let mut filters = Vec::new();
        if !view.filters.search.is_empty() {
            filters.push(format!("search \"{}\"", view.filters.search));
        }
        if !view.filters.all_components.checked() {
            filters.push(format!("components [{}]", view.filters.components.join(", ")));
        }
        if !filters.is_empty() {
            out.push_str(&format!("   {} {}\n", self.muted("filters:"), filters.join(", ")));
        }

        out.push_str(&format!(
            "\n   {:<40} {:<9} {:>9}\n",
            self.column("Name", SortColumn::Name, view),
            self.column("Status", SortColumn::Status, view),
            self.column("Duration", SortColumn::Duration, view),
        ));
        out
    }

    fn column(&self, label: &str, column: SortColumn, view: &ReportView) -> String {
        if view.sort.column == Some(column) {
            format!("{label} {}", view.sort.direction.arrow())
        } else {
            label.to_string()
        }
    }

    fn render_row(&self, row: &RowView) -> String {
        let marker = if row.open { "▾" } else { "▸" };
        let name = if row.visible {
            row.name.clone()
        } else {
            self.muted(&row.name).to_string()
        };
        let mut line = format!(
            "   {marker} {:<38} {:<9} {:>8.2}s",
            name,
            self.status(row.status),
            row.duration
        );
        if !row.components.is_empty() {
            line.push_str(&format!("  {}", self.muted(&row.components.join(","))));
        }
        line.push('\n');
        line
    }

    fn render_footer(&self, view: &ReportView) -> String {
        let mut out = format!(
            "\n   {} of {} tests shown\n",
            self.bold(&view.visible.to_string()),
            view.total
        );
        if let Some(modal) = &view.modal {
            out.push_str(&format!("   {} {}\n", self.muted("open:"), modal));
        }
        out
    }

    /// Log table with level colors and search highlights
    pub fn render_logs(&self, view: &LogView) -> String {
        let mut out = String::new();
        for record in view.visible_records() {
            let level = self.level(record.level);
            let logger = if record.logger.is_empty() {
                String::new()
            } else {
                format!(" {}", self.muted(&record.logger))
            };
            let mut lines = record.message.lines();
            let first = lines.next().unwrap_or_default();
            out.push_str(&format!(
                "{:<8}{} {}\n",
                level,
                logger,
                self.highlighted(first, view.search())
            ));
            for cont in lines {
                out.push_str(&format!("        {}\n", self.highlighted(cont, view.search())));
            }
        }
        let shown = view.visible_count();
        let total = view.records().len();
        out.push_str(&format!("\n{}\n", self.muted(&format!("{shown} of {total} records"))));
        out
    }

    /// Visible tree lines with toggle markers; `term` matches are highlighted
    pub fn render_tree(&self, lines: &[RenderedLine], term: &str) -> String {
        let mut out = String::new();
        for line in lines.iter().filter(|l| !l.hidden) {
            let marker = match line.toggle {
                Some(true) => "▾ ",
                Some(false) => "▸ ",
                None => "  ",
            };
            out.push_str(&"  ".repeat(line.depth));
            out.push_str(marker);
            out.push_str(&self.highlighted(&line.text, term));
            out.push('\n');
        }
        out
    }

    fn highlighted(&self, text: &str, term: &str) -> String {
        highlight(text, term.trim())
            .into_iter()
            .map(|seg| {
                if !seg.matched {
                    seg.text.to_string()
                } else if self.use_colors {
                    match self.theme {
                        ResolvedTheme::Dark => seg.text.black().on_yellow().to_string(),
                        ResolvedTheme::Light => seg.text.on_bright_yellow().bold().to_string(),
                    }
                } else {
                    format!("[{}]", seg.text)
                }
            })
            .collect()
    }

    fn status(&self, status: TestStatus) -> ColoredString {
        self.status_text(status, status.as_str())
    }

    fn status_text(&self, status: TestStatus, text: &str) -> ColoredString {
        if !self.use_colors {
            return text.normal();
        }
        match status {
            TestStatus::Passed => text.green(),
            TestStatus::Failed => text.red().bold(),
            TestStatus::Error => text.red(),
            TestStatus::Skipped => text.yellow(),
            TestStatus::Xfailed => text.cyan(),
            TestStatus::Xpassed => text.magenta(),
        }
    }

    fn level(&self, level: LogLevel) -> ColoredString {
        let s = level.as_str();
        if !self.use_colors {
            return s.normal();
        }
        match level {
            LogLevel::Debug => s.dimmed(),
            LogLevel::Info => s.blue(),
            LogLevel::Warning => s.yellow(),
            LogLevel::Error => s.red(),
            LogLevel::Critical => s.red().bold(),
        }
    }

    fn bold(&self, s: &str) -> ColoredString {
        if self.use_colors {
            s.bold()
        } else {
            s.normal()
        }
    }

    fn muted(&self, s: &str) -> ColoredString {
        if !self.use_colors {
            return s.normal();
        }
        match self.theme {
            ResolvedTheme::Dark => s.dimmed(),
            ResolvedTheme::Light => s.bright_black(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(ResolvedTheme::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PreferenceStore;
    use crate::session::Intent;
    use crate::Report;

    fn engine() -> ReportEngine {
        let report = Report::from_json(
            r#"{"title": "nightly", "tests": [
                {"id": "a", "name": "login works", "status": "passed", "duration": 0.3,
                 "details": [{"key": "Reason", "value": {"kind": "text", "text": "ok"}}]},
                {"id": "b", "name": "logout", "status": "failed", "duration": 1.2, "components": ["auth"]}
            ]}"#,
        )
        .unwrap();
        ReportEngine::new(report, PreferenceStore::in_memory(ResolvedTheme::Dark))
    }

    #[test]
    fn renders_visible_rows_and_open_details() {
        let mut e = engine();
        e.dispatch(Intent::ToggleRow { id: "a".into(), multi: false });
        let out = ConsoleReporter::default().without_colors().render(&e);
        assert!(out.contains("nightly"));
        assert!(out.contains("▾ login works"));
        assert!(out.contains("Reason: ok"));
        assert!(out.contains("2 of 2 tests shown"));
    }

    #[test]
    fn hidden_rows_only_in_verbose() {
        let mut e = engine();
        e.dispatch(Intent::ToggleStatus(TestStatus::Failed));
        let plain = ConsoleReporter::default().without_colors();
        assert!(!plain.render(&e).contains("login works"));
        let verbose = ConsoleReporter::default().without_colors().verbose();
        assert!(verbose.render(&e).contains("login works"));
    }

    #[test]
    fn sort_arrow_in_header() {
        let mut e = engine();
        e.dispatch(Intent::ClickSort(SortColumn::Duration));
        let out = ConsoleReporter::default().without_colors().render(&e);
        assert!(out.contains("Duration ▼"));
    }

    #[test]
    fn plain_highlight_markers() {
        let mut view = LogView::new("INFO app:a.py:1 hello world");
        view.set_search("world");
        let out = ConsoleReporter::default().without_colors().render_logs(&view);
        assert!(out.contains("hello [world]"));
        assert!(out.contains("1 of 1 records"));
    }
}
