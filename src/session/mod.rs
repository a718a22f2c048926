//! Session state and the intent dispatcher
//!
//! Every user interaction is an [`Intent`]. [`SessionState::apply`] is the one
//! place state changes; rendering reads the result through
//! [`ReportView::reconcile`](crate::view::ReportView::reconcile).

mod modal;

pub use modal::{JsonView, Modal, ModalTarget, ModalView, StepView, TreeView};

use crate::expansion::{ExpansionState, Key, KeyOutcome};
use crate::export::{Clipboard, CopyFeedback, ExportFormatter};
use crate::filter::FilterState;
use crate::preferences::PreferenceStore;
use crate::sort::{SortColumn, SortController, SortState};
use crate::view::ReportView;
use crate::{Report, Result, TestStatus};
use serde::Serialize;
use std::time::Instant;

/// Which filter dropdown is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMenu {
    Status,
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ToggleRow { id: String, multi: bool },
    /// Open a row without toggling it closed when already open
    OpenRow { id: String, multi: bool },
    RowKey { id: String, key: Key, multi: bool },
    ToggleStatus(TestStatus),
    ClearStatuses,
    SetSearch(String),
    ToggleComponent(String),
    ToggleAllComponents,
    SetComponentQuery(String),
    OpenFilterMenu(FilterMenu),
    CloseFilterMenu,
    ClickSort(SortColumn),
    OpenModal { test: String, target: ModalTarget },
    CloseModal,
    /// Search inside the open modal
    ModalSearch(String),
    ModalNextMatch,
    ModalPreviousMatch,
    /// Toggle a node of the open tree modal by node index
    /// ([`RenderedLine::node`](crate::tree::RenderedLine::node))
    ModalToggleNode(usize),
    ModalExpandAll,
    ModalCollapseAll,
    ToggleLogger(String),
    ToggleAllLoggers,
    Cancel,
}

/// What an intent changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Rows,
    Filters,
    Sort(SortState),
    Menu,
    Modal,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub filters: FilterState,
    pub sort: SortController,
    pub expansion: ExpansionState,
    pub modal: Option<Modal>,
    pub menu: Option<FilterMenu>,
}

impl SessionState {
    /// Default state for a freshly loaded report
    pub fn new(report: &Report) -> Self {
        Self {
            filters: FilterState::for_report(report),
            sort: SortController::new(report.tests.len()),
            expansion: ExpansionState::new(),
            modal: None,
            menu: None,
        }
    }

    /// Apply one intent. Targets that do not exist (unknown rows, no open
    /// modal) leave the state untouched.
    pub fn apply(&mut self, report: &Report, intent: Intent) -> Transition {
        tracing::debug!(?intent, "dispatch");
        match intent {
            Intent::ToggleRow { id, multi } => {
                if report.row(&id).is_none() {
                    return Transition::Unchanged;
                }
                self.expansion.activate(&id, multi);
                Transition::Rows
            }
            Intent::OpenRow { id, multi } => {
                if report.row(&id).is_none() || !self.expansion.open(&id, multi) {
                    return Transition::Unchanged;
                }
                Transition::Rows
            }
            Intent::RowKey { id, key, multi } => {
                if key == Key::Escape {
                    return self.cancel();
                }
                if report.row(&id).is_none() {
                    return Transition::Unchanged;
                }
                match self.expansion.key(&id, key, multi) {
                    KeyOutcome::Toggled(_) => Transition::Rows,
                    KeyOutcome::Cancel => self.cancel(),
                    KeyOutcome::Ignored => Transition::Unchanged,
                }
            }
            Intent::ToggleStatus(status) => {
                self.filters.toggle_status(status);
                Transition::Filters
            }
            Intent::ClearStatuses => {
                self.filters.clear_statuses();
                Transition::Filters
            }
            Intent::SetSearch(term) => {
                self.filters.set_search(term);
                Transition::Filters
            }
            Intent::ToggleComponent(component) => {
                self.filters.components_mut().toggle(&component);
                Transition::Filters
            }
            Intent::ToggleAllComponents => {
                self.filters.components_mut().toggle_all();
                Transition::Filters
            }
            Intent::SetComponentQuery(query) => {
                self.filters.components_mut().set_query(query);
                Transition::Menu
            }
            Intent::OpenFilterMenu(menu) => {
                self.menu = Some(menu);
                Transition::Menu
            }
            Intent::CloseFilterMenu => {
                if self.menu.take().is_none() {
                    return Transition::Unchanged;
                }
                Transition::Menu
            }
            Intent::ClickSort(column) => Transition::Sort(self.sort.click(column, &report.tests)),
            Intent::OpenModal { test, target } => {
                let Some(modal) = report.row(&test).and_then(|row| Modal::open(row, &target)) else {
                    tracing::debug!(test = %test, ?target, "nothing to open");
                    return Transition::Unchanged;
                };
                self.modal = Some(modal);
                Transition::Modal
            }
            Intent::CloseModal => {
                if self.modal.take().is_none() {
                    return Transition::Unchanged;
                }
                Transition::Modal
            }
            Intent::ModalSearch(term) => self.with_modal(|view| {
                view.set_search(&term);
                true
            }),
            Intent::ModalNextMatch => self.with_modal(|view| match view {
                ModalView::Json(v) => v.next_match().is_some(),
                ModalView::Steps(v) => v.next_match().is_some(),
                ModalView::Logs(v) => v.next_match().is_some(),
                ModalView::Text(_) | ModalView::Image(_) => false,
            }),
            Intent::ModalPreviousMatch => self.with_modal(|view| match view {
                ModalView::Json(v) => v.previous_match().is_some(),
                ModalView::Steps(v) => v.previous_match().is_some(),
                ModalView::Logs(v) => v.previous_match().is_some(),
                ModalView::Text(_) | ModalView::Image(_) => false,
            }),
            Intent::ModalToggleNode(index) => self.with_modal(|view| match view {
                ModalView::Json(v) => v.toggle(index).is_some(),
                ModalView::Steps(v) => v.toggle(index).is_some(),
                _ => false,
            }),
            Intent::ModalExpandAll => self.with_modal(|view| match view {
                ModalView::Json(v) => v.expand_all() > 0,
                ModalView::Steps(v) => v.expand_all() > 0,
                _ => false,
            }),
            Intent::ModalCollapseAll => self.with_modal(|view| match view {
                ModalView::Json(v) => v.collapse_all() > 0,
                ModalView::Steps(v) => v.collapse_all() > 0,
                _ => false,
            }),
            Intent::ToggleLogger(logger) => self.with_modal(|view| match view {
                ModalView::Logs(v) => {
                    v.toggle_logger(&logger);
                    true
                }
                _ => false,
            }),
            Intent::ToggleAllLoggers => self.with_modal(|view| match view {
                ModalView::Logs(v) => {
                    v.toggle_all_loggers();
                    true
                }
                _ => false,
            }),
            Intent::Cancel => self.cancel(),
        }
    }

    /// Run `f` on the open modal; `f` reports whether the view changed
    fn with_modal(&mut self, f: impl FnOnce(&mut ModalView) -> bool) -> Transition {
        match self.modal.as_mut() {
            Some(modal) => {
                if f(&mut modal.view) {
                    Transition::Modal
                } else {
                    Transition::Unchanged
                }
            }
            None => Transition::Unchanged,
        }
    }

    /// Collapse everything in one step: open rows, all filter axes, the
    /// modal and the filter menu. Sort order is kept.
    pub fn cancel(&mut self) -> Transition {
        let closed = self.expansion.close_all();
        self.filters.reset();
        self.modal = None;
        self.menu = None;
        tracing::debug!(closed, "session cancelled");
        Transition::Cancelled
    }

    /// True when every cancel-able sub-state is at its default
    pub fn is_quiescent(&self) -> bool {
        self.expansion.open_count() == 0
            && self.filters.is_unconstrained()
            && self.modal.is_none()
            && self.menu.is_none()
    }
}

/// A loaded report together with its interactive session
#[derive(Debug)]
pub struct ReportEngine {
    report: Report,
    session: SessionState,
    prefs: PreferenceStore,
    formatter: ExportFormatter,
    feedback: CopyFeedback,
}

impl ReportEngine {
    pub fn new(report: Report, prefs: PreferenceStore) -> Self {
        let session = SessionState::new(&report);
        Self {
            report,
            session,
            prefs,
            formatter: ExportFormatter::default(),
            feedback: CopyFeedback::default(),
        }
    }

    pub fn with_formatter(mut self, formatter: ExportFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_feedback(mut self, feedback: CopyFeedback) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn preferences_mut(&mut self) -> &mut PreferenceStore {
        &mut self.prefs
    }

    pub fn formatter(&self) -> &ExportFormatter {
        &self.formatter
    }

    pub fn feedback(&self) -> &CopyFeedback {
        &self.feedback
    }

    pub fn dispatch(&mut self, intent: Intent) -> Transition {
        self.session.apply(&self.report, intent)
    }

    /// Jump straight to a sort state (initial sort from config or flags)
    pub fn set_sort(&mut self, state: SortState) -> Transition {
        self.session.sort.apply(state, &self.report.tests);
        Transition::Sort(self.session.sort.state())
    }

    pub fn view(&self) -> ReportView {
        ReportView::reconcile(&self.report, &self.session)
    }

    /// Plain text of a row's detail panel
    pub fn export_detail(&self, id: &str) -> Result<String> {
        let row = self.report.require_row(id)?;
        Ok(self.formatter.export_detail(row))
    }

    /// Plain text of a row's logs. When that row's log modal is open its
    /// logger and search filters apply.
    pub fn export_logs(&self, id: &str) -> Result<String> {
        let row = self.report.require_row(id)?;
        if let Some(Modal {
            test,
            view: ModalView::Logs(view),
            ..
        }) = &self.session.modal
        {
            if test == id {
                return Ok(self.formatter.export_log_view(view));
            }
        }
        let log = crate::logs::reconstruct(row.log_text().unwrap_or_default());
        Ok(self.formatter.export_logs(&log.records))
    }

    /// Copy a detail panel. `Ok(false)` when the clipboard refused.
    pub fn copy_detail(&mut self, id: &str, clipboard: &mut dyn Clipboard, now: Instant) -> Result<bool> {
        let text = self.export_detail(id)?;
        self.feedback.sweep(now);
        Ok(self
            .feedback
            .copy(clipboard, &copy_control("detail", id), &text, now))
    }

    pub fn copy_logs(&mut self, id: &str, clipboard: &mut dyn Clipboard, now: Instant) -> Result<bool> {
        let text = self.export_logs(id)?;
        self.feedback.sweep(now);
        Ok(self
            .feedback
            .copy(clipboard, &copy_control("logs", id), &text, now))
    }

    /// Whether the copy control for `what` ("detail" or "logs") on `id` is
    /// still showing its confirmation
    pub fn is_confirming(&self, what: &str, id: &str, now: Instant) -> bool {
        self.feedback.is_confirming(&copy_control(what, id), now)
    }

    pub fn open_attachment(&mut self, test: &str, target: ModalTarget) -> Option<&Modal> {
        self.dispatch(Intent::OpenModal {
            test: test.to_string(),
            target,
        });
        self.session.modal.as_ref()
    }
}

fn copy_control(what: &str, id: &str) -> String {
    format!("copy-{what}:{id}")
}
