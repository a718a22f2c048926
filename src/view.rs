//! Render pass: reconcile what the table shows from report + session state

use crate::filter::AllState;
use crate::session::{FilterMenu, SessionState};
use crate::sort::SortState;
use crate::{Report, TestStatus};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub id: String,
    pub name: String,
    pub status: TestStatus,
    pub duration: f64,
    pub components: Vec<String>,
    pub visible: bool,
    pub open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: TestStatus,
    pub visible: usize,
    pub total: usize,
    /// Status filter chip is active
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSummary {
    pub statuses: Vec<TestStatus>,
    pub search: String,
    pub components: Vec<String>,
    pub all_components: AllState,
    pub menu: Option<FilterMenu>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub title: Option<String>,
    /// Every row in display order, hidden ones flagged
    pub rows: Vec<RowView>,
    /// Only statuses present in the report
    pub counts: Vec<StatusCount>,
    pub visible: usize,
    pub total: usize,
    pub sort: SortState,
    pub filters: FilterSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modal: Option<String>,
}

impl ReportView {
    /// Read-only over both inputs
    pub fn reconcile(report: &Report, session: &SessionState) -> Self {
        let filters = &session.filters;
        let rows: Vec<RowView> = session
            .sort
            .order()
            .iter()
            .filter_map(|i| report.tests.get(*i))
            .map(|row| RowView {
                id: row.id.clone(),
                name: row.name.clone(),
                status: row.status,
                duration: row.duration,
                components: row.components.clone(),
                visible: filters.is_visible(row),
                open: session.expansion.is_open(&row.id),
            })
            .collect();

        let counts = TestStatus::ALL
            .into_iter()
            .filter_map(|status| {
                let total = rows.iter().filter(|r| r.status == status).count();
                (total > 0).then(|| StatusCount {
                    status,
                    visible: rows.iter().filter(|r| r.status == status && r.visible).count(),
                    total,
                    active: filters.is_status_active(status),
                })
            })
            .collect();

        let components = filters.components();
        Self {
            title: report.title.clone(),
            visible: rows.iter().filter(|r| r.visible).count(),
            total: rows.len(),
            rows,
            counts,
            sort: session.sort.state(),
            filters: FilterSummary {
                statuses: filters.statuses().iter().copied().collect(),
                search: filters.search().to_string(),
                components: components.checked_items().map(str::to_string).collect(),
                all_components: components.all_state(),
                menu: session.menu,
            },
            modal: session
                .modal
                .as_ref()
                .map(|m| format!("{} / {}", m.test, m.title)),
        }
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &RowView> {
        self.rows.iter().filter(|r| r.visible)
    }
}
