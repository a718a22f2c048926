//! Filter & search engine for table rows
//!
//! Visibility is the conjunction of three independent axes:
//! status, free-text search, and component selection. Each axis is
//! vacuously true while unconstrained.

pub mod multiselect;
pub mod search;

pub use multiselect::{AllState, MultiSelect};
pub use search::{contains_ignore_case, highlight, mark, SearchMatch, Segment, TreeSearch};

use crate::{Report, TestRow, TestStatus};
use std::collections::BTreeSet;

/// Per-axis result for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMatch {
    pub status: bool,
    pub search: bool,
    pub component: bool,
}

impl AxisMatch {
    pub fn visible(self) -> bool {
        self.status && self.search && self.component
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// Active status filters; empty means all statuses
    statuses: BTreeSet<TestStatus>,
    search: String,
    components: MultiSelect,
}

impl FilterState {
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statuses: BTreeSet::new(),
            search: String::new(),
            components: MultiSelect::new(components),
        }
    }

    pub fn for_report(report: &Report) -> Self {
        Self::new(report.components())
    }

    pub fn statuses(&self) -> &BTreeSet<TestStatus> {
        &self.statuses
    }

    pub fn is_status_active(&self, status: TestStatus) -> bool {
        self.statuses.contains(&status)
    }

    pub fn toggle_status(&mut self, status: TestStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    pub fn set_status(&mut self, status: TestStatus, active: bool) {
        if active {
            self.statuses.insert(status);
        } else {
            self.statuses.remove(&status);
        }
    }

    pub fn clear_statuses(&mut self) {
        self.statuses.clear();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn components(&self) -> &MultiSelect {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut MultiSelect {
        &mut self.components
    }

    pub fn status_match(&self, row: &TestRow) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&row.status)
    }

    pub fn search_match(&self, row: &TestRow) -> bool {
        let term = self.search.trim();
        term.is_empty() || contains_ignore_case(&row.search_text(), term)
    }

    pub fn component_match(&self, row: &TestRow) -> bool {
        self.components
            .matches(row.components.iter().map(String::as_str))
    }

    pub fn axes(&self, row: &TestRow) -> AxisMatch {
        AxisMatch {
            status: self.status_match(row),
            search: self.search_match(row),
            component: self.component_match(row),
        }
    }

    pub fn is_visible(&self, row: &TestRow) -> bool {
        self.axes(row).visible()
    }

    /// True when no axis constrains anything
    pub fn is_unconstrained(&self) -> bool {
        self.statuses.is_empty() && self.search.trim().is_empty() && !self.components.is_restricted()
    }

    /// Clear every axis back to unconstrained
    pub fn reset(&mut self) {
        self.statuses.clear();
        self.search.clear();
        self.components.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(id: &str, status: TestStatus, components: &[&str]) -> TestRow {
        TestRow {
            id: id.to_string(),
            name: format!("Test {id}"),
            status,
            duration: 1.0,
            components: components.iter().map(|c| c.to_string()).collect(),
            summary: String::new(),
            details: vec![],
            logs: None,
        }
    }

    fn filters() -> FilterState {
        FilterState::new(["api", "db"])
    }

    #[test]
    fn default_state_shows_everything() {
        let f = filters();
        assert!(f.is_unconstrained());
        assert!(f.is_visible(&row("a", TestStatus::Skipped, &[])));
    }

    #[test]
    fn status_axis() {
        let mut f = filters();
        f.toggle_status(TestStatus::Failed);
        assert!(f.is_visible(&row("a", TestStatus::Failed, &[])));
        assert!(!f.is_visible(&row("b", TestStatus::Passed, &[])));
        f.toggle_status(TestStatus::Passed);
        assert!(f.is_visible(&row("b", TestStatus::Passed, &[])));
    }

    #[test]
    fn search_axis_is_case_insensitive() {
        let mut f = filters();
        f.set_search("TEST A");
        assert!(f.is_visible(&row("a", TestStatus::Passed, &[])));
        assert!(!f.is_visible(&row("b", TestStatus::Passed, &[])));
    }

    #[test]
    fn component_axis_excludes_untagged_rows_when_restricted() {
        let mut f = filters();
        f.components_mut().toggle("db");
        assert!(f.is_visible(&row("a", TestStatus::Passed, &["api"])));
        assert!(!f.is_visible(&row("b", TestStatus::Passed, &["db"])));
        assert!(!f.is_visible(&row("c", TestStatus::Passed, &[])));
    }

    #[test]
    fn reset_clears_all_axes() {
        let mut f = filters();
        f.toggle_status(TestStatus::Error);
        f.set_search("x");
        f.components_mut().toggle_all();
        f.reset();
        assert!(f.is_unconstrained());
        assert_eq!(f.components().all_state(), AllState::Checked);
    }

    fn status_strategy() -> impl Strategy<Value = TestStatus> {
        prop::sample::select(TestStatus::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn visibility_is_conjunction_of_axes(
            status in status_strategy(),
            active in prop::collection::btree_set(status_strategy(), 0..3),
            comps in prop::collection::vec(prop::sample::select(vec!["api", "db", "ui"]), 0..3),
            unchecked in prop::collection::vec(prop::sample::select(vec!["api", "db", "ui"]), 0..3),
            term in "[a-c]{0,2}",
        ) {
            let mut f = FilterState::new(["api", "db", "ui"]);
            for s in &active {
                f.toggle_status(*s);
            }
            for c in &unchecked {
                f.components_mut().toggle(c);
            }
            f.set_search(term.clone());
            let r = row("abc", status, &comps);

            let axes = f.axes(&r);
            prop_assert_eq!(f.is_visible(&r), axes.status && axes.search && axes.component);

            // Flipping the status axis leaves the other two contributions alone
            let mut g = f.clone();
            g.toggle_status(TestStatus::Passed);
            let after = g.axes(&r);
            prop_assert_eq!(after.search, axes.search);
            prop_assert_eq!(after.component, axes.component);

            // Same for the search axis
            let mut h = f.clone();
            h.set_search("zzz");
            let after = h.axes(&r);
            prop_assert_eq!(after.status, axes.status);
            prop_assert_eq!(after.component, axes.component);
        }
    }
}
