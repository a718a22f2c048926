//! Multi-select list with a derived tri-state "all" control
//!
//! Used for both the component filter (table) and the logger filter (log
//! view). The item set is authoritative; the "all" control's checked and
//! indeterminate flags are recomputed from it after every change.

use super::search::contains_ignore_case;
use serde::Serialize;
use std::collections::BTreeSet;

/// Display state of the "all" checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl AllState {
    pub fn checked(self) -> bool {
        self == AllState::Checked
    }

    pub fn indeterminate(self) -> bool {
        self == AllState::Indeterminate
    }
}

#[derive(Debug, Clone, Default)]
pub struct MultiSelect {
    /// Items in display order
    items: Vec<String>,
    checked: BTreeSet<String>,
    /// Companion text filter over the visible item list
    query: String,
}

impl MultiSelect {
    /// New selector with every item checked (unconstrained)
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let items: Vec<String> = items
            .into_iter()
            .map(Into::into)
            .filter(|i| seen.insert(i.clone()))
            .collect();
        let checked = items.iter().cloned().collect();
        Self {
            items,
            checked,
            query: String::new(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn is_checked(&self, item: &str) -> bool {
        self.checked.contains(item)
    }

    pub fn checked_items(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(|i| self.checked.contains(*i))
            .map(String::as_str)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Flip one item. Unknown items are ignored.
    pub fn toggle(&mut self, item: &str) {
        if !self.items.iter().any(|i| i == item) {
            return;
        }
        if !self.checked.remove(item) {
            self.checked.insert(item.to_string());
        }
    }

    /// Activate the "all" control: checks everything unless everything is
    /// already checked, in which case it clears the selection.
    pub fn toggle_all(&mut self) {
        let check = !self.all_state().checked();
        self.set_all(check);
    }

    pub fn set_all(&mut self, checked: bool) {
        if checked {
            self.checked = self.items.iter().cloned().collect();
        } else {
            self.checked.clear();
        }
    }

    /// Derived state of the "all" control
    pub fn all_state(&self) -> AllState {
        let n = self.checked.len();
        if n == self.items.len() {
            AllState::Checked
        } else if n == 0 {
            AllState::Unchecked
        } else {
            AllState::Indeterminate
        }
    }

    /// True when some item is unchecked, i.e. the axis constrains rows
    pub fn is_restricted(&self) -> bool {
        !self.all_state().checked()
    }

    /// Axis match for a row carrying `tags`. A row with no tags never matches
    /// an active restriction.
    pub fn matches<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if !self.is_restricted() {
            return true;
        }
        tags.into_iter().any(|t| self.checked.contains(t))
    }

    /// Single-value form of [`matches`](Self::matches); empty means "no tag"
    pub fn matches_one(&self, tag: &str) -> bool {
        if tag.is_empty() {
            return !self.is_restricted();
        }
        self.matches(std::iter::once(tag))
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Narrow the visible item list; checked state is untouched
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Items shown in the menu under the current query
    pub fn visible_items(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .map(String::as_str)
            .filter(|i| contains_ignore_case(i, &self.query))
    }

    /// Back to everything checked and no query
    pub fn reset(&mut self) {
        self.set_all(true);
        self.query.clear();
    }
}
