//! Row expansion: accordion by default, multi-open with a modifier
//!
//! Pointer and keyboard activation go through the same [`ExpansionState::activate`]
//! entry point so the two can never diverge.

use serde::Serialize;
use std::collections::BTreeSet;

/// Keys a focused row reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Other,
}

impl Key {
    /// Keys that behave exactly like a pointer click
    pub fn activates(self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" | "enter" | "\n" | "\r" => Key::Enter,
            " " | "Space" | "space" | "Spacebar" => Key::Space,
            "Escape" | "escape" | "Esc" | "esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// Outcome of a key press on a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Row toggled; carries the new open state
    Toggled(bool),
    /// Escape: the caller runs the global cancel
    Cancel,
    Ignored,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpansionState {
    open: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    pub fn open_rows(&self) -> impl Iterator<Item = &str> {
        self.open.iter().map(String::as_str)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Pointer activation of a row. An open row closes. A closed row opens;
    /// without `multi` every other open row closes first.
    pub fn activate(&mut self, id: &str, multi: bool) -> bool {
        if self.open.remove(id) {
            tracing::debug!(row = id, "row closed");
            return false;
        }
        if !multi {
            self.open.clear();
        }
        self.open.insert(id.to_string());
        tracing::debug!(row = id, multi, "row opened");
        true
    }

    /// Keyboard activation; identical to [`activate`](Self::activate) for
    /// Enter and Space, modifier included
    pub fn key(&mut self, id: &str, key: Key, multi: bool) -> KeyOutcome {
        match key {
            k if k.activates() => KeyOutcome::Toggled(self.activate(id, multi)),
            Key::Escape => KeyOutcome::Cancel,
            _ => KeyOutcome::Ignored,
        }
    }

    /// Open a row without toggling; an already open row stays open and,
    /// without `multi`, so do the others. Returns whether anything changed.
    pub fn open(&mut self, id: &str, multi: bool) -> bool {
        !self.is_open(id) && self.activate(id, multi)
    }

    pub fn close(&mut self, id: &str) -> bool {
        self.open.remove(id)
    }

    /// Close every open row; returns how many were open
    pub fn close_all(&mut self) -> usize {
        let n = self.open.len();
        self.open.clear();
        n
    }
}
