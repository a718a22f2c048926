//! Flattened rendering of a tree for display

use super::json::{JsonKey, JsonNode};
use super::steps::StepItem;
use super::{NodeId, Tree};
use serde::Serialize;

/// Display text of a single node, independent of its expansion state
pub trait NodeLabel {
    fn label_text(&self, expanded: Option<bool>) -> String;
}

impl NodeLabel for JsonNode {
    fn label_text(&self, expanded: Option<bool>) -> String {
        let value = match (expanded, &self.token) {
            (Some(true), t) if t.is_container() => {
                if matches!(t, super::JsonToken::Array { .. }) {
                    "[".to_string()
                } else {
                    "{".to_string()
                }
            }
            (_, t) => t.display().into_owned(),
        };
        match &self.key {
            Some(JsonKey::Name(name)) => format!("{name}: {value}"),
            Some(JsonKey::Index(i)) => format!("{i}: {value}"),
            None => value,
        }
    }
}

impl NodeLabel for StepItem {
    fn label_text(&self, _expanded: Option<bool>) -> String {
        match self {
            StepItem::Step { label, passed } | StepItem::Assertion { label, passed, .. } => {
                format!("{} {}", status_glyph(*passed), label)
            }
            StepItem::Attachment { label, .. } => format!("@ {label}"),
        }
    }
}

/// Pass/fail glyph shared by the renderer and the export formatter
pub fn status_glyph(passed: bool) -> &'static str {
    if passed {
        "✓"
    } else {
        "✗"
    }
}

/// One rendered node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLine {
    pub node: usize,
    pub depth: usize,
    pub text: String,
    /// Toggle control state; `None` means no control is rendered
    pub toggle: Option<bool>,
    /// Under a collapsed ancestor
    pub hidden: bool,
}

/// Flatten the tree in document order. Hidden nodes are kept (flagged) so
/// search can still reach them.
pub fn render_lines<T: NodeLabel>(tree: &Tree<T>) -> Vec<RenderedLine> {
    let mut out = Vec::with_capacity(tree.len());
    // (node, depth, hidden)
    let mut stack: Vec<(NodeId, usize, bool)> =
        tree.roots().iter().rev().map(|r| (*r, 0, false)).collect();
    while let Some((id, depth, hidden)) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        out.push(RenderedLine {
            node: id.index(),
            depth,
            text: node.payload.label_text(node.expanded()),
            toggle: node.expanded(),
            hidden,
        });
        let child_hidden = hidden || node.expanded() == Some(false);
        stack.extend(
            node.children()
                .iter()
                .rev()
                .map(|c| (*c, depth + 1, child_hidden)),
        );
    }
    out
}

/// Plain-text rendering of visible lines with toggle markers
pub fn render_text<T: NodeLabel>(tree: &Tree<T>) -> String {
    let mut text = String::new();
    for line in render_lines(tree).into_iter().filter(|l| !l.hidden) {
        let marker = match line.toggle {
            Some(true) => "▾ ",
            Some(false) => "▸ ",
            None => "  ",
        };
        text.push_str(&"  ".repeat(line.depth));
        text.push_str(marker);
        text.push_str(&line.text);
        text.push('\n');
    }
    text
}
