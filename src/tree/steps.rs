//! Execution Log step trees

use super::{NodeId, NodeText, Tree};
use crate::{AttachmentKind, StepNode};
use std::borrow::Cow;

/// Presentation payload of a step-tree node
#[derive(Debug, Clone, PartialEq)]
pub enum StepItem {
    Step {
        label: String,
        passed: bool,
    },
    Assertion {
        label: String,
        passed: bool,
        detail: Option<String>,
    },
    /// Inert marker; only its label is searchable
    Attachment { label: String, kind: AttachmentKind },
}

impl StepItem {
    pub fn label(&self) -> &str {
        match self {
            StepItem::Step { label, .. }
            | StepItem::Assertion { label, .. }
            | StepItem::Attachment { label, .. } => label,
        }
    }

    pub fn passed(&self) -> Option<bool> {
        match self {
            StepItem::Step { passed, .. } | StepItem::Assertion { passed, .. } => Some(*passed),
            StepItem::Attachment { .. } => None,
        }
    }
}

impl NodeText for StepItem {
    fn fragments(&self) -> Vec<Cow<'_, str>> {
        match self {
            StepItem::Assertion {
                label,
                detail: Some(detail),
                ..
            } => vec![Cow::Borrowed(label.as_str()), Cow::Borrowed(detail.as_str())],
            other => vec![Cow::Borrowed(other.label())],
        }
    }
}

/// Build the presentation tree for an Execution Log
pub fn build(steps: &[StepNode]) -> Tree<StepItem> {
    let mut tree = Tree::new();
    push_children(&mut tree, None, steps);
    tree
}

/// Push `nodes` under `parent`, then recurse into each node's own children
fn push_children(tree: &mut Tree<StepItem>, parent: Option<NodeId>, nodes: &[StepNode]) {
    for node in nodes {
        let item = match node {
            StepNode::Step { message, passed, .. } => StepItem::Step {
                label: message.clone(),
                passed: *passed,
            },
            StepNode::Assertion {
                label,
                passed,
                details,
            } => StepItem::Assertion {
                label: label.clone(),
                passed: *passed,
                detail: details.clone(),
            },
            StepNode::Attachment {
                label,
                content_type,
                ..
            } => StepItem::Attachment {
                label: label.clone(),
                kind: *content_type,
            },
        };
        let id = tree.push(parent, item);
        push_children(tree, Some(id), node.children());
    }
}
