//! Lazily-collapsible tree model
//!
//! A parent-owns-children arena shared by JSON attachment trees and Execution
//! Log step trees. Every node stores only its own direct child list, and every
//! traversal descends through those lists, so a node never processes a list
//! belonging to another branch.
//!
//! A node with at least one child is *collapsible* and carries exactly one
//! `expanded` flag (default `true`). Leaves, including empty arrays and objects,
//! carry none.

pub mod json;
pub mod render;
pub mod steps;

pub use json::{JsonKey, JsonNode, JsonToken};
pub use render::{render_lines, render_text, status_glyph, NodeLabel, RenderedLine};
pub use steps::StepItem;

use std::borrow::Cow;

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Searchable text carried by a node payload
pub trait NodeText {
    /// Text fragments in on-screen order (e.g. key then value)
    fn fragments(&self) -> Vec<Cow<'_, str>>;
}

#[derive(Debug, Clone)]
pub struct Node<T> {
    pub payload: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: Option<bool>,
}

impl<T> Node<T> {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_collapsible(&self) -> bool {
        self.expanded.is_some()
    }

    /// The toggle flag; `None` for leaves
    pub fn expanded(&self) -> Option<bool> {
        self.expanded
    }
}

#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
    roots: Vec<NodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as a new root). Giving a node its
    /// first child makes it collapsible, expanded.
    pub fn push(&mut self, parent: Option<NodeId>, payload: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            payload,
            parent,
            children: Vec::new(),
            expanded: None,
        });
        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(p) => {
                p.children.push(id);
                p.expanded.get_or_insert(true);
            }
            None => self.roots.push(id),
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Id of the node at `index` (as reported in [`RenderedLine::node`])
    pub fn id_at(&self, index: usize) -> Option<NodeId> {
        (index < self.nodes.len()).then_some(NodeId(index))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        self.nodes.get(id.0)
    }

    pub fn payload(&self, id: NodeId) -> Option<&T> {
        self.get(id).map(|n| &n.payload)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_expanded(&self, id: NodeId) -> Option<bool> {
        self.get(id).and_then(|n| n.expanded)
    }

    /// Flip a node's flag. Returns the new value, or `None` for leaves and
    /// unknown ids (nothing changes).
    pub fn toggle(&mut self, id: NodeId) -> Option<bool> {
        let node = self.nodes.get_mut(id.0)?;
        let flag = node.expanded.as_mut()?;
        *flag = !*flag;
        Some(*flag)
    }

    /// Set a single node's flag; leaves are ignored
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        if let Some(flag) = self.nodes.get_mut(id.0).and_then(|n| n.expanded.as_mut()) {
            *flag = expanded;
        }
    }

    /// Set every collapsible node under `root` (inclusive) to `expanded`
    pub fn set_all(&mut self, root: NodeId, expanded: bool) -> usize {
        let mut changed = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id.0) else {
                continue;
            };
            if let Some(flag) = node.expanded.as_mut() {
                if *flag != expanded {
                    *flag = expanded;
                    changed += 1;
                }
            }
            stack.extend(node.children.iter().copied());
        }
        changed
    }

    pub fn expand_all(&mut self, root: NodeId) -> usize {
        self.set_all(root, true)
    }

    pub fn collapse_all(&mut self, root: NodeId) -> usize {
        self.set_all(root, false)
    }

    /// Bulk operation over every root
    pub fn set_all_roots(&mut self, expanded: bool) -> usize {
        let roots = self.roots.clone();
        roots.into_iter().map(|r| self.set_all(r, expanded)).sum()
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent),
        }
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// True if some ancestor is collapsed
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .any(|a| self.is_expanded(a) == Some(false))
    }

    /// Expand every collapsed ancestor so `id` becomes visible
    pub fn reveal(&mut self, id: NodeId) -> usize {
        let collapsed: Vec<NodeId> = self
            .ancestors(id)
            .filter(|a| self.is_expanded(*a) == Some(false))
            .collect();
        for a in &collapsed {
            self.set_expanded(*a, true);
        }
        collapsed.len()
    }

    /// Pre-order (document order) walk of the whole forest, collapsed
    /// subtrees included
    pub fn walk(&self) -> Walk<'_, T> {
        let mut stack: Vec<NodeId> = self.roots.clone();
        stack.reverse();
        Walk { tree: self, stack }
    }

    /// Pre-order walk of one subtree, `root` first
    pub fn walk_from(&self, root: NodeId) -> Walk<'_, T> {
        let stack = if self.get(root).is_some() {
            vec![root]
        } else {
            Vec::new()
        };
        Walk { tree: self, stack }
    }

    /// Every collapsible node under `root`, inclusive
    pub fn collapsible_under(&self, root: NodeId) -> Vec<NodeId> {
        self.walk_from(root)
            .filter(|id| self.get(*id).is_some_and(Node::is_collapsible))
            .collect()
    }
}

pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|n| n.parent);
        Some(id)
    }
}

pub struct Walk<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<T> Iterator for Walk<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.tree.children(id);
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root
    ///   a
    ///     a1
    ///   b
    fn sample() -> (Tree<&'static str>, [NodeId; 4]) {
        let mut t = Tree::new();
        let root = t.push(None, "root");
        let a = t.push(Some(root), "a");
        let a1 = t.push(Some(a), "a1");
        let b = t.push(Some(root), "b");
        (t, [root, a, a1, b])
    }

    #[test]
    fn collapsible_only_with_children() {
        let (t, [root, a, a1, b]) = sample();
        assert_eq!(t.is_expanded(root), Some(true));
        assert_eq!(t.is_expanded(a), Some(true));
        assert_eq!(t.is_expanded(a1), None);
        assert_eq!(t.is_expanded(b), None);
    }

    #[test]
    fn toggle_is_local() {
        let (mut t, [root, a, _, _]) = sample();
        assert_eq!(t.toggle(a), Some(false));
        assert_eq!(t.is_expanded(root), Some(true));
        assert_eq!(t.toggle(a), Some(true));
    }

    #[test]
    fn toggle_leaf_is_noop() {
        let (mut t, [_, _, a1, _]) = sample();
        assert_eq!(t.toggle(a1), None);
        assert_eq!(t.is_expanded(a1), None);
    }

    #[test]
    fn expand_all_then_collapse_all() {
        let (mut t, [root, a, _, _]) = sample();
        t.toggle(a);
        t.expand_all(root);
        assert!(t.collapsible_under(root).iter().all(|n| t.is_expanded(*n) == Some(true)));
        t.collapse_all(root);
        assert!(t.collapsible_under(root).iter().all(|n| t.is_expanded(*n) == Some(false)));
    }

    #[test]
    fn walk_is_document_order_including_collapsed() {
        let (mut t, [root, a, a1, b]) = sample();
        t.collapse_all(root);
        let order: Vec<_> = t.walk().collect();
        assert_eq!(order, vec![root, a, a1, b]);
    }

    #[test]
    fn reveal_expands_only_ancestors() {
        let (mut t, [root, a, a1, _]) = sample();
        t.collapse_all(root);
        assert!(t.is_hidden(a1));
        assert_eq!(t.reveal(a1), 2);
        assert!(!t.is_hidden(a1));
        assert_eq!(t.is_expanded(a), Some(true));
    }

    #[test]
    fn depth_counts_ancestors() {
        let (t, [root, a, a1, _]) = sample();
        assert_eq!(t.depth(root), 0);
        assert_eq!(t.depth(a), 1);
        assert_eq!(t.depth(a1), 2);
    }

    #[test]
    fn subtree_walk_stays_in_branch() {
        let (t, [_, a, a1, _]) = sample();
        let order: Vec<_> = t.walk_from(a).collect();
        assert_eq!(order, vec![a, a1]);
    }
}
