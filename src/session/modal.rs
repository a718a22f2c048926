//! Modal overlays opened from a detail panel

use crate::filter::{SearchMatch, TreeSearch};
use crate::logs::LogView;
use crate::tree::{json, render_lines, render_text, steps, JsonNode, NodeLabel, NodeText};
use crate::tree::{RenderedLine, StepItem, Tree};
use crate::{AttachmentKind, DetailValue, StepNode, TestRow};

/// What a modal is opened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalTarget {
    /// A detail entry by key
    Detail(String),
    /// An attachment marker inside the Execution Log, by label
    Attachment(String),
    /// The row's raw log blob
    Logs,
}

/// A collapsible tree with incremental search
#[derive(Debug, Clone)]
pub struct TreeView<T> {
    tree: Tree<T>,
    search: TreeSearch,
}

pub type JsonView = TreeView<JsonNode>;
pub type StepView = TreeView<StepItem>;

impl<T: NodeText + NodeLabel> TreeView<T> {
    pub fn new(tree: Tree<T>) -> Self {
        Self {
            tree,
            search: TreeSearch::new(),
        }
    }

    pub fn tree(&self) -> &Tree<T> {
        &self.tree
    }

    pub fn search(&self) -> &TreeSearch {
        &self.search
    }

    /// Toggle the node at a rendered line index. Leaves and unknown indexes
    /// are ignored.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let id = self.tree.id_at(index)?;
        self.tree.toggle(id)
    }

    pub fn expand_all(&mut self) -> usize {
        self.tree.set_all_roots(true)
    }

    pub fn collapse_all(&mut self) -> usize {
        self.tree.set_all_roots(false)
    }

    pub fn set_search(&mut self, term: &str) -> usize {
        self.search.set_term(&self.tree, term)
    }

    pub fn next_match(&mut self) -> Option<SearchMatch> {
        self.search.next(&mut self.tree)
    }

    pub fn previous_match(&mut self) -> Option<SearchMatch> {
        self.search.previous(&mut self.tree)
    }

    pub fn lines(&self) -> Vec<RenderedLine> {
        render_lines(&self.tree)
    }

    pub fn text(&self) -> String {
        render_text(&self.tree)
    }
}

#[derive(Debug, Clone)]
pub enum ModalView {
    Json(JsonView),
    Steps(StepView),
    Logs(LogView),
    /// Plain text, including JSON that failed to parse
    Text(String),
    /// Opaque binary reference
    Image(String),
}

impl ModalView {
    /// JSON text becomes a tree; unparseable text falls back to raw display
    pub fn json_or_text(text: &str) -> Self {
        match json::parse(text) {
            Ok(tree) => ModalView::Json(TreeView::new(tree)),
            Err(err) => {
                tracing::warn!(error = %err, "attachment is not valid JSON, showing raw text");
                ModalView::Text(text.to_string())
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModalView::Json(_) => "json",
            ModalView::Steps(_) => "steps",
            ModalView::Logs(_) => "logs",
            ModalView::Text(_) => "text",
            ModalView::Image(_) => "image",
        }
    }

    /// Plain-text rendering of the modal body
    pub fn body(&self) -> String {
        match self {
            ModalView::Json(view) => view.text(),
            ModalView::Steps(view) => view.text(),
            ModalView::Logs(view) => crate::export::ExportFormatter::default().export_log_view(view),
            ModalView::Text(text) => text.clone(),
            ModalView::Image(src) => src.clone(),
        }
    }

    /// Apply a search term to whichever view is open; returns the match count
    pub fn set_search(&mut self, term: &str) -> usize {
        match self {
            ModalView::Json(view) => view.set_search(term),
            ModalView::Steps(view) => view.set_search(term),
            ModalView::Logs(view) => {
                view.set_search(term);
                view.match_count()
            }
            ModalView::Text(_) | ModalView::Image(_) => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Modal {
    pub test: String,
    pub title: String,
    pub view: ModalView,
}

impl Modal {
    /// Build the modal for `target` on `row`; `None` when the row has nothing
    /// to show there
    pub fn open(row: &TestRow, target: &ModalTarget) -> Option<Self> {
        let (title, view) = match target {
            ModalTarget::Detail(key) => {
                let entry = row.detail(key)?;
                let view = match &entry.value {
                    DetailValue::Json { text } => ModalView::json_or_text(text),
                    DetailValue::Log { text } => ModalView::Logs(LogView::new(text)),
                    DetailValue::Text { text } => ModalView::Text(text.clone()),
                    DetailValue::Image { src } => ModalView::Image(src.clone()),
                    DetailValue::Steps { steps: nodes } => {
                        ModalView::Steps(TreeView::new(steps::build(nodes)))
                    }
                };
                (key.clone(), view)
            }
            ModalTarget::Attachment(label) => {
                let steps = row.execution_log()?;
                let StepNode::Attachment {
                    content_type, data, ..
                } = find_attachment(steps, label)?
                else {
                    return None;
                };
                let view = match content_type {
                    AttachmentKind::Json => ModalView::json_or_text(data),
                    AttachmentKind::Text => ModalView::Text(data.clone()),
                    AttachmentKind::Image => ModalView::Image(data.clone()),
                };
                (label.clone(), view)
            }
            ModalTarget::Logs => ("Logs".to_string(), ModalView::Logs(LogView::new(row.log_text()?))),
        };
        Some(Self {
            test: row.id.clone(),
            title,
            view,
        })
    }
}

/// First attachment with `label` in document order
fn find_attachment<'a>(nodes: &'a [StepNode], label: &str) -> Option<&'a StepNode> {
    for node in nodes {
        if let StepNode::Attachment { label: l, .. } = node {
            if l == label {
                return Some(node);
            }
        }
        if let Some(found) = find_attachment(node.children(), label) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DetailEntry, TestStatus};

    fn row() -> TestRow {
        TestRow {
            id: "t1".into(),
            name: "t1".into(),
            status: TestStatus::Passed,
            duration: 0.1,
            components: vec![],
            summary: String::new(),
            details: vec![
                DetailEntry {
                    key: "Payload".into(),
                    value: DetailValue::Json {
                        text: r#"{"user": {"name": "ada"}}"#.into(),
                    },
                    controls: vec![],
                },
                DetailEntry {
                    key: "Broken".into(),
                    value: DetailValue::Json {
                        text: "{not json".into(),
                    },
                    controls: vec![],
                },
                DetailEntry {
                    key: crate::EXECUTION_LOG_KEY.into(),
                    value: DetailValue::Steps {
                        steps: vec![StepNode::Step {
                            message: "outer".into(),
                            passed: true,
                            children: vec![StepNode::Attachment {
                                label: "response".into(),
                                content_type: AttachmentKind::Json,
                                data: "[1, 2]".into(),
                            }],
                        }],
                    },
                    controls: vec![],
                },
            ],
            logs: Some("INFO a:x.py:1 hi".into()),
        }
    }

    #[test]
    fn json_detail_opens_as_tree() {
        let modal = Modal::open(&row(), &ModalTarget::Detail("Payload".into())).unwrap();
        assert_eq!(modal.view.kind(), "json");
        assert!(modal.view.body().contains("name: \"ada\""));
    }

    #[test]
    fn broken_json_falls_back_to_text() {
        let modal = Modal::open(&row(), &ModalTarget::Detail("Broken".into())).unwrap();
        match modal.view {
            ModalView::Text(text) => assert_eq!(text, "{not json"),
            other => panic!("expected text fallback, got {}", other.kind()),
        }
    }

    #[test]
    fn nested_attachment_is_found() {
        let modal = Modal::open(&row(), &ModalTarget::Attachment("response".into())).unwrap();
        assert_eq!(modal.title, "response");
        assert_eq!(modal.view.kind(), "json");
    }

    #[test]
    fn missing_targets_open_nothing() {
        assert!(Modal::open(&row(), &ModalTarget::Detail("Nope".into())).is_none());
        assert!(Modal::open(&row(), &ModalTarget::Attachment("nope".into())).is_none());
        let mut bare = row();
        bare.logs = None;
        assert!(Modal::open(&bare, &ModalTarget::Logs).is_none());
    }

    #[test]
    fn tree_view_search_expands_to_match() {
        let mut modal = Modal::open(&row(), &ModalTarget::Detail("Payload".into())).unwrap();
        let ModalView::Json(view) = &mut modal.view else {
            panic!("expected json view");
        };
        view.collapse_all();
        assert_eq!(view.set_search("ada"), 1);
        let m = view.next_match().unwrap();
        assert!(!view.tree().is_hidden(m.node));
    }

    #[test]
    fn toggle_by_line_index() {
        let mut modal = Modal::open(&row(), &ModalTarget::Detail("Payload".into())).unwrap();
        let ModalView::Json(view) = &mut modal.view else {
            panic!("expected json view");
        };
        let user_line = view.lines()[1].node;
        assert_eq!(view.toggle(user_line), Some(false));
        assert_eq!(view.toggle(999), None);
    }
}
