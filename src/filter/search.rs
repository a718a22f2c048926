//! Free-text search: substring matching, highlight segments, and in-tree
//! match navigation for open JSON/log views

use crate::tree::{NodeId, NodeText, Tree};
use regex::{Regex, RegexBuilder};

/// Case-insensitive substring test; an empty needle matches everything
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle.is_ascii() {
        return haystack
            .as_bytes()
            .windows(needle.len())
            .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()));
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Literal, case-insensitive matcher for a search term
pub(crate) fn term_regex(term: &str) -> Option<Regex> {
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

/// A run of text, either plain or wrapped in a highlight marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split `text` into plain and highlighted runs
pub fn highlight<'a>(text: &'a str, term: &str) -> Vec<Segment<'a>> {
    let Some(re) = term_regex(term) else {
        return vec![Segment {
            text,
            matched: false,
        }];
    };
    let mut out = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            out.push(Segment {
                text: &text[last..m.start()],
                matched: false,
            });
        }
        out.push(Segment {
            text: m.as_str(),
            matched: true,
        });
        last = m.end();
    }
    if last < text.len() || out.is_empty() {
        out.push(Segment {
            text: &text[last..],
            matched: false,
        });
    }
    out
}

/// Render highlight segments with a textual marker around matches
pub fn mark(text: &str, term: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for seg in highlight(text, term) {
        if seg.matched {
            out.push_str(open);
            out.push_str(seg.text);
            out.push_str(close);
        } else {
            out.push_str(seg.text);
        }
    }
    out
}

/// One match inside a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub node: NodeId,
    /// Index into the node's text fragments
    pub fragment: usize,
    /// Byte range within the fragment
    pub start: usize,
    pub end: usize,
}

/// Incremental search over a rendered tree
#[derive(Debug, Clone, Default)]
pub struct TreeSearch {
    term: String,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl TreeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    /// Replace the term. Previous highlights are cleared first, then every
    /// text fragment is scanned in document order, collapsed nodes included.
    pub fn set_term<T: NodeText>(&mut self, tree: &Tree<T>, term: &str) -> usize {
        self.clear();
        self.term = term.to_string();
        let Some(re) = term_regex(term) else {
            return 0;
        };
        for id in tree.walk() {
            let Some(payload) = tree.payload(id) else {
                continue;
            };
            for (fragment, text) in payload.fragments().iter().enumerate() {
                for m in re.find_iter(text) {
                    self.matches.push(SearchMatch {
                        node: id,
                        fragment,
                        start: m.start(),
                        end: m.end(),
                    });
                }
            }
        }
        tracing::debug!(term, matches = self.matches.len(), "tree search updated");
        self.matches.len()
    }

    pub fn clear(&mut self) {
        self.term.clear();
        self.matches.clear();
        self.current = None;
    }

    pub fn current(&self) -> Option<&SearchMatch> {
        self.current.and_then(|i| self.matches.get(i))
    }

    /// 1-based position and total, for a "3 / 7" counter
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current.map(|i| (i + 1, self.matches.len()))
    }

    /// Advance to the next match (wrapping after the last) and expand every
    /// collapsed ancestor so it is visible
    pub fn next<T>(&mut self, tree: &mut Tree<T>) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let idx = match self.current {
            Some(i) => (i + 1) % self.matches.len(),
            None => 0,
        };
        self.focus(tree, idx)
    }

    /// Step back to the previous match, wrapping before the first
    pub fn previous<T>(&mut self, tree: &mut Tree<T>) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let len = self.matches.len();
        let idx = match self.current {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.focus(tree, idx)
    }

    fn focus<T>(&mut self, tree: &mut Tree<T>, idx: usize) -> Option<SearchMatch> {
        let m = *self.matches.get(idx)?;
        self.current = Some(idx);
        tree.reveal(m.node);
        Some(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::json;

    #[test]
    fn contains_ignore_case_ascii_and_unicode() {
        assert!(contains_ignore_case("Login Flow", "login"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("abc", "abcd"));
        assert!(contains_ignore_case("ÉCOLE", "école"));
    }

    #[test]
    fn highlight_wraps_each_match() {
        let segs = highlight("Error and error", "ERROR");
        let matched: Vec<_> = segs.iter().filter(|s| s.matched).map(|s| s.text).collect();
        assert_eq!(matched, vec!["Error", "error"]);
        assert_eq!(mark("Error and error", "error", "[", "]"), "[Error] and [error]");
    }

    #[test]
    fn highlight_escapes_regex_metacharacters() {
        assert_eq!(mark("a.b axb", ".", "<", ">"), "a<.>b axb");
    }

    #[test]
    fn empty_term_highlights_nothing() {
        let segs = highlight("text", "");
        assert_eq!(segs, vec![Segment { text: "text", matched: false }]);
    }

    #[test]
    fn search_reaches_collapsed_nodes() {
        let mut tree = json::parse(r#"{"outer": {"inner": "needle"}, "other": "needle too"}"#).unwrap();
        tree.set_all_roots(false);
        let mut search = TreeSearch::new();
        assert_eq!(search.set_term(&tree, "NEEDLE"), 2);
    }

    #[test]
    fn next_wraps_and_reveals_ancestors() {
        let mut tree = json::parse(r#"{"outer": {"inner": "needle"}, "other": "needle too"}"#).unwrap();
        tree.set_all_roots(false);
        let mut search = TreeSearch::new();
        search.set_term(&tree, "needle");

        let first = search.next(&mut tree).unwrap();
        assert!(!tree.is_hidden(first.node));
        assert_eq!(search.position(), Some((1, 2)));

        let second = search.next(&mut tree).unwrap();
        assert_ne!(first.node, second.node);

        let wrapped = search.next(&mut tree).unwrap();
        assert_eq!(wrapped, first);
        assert_eq!(search.position(), Some((1, 2)));
    }

    #[test]
    fn previous_wraps_backwards() {
        let mut tree = json::parse(r#"["ab", "ab", "ab"]"#).unwrap();
        let mut search = TreeSearch::new();
        search.set_term(&tree, "ab");
        search.previous(&mut tree);
        assert_eq!(search.position(), Some((3, 3)));
    }

    #[test]
    fn new_term_clears_previous_state() {
        let mut tree = json::parse(r#"["alpha", "beta"]"#).unwrap();
        let mut search = TreeSearch::new();
        search.set_term(&tree, "alpha");
        search.next(&mut tree);
        assert!(search.current().is_some());

        assert_eq!(search.set_term(&tree, "gamma"), 0);
        assert!(search.current().is_none());
        assert!(search.next(&mut tree).is_none());
    }

    #[test]
    fn matches_follow_document_order() {
        let tree = json::parse(r#"{"b": "x", "a": {"c": "x"}, "d": "x"}"#).unwrap();
        let mut search = TreeSearch::new();
        search.set_term(&tree, "x");
        let nodes: Vec<usize> = search.matches().iter().map(|m| m.node.index()).collect();
        let mut sorted = nodes.clone();
        sorted.sort();
        assert_eq!(nodes, sorted);
    }
}
