//! JSON attachment trees

use super::{NodeId, NodeText, Tree};
use serde_json::Value;
use std::borrow::Cow;

/// How a node is addressed by its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonKey {
    Name(String),
    Index(usize),
}

/// Rendered value of a node
#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Array { len: usize },
    Object { len: usize },
}

impl JsonToken {
    /// Atomic display text. Non-empty containers show a size summary that is
    /// only used while they are collapsed.
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            JsonToken::Null => Cow::Borrowed("null"),
            JsonToken::Bool(true) => Cow::Borrowed("true"),
            JsonToken::Bool(false) => Cow::Borrowed("false"),
            JsonToken::Number(n) => Cow::Borrowed(n.as_str()),
            JsonToken::String(s) => Cow::Owned(
                serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\"")),
            ),
            JsonToken::Array { len: 0 } => Cow::Borrowed("[]"),
            JsonToken::Object { len: 0 } => Cow::Borrowed("{}"),
            JsonToken::Array { len: 1 } => Cow::Borrowed("[1 item]"),
            JsonToken::Array { len } => Cow::Owned(format!("[{len} items]")),
            JsonToken::Object { len: 1 } => Cow::Borrowed("{1 key}"),
            JsonToken::Object { len } => Cow::Owned(format!("{{{len} keys}}")),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, JsonToken::Array { .. } | JsonToken::Object { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    pub key: Option<JsonKey>,
    pub token: JsonToken,
}

impl NodeText for JsonNode {
    fn fragments(&self) -> Vec<Cow<'_, str>> {
        let mut out = Vec::with_capacity(2);
        if let Some(JsonKey::Name(name)) = &self.key {
            out.push(Cow::Borrowed(name.as_str()));
        }
        match &self.token {
            JsonToken::String(s) => out.push(Cow::Borrowed(s.as_str())),
            JsonToken::Array { .. } | JsonToken::Object { .. } => {}
            other => out.push(other.display()),
        }
        out
    }
}

/// Build a tree from a parsed value; object keys keep document order
pub fn from_value(value: &Value) -> Tree<JsonNode> {
    let mut tree = Tree::new();
    push_value(&mut tree, None, None, value);
    tree
}

/// Parse attachment text into a tree
pub fn parse(text: &str) -> Result<Tree<JsonNode>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(from_value(&value))
}

fn push_value(tree: &mut Tree<JsonNode>, parent: Option<NodeId>, key: Option<JsonKey>, value: &Value) {
    let token = match value {
        Value::Null => JsonToken::Null,
        Value::Bool(b) => JsonToken::Bool(*b),
        Value::Number(n) => JsonToken::Number(n.to_string()),
        Value::String(s) => JsonToken::String(s.clone()),
        Value::Array(items) => JsonToken::Array { len: items.len() },
        Value::Object(map) => JsonToken::Object { len: map.len() },
    };
    let id = tree.push(parent, JsonNode { key, token });
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                push_value(tree, Some(id), Some(JsonKey::Index(i)), item);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                push_value(tree, Some(id), Some(JsonKey::Name(k.clone())), v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_containers_get_no_toggle() {
        let tree = from_value(&json!({"a": {}, "b": [], "c": [1]}));
        let root = tree.roots()[0];
        assert_eq!(tree.is_expanded(root), Some(true));
        let kids = tree.children(root).to_vec();
        assert_eq!(tree.is_expanded(kids[0]), None);
        assert_eq!(tree.payload(kids[0]).unwrap().token.display(), "{}");
        assert_eq!(tree.is_expanded(kids[1]), None);
        assert_eq!(tree.payload(kids[1]).unwrap().token.display(), "[]");
        assert_eq!(tree.is_expanded(kids[2]), Some(true));
    }

    #[test]
    fn top_level_empty_values_are_atomic() {
        for text in ["{}", "[]"] {
            let tree = parse(text).unwrap();
            assert_eq!(tree.len(), 1);
            assert_eq!(tree.is_expanded(tree.roots()[0]), None);
        }
    }

    #[test]
    fn keys_keep_document_order() {
        let tree = parse(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        let root = tree.roots()[0];
        let keys: Vec<_> = tree
            .children(root)
            .iter()
            .map(|c| tree.payload(*c).unwrap().key.clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                Some(JsonKey::Name("zeta".into())),
                Some(JsonKey::Name("alpha".into()))
            ]
        );
    }

    #[test]
    fn fragments_expose_key_and_value() {
        let node = JsonNode {
            key: Some(JsonKey::Name("user".into())),
            token: JsonToken::String("alice".into()),
        };
        let frags: Vec<String> = node.fragments().into_iter().map(|c| c.into_owned()).collect();
        assert_eq!(frags, vec!["user", "alice"]);
    }

    #[test]
    fn container_summaries() {
        assert_eq!(JsonToken::Array { len: 3 }.display(), "[3 items]");
        assert_eq!(JsonToken::Object { len: 1 }.display(), "{1 key}");
        assert_eq!(JsonToken::String("a\"b".into()).display(), "\"a\\\"b\"");
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(parse("{not json").is_err());
    }
}
