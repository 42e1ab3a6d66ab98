// Read-only tree view of a document for display.
// Mappings become interior nodes; every other value (scalars and whole
// sequences) becomes a leaf that carries it. Documents with a key count other
// than one at the top level hang under a nameless virtual root that is
// unwrapped again on the way back.
use serde_yaml::{Mapping, Value};

use crate::Document;
use crate::navigate::key_text;

/// Key given to the synthetic root of multi-key documents.
pub const VIRTUAL_ROOT_KEY: &str = "";

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub key: String,
    /// Present iff the node is a leaf.
    pub value: Option<Document>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(key: impl Into<String>, value: Document) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            children: Vec::new(),
        }
    }

    pub fn branch(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    fn from_entry(key: String, value: &Document) -> Self {
        match value {
            Value::Mapping(map) => {
                let mut node = TreeNode::branch(key);
                node.children = children_of(map);
                node
            }
            other => TreeNode::leaf(key, other.clone()),
        }
    }

    fn fold(&self) -> Document {
        match &self.value {
            Some(v) => v.clone(),
            None => {
                let mut map = Mapping::new();
                for child in &self.children {
                    map.insert(Value::String(child.key.clone()), child.fold());
                }
                Value::Mapping(map)
            }
        }
    }
}

fn children_of(map: &Mapping) -> Vec<TreeNode> {
    map.iter()
        .map(|(k, v)| {
            let key = key_text(k).unwrap_or_else(|| inline_value(k));
            TreeNode::from_entry(key, v)
        })
        .collect()
}

/// A document converted to a tree, remembering whether the root is synthetic.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTree {
    pub root: TreeNode,
    pub virtual_root: bool,
}

impl DocumentTree {
    pub fn from_document(doc: &Document) -> Self {
        match doc {
            Value::Mapping(map) => {
                if map.len() == 1
                    && let Some((k, v)) = map.iter().next()
                {
                    let key = key_text(k).unwrap_or_else(|| inline_value(k));
                    return Self {
                        root: TreeNode::from_entry(key, v),
                        virtual_root: false,
                    };
                }
                let mut root = TreeNode::branch(VIRTUAL_ROOT_KEY);
                root.children = children_of(map);
                tracing::debug!(children = root.children.len(), "built virtual root");
                Self {
                    root,
                    virtual_root: true,
                }
            }
            other => Self {
                root: TreeNode::leaf(VIRTUAL_ROOT_KEY, other.clone()),
                virtual_root: false,
            },
        }
    }

    /// Inverse of [`DocumentTree::from_document`] for string-keyed mappings.
    pub fn to_document(&self) -> Document {
        let folded = self.root.fold();
        if self.virtual_root {
            return folded;
        }
        let mut map = Mapping::new();
        map.insert(Value::String(self.root.key.clone()), folded);
        Value::Mapping(map)
    }

    pub fn render(&self) -> String {
        render_tree(&self.root)
    }
}

/// Indented text view: `key: value` for leaves, `key:` for mappings.
pub fn render_tree(node: &TreeNode) -> String {
    let mut lines = Vec::new();
    render_into(node, 0, &mut lines);
    lines.join("\n")
}

fn render_into(node: &TreeNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let label = if node.key.is_empty() { "(root)" } else { node.key.as_str() };
    match &node.value {
        Some(v) => lines.push(format!("{}{}: {}", indent, label, inline_value(v))),
        None => lines.push(format!("{}{}:", indent, label)),
    }
    for child in &node.children {
        render_into(child, depth + 1, lines);
    }
}

/// Single-line rendering of a value, flow style for collections.
pub fn inline_value(v: &Document) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(seq) => {
            let items: Vec<String> = seq.iter().map(inline_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", inline_value(k), inline_value(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
        Value::Tagged(t) => format!("{} {}", t.tag, inline_value(&t.value)),
    }
}
