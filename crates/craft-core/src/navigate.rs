// Read, write and delete values at a parsed path inside a document.
// The container kind is checked explicitly at every segment; nothing is
// auto-created: every mutation needs its parent container to exist already.
use std::fmt;

use serde_yaml::{Mapping, Value};

use crate::Document;
use crate::error::PathError;
use crate::path::{DocPath, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl NodeKind {
    pub fn of(v: &Document) -> Self {
        match untag(v) {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Sequence(_) => NodeKind::Sequence,
            Value::Mapping(_) => NodeKind::Mapping,
            Value::Tagged(t) => NodeKind::of(&t.value),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildInfo {
    pub key_or_index: String,
    pub kind: NodeKind,
    pub len: Option<usize>,
}

// Tagged values (`!Ref foo`) are navigated through their inner value.
fn untag(v: &Value) -> &Value {
    match v {
        Value::Tagged(t) => untag(&t.value),
        other => other,
    }
}

fn untag_mut(v: &mut Value) -> &mut Value {
    match v {
        Value::Tagged(t) => untag_mut(&mut t.value),
        other => other,
    }
}

/// Textual form of a scalar mapping key, used to match `Field` segments
/// against numeric or boolean keys.
pub fn key_text(key: &Value) -> Option<String> {
    match untag(key) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

fn find_key(map: &Mapping, name: &str) -> Option<Value> {
    if map.contains_key(name) {
        return Some(Value::String(name.to_string()));
    }
    map.iter()
        .map(|(k, _)| k)
        .find(|k| !matches!(k, Value::String(_)) && key_text(k).as_deref() == Some(name))
        .cloned()
}

fn wrong_kind(seg: &Segment, found: &Value, at: DocPath) -> PathError {
    let expected = match seg {
        Segment::Field(_) => NodeKind::Mapping,
        Segment::Index(_) => NodeKind::Sequence,
    };
    PathError::WrongContainerKind {
        path: at.to_string(),
        expected,
        found: NodeKind::of(found),
    }
}

fn step<'a>(cur: &'a Value, seg: &Segment, path: &DocPath, depth: usize) -> Result<&'a Value, PathError> {
    match (seg, untag(cur)) {
        (Segment::Field(name), Value::Mapping(map)) => find_key(map, name)
            .and_then(|k| map.get(&k))
            .ok_or_else(|| PathError::NotFound {
                path: path.prefix(depth + 1).to_string(),
            }),
        (Segment::Index(i), Value::Sequence(seq)) => {
            seq.get(*i).ok_or_else(|| PathError::IndexOutOfRange {
                path: path.prefix(depth + 1).to_string(),
                index: *i,
                len: seq.len(),
            })
        }
        (seg, other) => Err(wrong_kind(seg, other, path.prefix(depth))),
    }
}

fn step_mut<'a>(
    cur: &'a mut Value,
    seg: &Segment,
    path: &DocPath,
    depth: usize,
) -> Result<&'a mut Value, PathError> {
    match (seg, untag_mut(cur)) {
        (Segment::Field(name), Value::Mapping(map)) => match find_key(map, name) {
            Some(k) => map.get_mut(&k).ok_or_else(|| PathError::NotFound {
                path: path.prefix(depth + 1).to_string(),
            }),
            None => Err(PathError::NotFound {
                path: path.prefix(depth + 1).to_string(),
            }),
        },
        (Segment::Index(i), Value::Sequence(seq)) => {
            let len = seq.len();
            seq.get_mut(*i).ok_or_else(|| PathError::IndexOutOfRange {
                path: path.prefix(depth + 1).to_string(),
                index: *i,
                len,
            })
        }
        (seg, other) => Err(wrong_kind(seg, other, path.prefix(depth))),
    }
}

/// Resolve `path` from the root. The empty path returns the whole document.
pub fn get<'a>(doc: &'a Document, path: &DocPath) -> Result<&'a Document, PathError> {
    let mut cur = doc;
    for (depth, seg) in path.segments().iter().enumerate() {
        cur = step(cur, seg, path, depth)?;
    }
    Ok(cur)
}

pub fn get_mut<'a>(doc: &'a mut Document, path: &DocPath) -> Result<&'a mut Document, PathError> {
    let mut cur = doc;
    for (depth, seg) in path.segments().iter().enumerate() {
        cur = step_mut(cur, seg, path, depth)?;
    }
    Ok(cur)
}

fn parent_mut<'a, 'p>(
    doc: &'a mut Document,
    path: &'p DocPath,
) -> Result<(&'a mut Document, &'p Segment), PathError> {
    let (last, init) = path.segments().split_last().ok_or(PathError::EmptyPath)?;
    let mut cur = doc;
    for (depth, seg) in init.iter().enumerate() {
        cur = step_mut(cur, seg, path, depth)?;
    }
    Ok((cur, last))
}

/// Assign `value` at `path`: creates or overwrites a mapping key, or
/// overwrites an existing sequence element.
pub fn set(doc: &mut Document, path: &DocPath, value: Document) -> Result<(), PathError> {
    let (parent, last) = parent_mut(doc, path)?;
    let depth = path.len() - 1;
    match (last, untag_mut(parent)) {
        (Segment::Field(name), Value::Mapping(map)) => {
            let key = find_key(map, name).unwrap_or_else(|| Value::String(name.clone()));
            map.insert(key, value);
            Ok(())
        }
        (Segment::Index(i), Value::Sequence(seq)) => {
            let len = seq.len();
            match seq.get_mut(*i) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(PathError::IndexOutOfRange {
                    path: path.to_string(),
                    index: *i,
                    len,
                }),
            }
        }
        (seg, other) => Err(wrong_kind(seg, other, path.prefix(depth))),
    }
}

/// Remove the key or element at `path` and return it. Later sequence
/// elements shift down; remaining mapping keys keep their order.
pub fn delete(doc: &mut Document, path: &DocPath) -> Result<Document, PathError> {
    let (parent, last) = parent_mut(doc, path)?;
    let depth = path.len() - 1;
    match (last, untag_mut(parent)) {
        (Segment::Field(name), Value::Mapping(map)) => find_key(map, name)
            .and_then(|k| map.shift_remove(&k))
            .ok_or_else(|| PathError::NotFound {
                path: path.to_string(),
            }),
        (Segment::Index(i), Value::Sequence(seq)) => {
            if *i < seq.len() {
                Ok(seq.remove(*i))
            } else {
                Err(PathError::IndexOutOfRange {
                    path: path.to_string(),
                    index: *i,
                    len: seq.len(),
                })
            }
        }
        (seg, other) => Err(wrong_kind(seg, other, path.prefix(depth))),
    }
}

/// Push `value` onto the sequence at `path`. The sequence must exist.
pub fn append(doc: &mut Document, path: &DocPath, value: Document) -> Result<(), PathError> {
    match untag_mut(get_mut(doc, path)?) {
        Value::Sequence(seq) => {
            seq.push(value);
            Ok(())
        }
        other => Err(PathError::NotAList {
            path: path.to_string(),
            found: NodeKind::of(other),
        }),
    }
}

/// Immediate children of the node at `path`. Scalars have none.
pub fn child_keys(doc: &Document, path: &DocPath) -> Result<Vec<ChildInfo>, PathError> {
    fn len_of(v: &Value) -> Option<usize> {
        match untag(v) {
            Value::Sequence(s) => Some(s.len()),
            Value::Mapping(m) => Some(m.len()),
            _ => None,
        }
    }
    let node = get(doc, path)?;
    let mut out = Vec::new();
    match untag(node) {
        Value::Mapping(map) => {
            for (k, v) in map.iter() {
                out.push(ChildInfo {
                    key_or_index: key_text(k).unwrap_or_else(|| crate::tree::inline_value(k)),
                    kind: NodeKind::of(v),
                    len: len_of(v),
                });
            }
        }
        Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                out.push(ChildInfo {
                    key_or_index: format!("[{}]", i),
                    kind: NodeKind::of(v),
                    len: len_of(v),
                });
            }
        }
        _ => {}
    }
    Ok(out)
}

/// Interpret free text typed by a user as a document value.
///
/// Scalars follow YAML rules (`42`, `true`, `null`); flow collections
/// (`[a, b]`, `{k: v}`) become sequences and mappings. Anything else,
/// including text that only looks like a block mapping (`a: b`), stays a string
/// exactly as typed; only explicitly quoted text (`'007'`) is unquoted.
pub fn parse_value(text: &str) -> Document {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::String(text.to_string());
    }
    match serde_yaml::from_str::<Value>(trimmed) {
        Ok(v @ (Value::Mapping(_) | Value::Sequence(_))) if trimmed.starts_with(['[', '{']) => v,
        Ok(Value::Null) if matches!(trimmed, "null" | "Null" | "NULL" | "~") => Value::Null,
        Ok(Value::String(s)) if trimmed.starts_with(['\'', '"']) => Value::String(s),
        Ok(v @ (Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(text.to_string()),
    }
}
