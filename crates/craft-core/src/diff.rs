// Structural difference between two documents, used by the session preview.
// Mappings are compared key by key, sequences element by element; anything
// else that differs is reported as a modification at that path.
use std::fmt;

use serde_yaml::Value;

use crate::Document;
use crate::navigate::key_text;
use crate::path::{DocPath, Segment};
use crate::tree::inline_value;

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Added(Document),
    Removed(Document),
    Modified { before: Document, after: Document },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: DocPath,
    pub kind: ChangeKind,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChangeKind::Added(v) => write!(f, "+ {}: {}", self.path, inline_value(v)),
            ChangeKind::Removed(v) => write!(f, "- {}: {}", self.path, inline_value(v)),
            ChangeKind::Modified { before, after } => write!(
                f,
                "~ {}: {} -> {}",
                self.path,
                inline_value(before),
                inline_value(after)
            ),
        }
    }
}

/// Changes that turn `before` into `after`, in document order.
pub fn diff(before: &Document, after: &Document) -> Vec<Change> {
    let mut out = Vec::new();
    diff_into(&DocPath::root(), before, after, &mut out);
    out
}

fn field(key: &Value) -> Segment {
    Segment::Field(key_text(key).unwrap_or_else(|| inline_value(key)))
}

fn diff_into(at: &DocPath, before: &Value, after: &Value, out: &mut Vec<Change>) {
    if before == after {
        return;
    }
    match (before, after) {
        (Value::Mapping(old), Value::Mapping(new)) => {
            for (k, v) in old.iter() {
                let path = at.child(field(k));
                match new.get(k) {
                    Some(nv) => diff_into(&path, v, nv, out),
                    None => out.push(Change {
                        path,
                        kind: ChangeKind::Removed(v.clone()),
                    }),
                }
            }
            for (k, v) in new.iter() {
                if !old.contains_key(k) {
                    out.push(Change {
                        path: at.child(field(k)),
                        kind: ChangeKind::Added(v.clone()),
                    });
                }
            }
        }
        (Value::Sequence(old), Value::Sequence(new)) => {
            for (i, (ov, nv)) in old.iter().zip(new.iter()).enumerate() {
                diff_into(&at.child(Segment::Index(i)), ov, nv, out);
            }
            for (i, v) in old.iter().enumerate().skip(new.len()) {
                out.push(Change {
                    path: at.child(Segment::Index(i)),
                    kind: ChangeKind::Removed(v.clone()),
                });
            }
            for (i, v) in new.iter().enumerate().skip(old.len()) {
                out.push(Change {
                    path: at.child(Segment::Index(i)),
                    kind: ChangeKind::Added(v.clone()),
                });
            }
        }
        _ => out.push(Change {
            path: at.clone(),
            kind: ChangeKind::Modified {
                before: before.clone(),
                after: after.clone(),
            },
        }),
    }
}
