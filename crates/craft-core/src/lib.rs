//! craft-core: path-addressable document model and undoable edit session
//!
//! This crate focuses on a small, well-factored surface:
//! - Path expressions (`services.web.ports[0]`) parsed into typed segments
//! - Navigator: get / set / delete / append at a path, never auto-creating
//! - Tree view of a document with virtual-root handling, and its inverse
//! - Edit session with snapshots, rollback on failure, undo and preview
//! - YAML/JSON load and save, document discovery, zip backup before overwrite
//!
pub mod diff;
pub mod error;
pub mod io;
pub mod navigate;
pub mod path;
pub mod schema;
pub mod session;
pub mod tree;

/// A configuration document: mapping, sequence or scalar.
pub type Document = serde_yaml::Value;

pub use diff::{Change, ChangeKind, diff};
pub use error::{DocumentError, PathError, SchemaError, SessionError};
pub use io::{find_documents, load, save, to_yaml_string, zip_backup};
pub use navigate::{ChildInfo, NodeKind, append, child_keys, delete, get, get_mut, parse_value, set};
pub use path::{DocPath, Segment};
pub use schema::SchemaKind;
pub use session::{Action, EditSession, Frontend, Report, SessionEnd, SessionOpts, run};
pub use tree::{DocumentTree, TreeNode, inline_value, render_tree};
