//! # Edit session
//!
//! Transactional editing over a working copy of a loaded document.
//!
//! ## Design
//!
//! - `original` is kept as loaded and never mutated
//! - every mutation pushes a deep snapshot of `working` first
//! - a failed mutation pops that snapshot back, leaving `working` untouched
//! - undo pops the most recent snapshot into `working`
//! - `commit` and `cancel` consume the session, so nothing can follow them
//!
//! Front ends drive a session either by calling the transition methods
//! directly (GUI) or through [`run`] with a [`Frontend`] (interactive CLI).
//!
//! ## Example
//!
//! ```rust
//! use craft_core::session::EditSession;
//!
//! let doc = serde_yaml::from_str("services:\n  web:\n    image: nginx\n").unwrap();
//! let mut session = EditSession::new(doc);
//! session.set("services.web.restart", "always".into()).unwrap();
//! session.undo().unwrap();
//! assert!(!session.is_dirty());
//! ```

use tracing::{debug, info, warn};

use crate::Document;
use crate::diff::{Change, diff};
use crate::error::{PathError, SessionError};
use crate::navigate::{self, ChildInfo};
use crate::path::DocPath;

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOpts {
    /// Maximum number of undo snapshots kept (0 = unlimited).
    pub max_history: usize,
}

/// The fixed menu of session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Set { path: String, value: Document },
    Append { path: String, value: Document },
    Delete { path: String },
    ShowKeys { path: String },
    Undo,
    Preview,
    Cancel,
}

impl Action {
    /// Menu labels, in menu order.
    pub const MENU: [&'static str; 7] = [
        "Set value at path",
        "Append to list",
        "Delete key",
        "Show available keys",
        "Undo last change",
        "Preview diff & save",
        "Cancel",
    ];
}

/// Outcome of a successful non-terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Updated(DocPath),
    Appended(DocPath),
    Deleted { path: DocPath, removed: Document },
    Keys { path: DocPath, children: Vec<ChildInfo> },
    Undone,
    NotSaved,
}

/// Terminal state of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    Committed(Document),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    original: Document,
    working: Document,
    /// Snapshots of `working` (most recent last)
    history: Vec<Document>,
    opts: SessionOpts,
}

impl EditSession {
    pub fn new(original: Document) -> Self {
        Self::with_opts(original, SessionOpts::default())
    }

    pub fn with_opts(original: Document, opts: SessionOpts) -> Self {
        let working = original.clone();
        Self {
            original,
            working,
            history: Vec::new(),
            opts,
        }
    }

    pub fn original(&self) -> &Document {
        &self.original
    }

    pub fn working(&self) -> &Document {
        &self.working
    }

    pub fn undo_levels(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// True when the working copy differs from the loaded document.
    pub fn is_dirty(&self) -> bool {
        self.working != self.original
    }

    /// Snapshot, attempt, and restore the snapshot if the attempt fails.
    fn transact<T>(
        &mut self,
        path: &DocPath,
        op: impl FnOnce(&mut Document, &DocPath) -> Result<T, PathError>,
    ) -> Result<T, SessionError> {
        self.history.push(self.working.clone());
        match op(&mut self.working, path) {
            Ok(out) => {
                self.trim_history();
                Ok(out)
            }
            Err(e) => {
                if let Some(prev) = self.history.pop() {
                    self.working = prev;
                }
                warn!(path = %path, error = %e, "edit rolled back");
                Err(e.into())
            }
        }
    }

    fn trim_history(&mut self) {
        let max = self.opts.max_history;
        if max > 0 && self.history.len() > max {
            let excess = self.history.len() - max;
            self.history.drain(..excess);
            debug!(dropped = excess, "trimmed undo history");
        }
    }

    pub fn set(&mut self, path: &str, value: Document) -> Result<DocPath, SessionError> {
        let path = DocPath::parse(path)?;
        self.transact(&path, |doc, p| navigate::set(doc, p, value))?;
        debug!(path = %path, "set");
        Ok(path)
    }

    pub fn append(&mut self, path: &str, value: Document) -> Result<DocPath, SessionError> {
        let path = DocPath::parse(path)?;
        self.transact(&path, |doc, p| navigate::append(doc, p, value))?;
        debug!(path = %path, "append");
        Ok(path)
    }

    /// Delete at `path`, returning the removed value.
    pub fn delete(&mut self, path: &str) -> Result<(DocPath, Document), SessionError> {
        let path = DocPath::parse(path)?;
        let removed = self.transact(&path, navigate::delete)?;
        debug!(path = %path, "delete");
        Ok((path, removed))
    }

    /// Immediate children at `path` (root when empty). Read-only.
    pub fn show_keys(&self, path: &str) -> Result<(DocPath, Vec<ChildInfo>), SessionError> {
        let path = DocPath::parse(path)?;
        let children = navigate::child_keys(&self.working, &path)?;
        Ok((path, children))
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        let prev = self.history.pop().ok_or(SessionError::NothingToUndo)?;
        self.working = prev;
        debug!(levels = self.history.len(), "undo");
        Ok(())
    }

    /// Changes from the loaded document to the working copy.
    pub fn preview(&self) -> Vec<Change> {
        diff(&self.original, &self.working)
    }

    pub fn commit(self) -> Document {
        info!(edits = self.history.len(), "session committed");
        self.working
    }

    pub fn cancel(self) {
        info!("session cancelled, changes discarded");
    }
}

/// The interactive side of a session: supplies actions, confirms previews,
/// and shows results.
pub trait Frontend {
    fn next_action(&mut self, session: &EditSession) -> Action;
    fn confirm(&mut self, changes: &[Change]) -> bool;
    fn report(&mut self, report: &Report);
    fn error(&mut self, err: &SessionError);
}

/// Drive `session` until the front end commits or cancels.
pub fn run<F: Frontend + ?Sized>(mut session: EditSession, frontend: &mut F) -> SessionEnd {
    loop {
        let result = match frontend.next_action(&session) {
            Action::Set { path, value } => session.set(&path, value).map(Report::Updated),
            Action::Append { path, value } => session.append(&path, value).map(Report::Appended),
            Action::Delete { path } => session
                .delete(&path)
                .map(|(path, removed)| Report::Deleted { path, removed }),
            Action::ShowKeys { path } => session
                .show_keys(&path)
                .map(|(path, children)| Report::Keys { path, children }),
            Action::Undo => session.undo().map(|()| Report::Undone),
            Action::Preview => {
                let changes = session.preview();
                if frontend.confirm(&changes) {
                    return SessionEnd::Committed(session.commit());
                }
                Ok(Report::NotSaved)
            }
            Action::Cancel => {
                session.cancel();
                return SessionEnd::Cancelled;
            }
        };
        match result {
            Ok(report) => frontend.report(&report),
            Err(err) => frontend.error(&err),
        }
    }
}
