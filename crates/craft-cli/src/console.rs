// Line-oriented front end for `containcraft edit`: numbered menu on stdout,
// answers read one line at a time. End of input cancels the session.
use std::io::{BufRead, Write};

use craft_core::session::{Action, EditSession, Frontend, Report};
use craft_core::{Change, SessionError, to_yaml_string};

use crate::typed_value;

pub struct Console<R, W> {
    input: R,
    out: W,
    force_string: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W, force_string: bool) -> Self {
        Self {
            input,
            out,
            force_string,
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }

    fn prompt(&mut self, label: &str) -> Option<String> {
        write!(self.out, "{}: ", label).ok();
        self.out.flush().ok();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn show(&mut self, session: &EditSession) {
        let yaml = to_yaml_string(session.working()).unwrap_or_default();
        writeln!(self.out, "\n--- working copy").ok();
        write!(self.out, "{}", yaml).ok();
        if session.can_undo() {
            writeln!(self.out, "--- {} undo level(s)", session.undo_levels()).ok();
        }
        for (i, label) in Action::MENU.iter().enumerate() {
            writeln!(self.out, "{}) {}", i + 1, label).ok();
        }
    }
}

impl<R: BufRead, W: Write> Frontend for Console<R, W> {
    fn next_action(&mut self, session: &EditSession) -> Action {
        loop {
            self.show(session);
            let Some(choice) = self.prompt("Enter choice number") else {
                return Action::Cancel;
            };
            let action = match choice.trim() {
                "1" | "2" => {
                    let Some(path) = self.prompt("Path (e.g. services.web.ports)") else {
                        return Action::Cancel;
                    };
                    let Some(text) = self.prompt("Value") else {
                        return Action::Cancel;
                    };
                    let value = typed_value(&text, self.force_string);
                    if choice.trim() == "1" {
                        Action::Set { path, value }
                    } else {
                        Action::Append { path, value }
                    }
                }
                "3" => match self.prompt("Path to delete") {
                    Some(path) => Action::Delete { path },
                    None => return Action::Cancel,
                },
                "4" => match self.prompt("Path (empty for top level)") {
                    Some(path) => Action::ShowKeys { path },
                    None => return Action::Cancel,
                },
                "5" => Action::Undo,
                "6" => Action::Preview,
                "7" => Action::Cancel,
                other => {
                    writeln!(self.out, "Invalid choice: {:?}", other).ok();
                    continue;
                }
            };
            return action;
        }
    }

    fn confirm(&mut self, changes: &[Change]) -> bool {
        if changes.is_empty() {
            writeln!(self.out, "No changes.").ok();
        } else {
            writeln!(self.out, "Changes:").ok();
            for c in changes {
                writeln!(self.out, "  {}", c).ok();
            }
        }
        self.prompt("Save changes? (y/n)")
            .is_some_and(|a| a.trim().eq_ignore_ascii_case("y") || a.trim().eq_ignore_ascii_case("yes"))
    }

    fn report(&mut self, report: &Report) {
        let written = match report {
            Report::Updated(path) => writeln!(self.out, "Updated {}", path),
            Report::Appended(path) => writeln!(self.out, "Appended to {}", path),
            Report::Deleted { path, removed } => writeln!(
                self.out,
                "Deleted {} (was {})",
                path,
                craft_core::inline_value(removed)
            ),
            Report::Keys { path, children } => {
                writeln!(self.out, "Keys under {}:", path).ok();
                for c in children {
                    let line = match c.len {
                        Some(n) => writeln!(self.out, "  {} ({}, {} item(s))", c.key_or_index, c.kind, n),
                        None => writeln!(self.out, "  {} ({})", c.key_or_index, c.kind),
                    };
                    line.ok();
                }
                Ok(())
            }
            Report::Undone => writeln!(self.out, "Undid last change"),
            Report::NotSaved => writeln!(self.out, "Not saved; still editing"),
        };
        written.ok();
    }

    fn error(&mut self, err: &SessionError) {
        writeln!(self.out, "error: {}", err).ok();
    }
}
