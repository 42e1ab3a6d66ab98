// Path expressions over documents: `services.web.ports[0]`, `a[0][1]`, `[3]`.
// Tokens are split on '.', each token is an optional field name followed by
// zero or more `[digits]` suffixes.
use std::fmt;

use crate::error::PathError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Parsed path expression. The empty path addresses the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<Segment>,
}

impl DocPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a textual path. Surrounding whitespace is ignored; an empty
    /// string yields the root path.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let text = text.trim();
        let mut segments = Vec::new();
        if text.is_empty() {
            return Ok(Self { segments });
        }
        for token in text.split('.') {
            parse_token(token, &mut segments)?;
        }
        tracing::debug!(path = text, segments = segments.len(), "parsed path");
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when the textual form parses back to this path. Keys holding
    /// '.', '[' or ']' (or empty keys) have no textual form.
    pub fn is_addressable(&self) -> bool {
        self.is_root() || DocPath::parse(&self.to_string()).is_ok_and(|p| &p == self)
    }

    /// All segments but the last, as a new path.
    pub fn parent(&self) -> Option<DocPath> {
        let (_, init) = self.segments.split_last()?;
        Some(Self::from_segments(init.to_vec()))
    }

    /// Path made of the first `n` segments.
    pub fn prefix(&self, n: usize) -> DocPath {
        Self::from_segments(self.segments[..n.min(self.segments.len())].to_vec())
    }

    pub fn child(&self, seg: Segment) -> DocPath {
        let mut segments = self.segments.clone();
        segments.push(seg);
        Self { segments }
    }
}

fn malformed(token: &str, reason: &str) -> PathError {
    PathError::MalformedPath {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_token(token: &str, out: &mut Vec<Segment>) -> Result<(), PathError> {
    if token.is_empty() {
        return Err(malformed(token, "empty segment"));
    }
    let (name, mut rest) = match token.find('[') {
        Some(pos) => (&token[..pos], &token[pos..]),
        None => (token, ""),
    };
    if name.contains(']') {
        return Err(malformed(token, "unexpected ']'"));
    }
    if !name.is_empty() {
        out.push(Segment::Field(name.to_string()));
    }
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(malformed(token, "expected '[' after ']'"));
        };
        let close = body
            .find(']')
            .ok_or_else(|| malformed(token, "unclosed '['"))?;
        let digits = &body[..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(token, "index must be a non-negative integer"));
        }
        let index: usize = digits
            .parse()
            .map_err(|_| malformed(token, "index too large"))?;
        out.push(Segment::Index(index));
        rest = &body[close + 1..];
    }
    Ok(())
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
