//! Identifiers and property chains
//!
//! An [`Identifier`] is one segment of a dotted property path such as
//! `CIM_Disk.Drive.CIM_Media::Capacity[2]`. A [`ChainedIdentifier`] is the
//! whole path. CIM names compare case-insensitively.

use cimql_diagnostics::{CIMQL0006, QueryError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// One segment of a property path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Property or class name (empty for a standalone symbolic constant)
    name: String,
    /// Scoping class for `Class::prop`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    /// Array index applied at this segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    /// Symbolic constant for `prop#'Name'`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    symbolic_constant: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    wildcard: bool,
}

impl Identifier {
    /// Create a plain identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: None,
            index: None,
            symbolic_constant: None,
            wildcard: false,
        }
    }

    /// Create a scoped identifier, `scope::name`
    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            ..Self::new(name)
        }
    }

    /// Create a standalone symbolic constant, `#'constant'`
    pub fn standalone_constant(constant: impl Into<String>) -> Self {
        Self {
            symbolic_constant: Some(constant.into()),
            ..Self::new("")
        }
    }

    /// Create a wildcard segment, `*`
    pub fn wildcard() -> Self {
        Self {
            wildcard: true,
            ..Self::new("*")
        }
    }

    /// Attach an array index
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attach a symbolic constant
    pub fn with_symbolic_constant(mut self, constant: impl Into<String>) -> Self {
        self.symbolic_constant = Some(constant.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn symbolic_constant(&self) -> Option<&str> {
        self.symbolic_constant.as_deref()
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    pub fn is_array(&self) -> bool {
        self.index.is_some()
    }

    pub fn is_symbolic_constant(&self) -> bool {
        self.symbolic_constant.is_some()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// A symbolic constant with no property name to anchor it
    pub fn is_standalone_constant(&self) -> bool {
        self.symbolic_constant.is_some() && self.name.is_empty()
    }

    /// Case-insensitive name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Same identifier with the symbolic constant replaced by `constant`
    pub(crate) fn replace_constant(&mut self, constant: Option<String>) {
        self.symbolic_constant = constant;
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wildcard {
            return write!(f, "*");
        }
        if let Some(scope) = &self.scope {
            write!(f, "{}::", scope)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(index) = self.index {
            write!(f, "[{}]", index)?;
        }
        if let Some(constant) = &self.symbolic_constant {
            write!(f, "#'{}'", constant)?;
        }
        Ok(())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A dotted property path, `a.b.c`
///
/// Serialized as its textual form, e.g. `"CIM_Disk.CIM_Media::Capacity[2]"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainedIdentifier {
    segments: SmallVec<[Identifier; 4]>,
}

impl ChainedIdentifier {
    /// Create a chain from segments
    pub fn new(segments: impl IntoIterator<Item = Identifier>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Create a chain from dot-free names, e.g. `["CIM_Disk", "Status"]`
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| Identifier::new(n.as_ref())))
    }

    pub fn segments(&self) -> &[Identifier] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&Identifier> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Identifier> {
        self.segments.last()
    }

    /// Append a segment
    pub fn push(&mut self, segment: Identifier) {
        self.segments.push(segment);
    }

    /// Insert a segment at the front
    pub fn prepend(&mut self, segment: Identifier) {
        self.segments.insert(0, segment);
    }

    /// Replace the first segment
    pub fn replace_first(&mut self, segment: Identifier) {
        match self.segments.first_mut() {
            Some(first) => *first = segment,
            None => self.segments.push(segment),
        }
    }

    /// True for a single-segment chain holding a standalone symbolic constant
    pub fn is_standalone_constant(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].is_standalone_constant()
    }

    /// A copy of this chain whose last segment carries `constant`
    pub fn with_terminal_constant(&self, constant: impl Into<String>) -> Self {
        let mut chain = self.clone();
        if let Some(last) = chain.segments.last_mut() {
            last.replace_constant(Some(constant.into()));
        }
        chain
    }
}

impl fmt::Display for ChainedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<Identifier> for ChainedIdentifier {
    fn from(id: Identifier) -> Self {
        Self::new([id])
    }
}

impl From<&str> for ChainedIdentifier {
    fn from(name: &str) -> Self {
        Self::new([Identifier::new(name)])
    }
}

fn illegal(text: &str, reason: &str) -> QueryError {
    QueryError::syntax(CIMQL0006, format!("Illegal identifier '{}': {}", text, reason))
}

/// Split on dots that sit outside a quoted constant
fn split_segments(text: &str) -> Result<Vec<&str>, QueryError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '.' if !quoted => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err(illegal(text, "unterminated constant"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

impl FromStr for Identifier {
    type Err = QueryError;

    /// Parse `[scope::]name[index]#'constant'`, `#'constant'` or `*`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text == "*" {
            return Ok(Self::wildcard());
        }

        let (body, constant) = match text.find("#'") {
            Some(at) => {
                let rest = &text[at + 2..];
                let Some(constant) = rest.strip_suffix('\'') else {
                    return Err(illegal(text, "unterminated constant"));
                };
                (&text[..at], Some(constant.to_string()))
            }
            None => (text, None),
        };

        if body.is_empty() {
            return match constant {
                Some(constant) => Ok(Self::standalone_constant(constant)),
                None => Err(illegal(text, "empty segment")),
            };
        }

        let (body, index) = match body.strip_suffix(']') {
            Some(head) => {
                let open = head.rfind('[').ok_or_else(|| illegal(text, "unbalanced '['"))?;
                let index = head[open + 1..]
                    .parse::<usize>()
                    .map_err(|_| illegal(text, "array index must be a non-negative integer"))?;
                (&head[..open], Some(index))
            }
            None => (body, None),
        };

        let (scope, name) = match body.split_once("::") {
            Some((scope, name)) => (Some(scope), name),
            None => (None, body),
        };
        let valid = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_')
        };
        if !valid(name) || scope.is_some_and(|scope| !valid(scope)) {
            return Err(illegal(text, "expected a CIM name"));
        }

        Ok(Self {
            name: name.to_string(),
            scope: scope.map(str::to_string),
            index,
            symbolic_constant: constant,
            wildcard: false,
        })
    }
}

impl FromStr for ChainedIdentifier {
    type Err = QueryError;

    /// Parse a dotted chain; the empty string is the empty chain
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let segments = split_segments(s.trim())?
            .into_iter()
            .map(str::parse)
            .collect::<Result<SmallVec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl TryFrom<String> for ChainedIdentifier {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainedIdentifier> for String {
    fn from(chain: ChainedIdentifier) -> Self {
        chain.to_string()
    }
}
