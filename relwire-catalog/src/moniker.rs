//! Typed object references returned by catalog enumeration.

use std::fmt;

/// What kind of object a moniker names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonikerKind {
    Catalog,
    Schema,
    Table,
    Function,
}

/// A fully-qualified, kind-tagged object reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Moniker {
    pub path: Vec<String>,
    pub kind: MonikerKind,
}

impl Moniker {
    pub fn new(path: Vec<String>, kind: MonikerKind) -> Self {
        Self { path, kind }
    }

    /// Last path component: the object's own name.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Moniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("."))
    }
}
