use std::fmt;

use thiserror::Error;

/// Unified error type for all relwire operations.
///
/// The enum covers every failure mode in the workspace: bad API input,
/// wire-format violations discovered while decoding a plan document, and
/// internal invariant breaches. Errors propagate upward with the `?`
/// operator; plan decoding wraps whatever went wrong in [`Error::NodeDecode`]
/// so callers always learn which record of the document failed.
///
/// Speculative lookups ("does this table exist?") are *not* errors: the
/// resolver returns `Option`/empty collections for those. The variants here
/// describe conditions that abort the current operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input to a relwire API.
    ///
    /// Raised for malformed identifiers, out-of-range facets (e.g. a
    /// decimal scale beyond the supported precision), or constructor
    /// arguments that cannot produce a well-formed value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A plan document referenced an operator identity that no registered
    /// table resolves.
    ///
    /// The identity triple (name, kind tag, syntax form) is reported
    /// verbatim so the caller can see exactly what failed to resolve.
    /// Decoding never substitutes a different operator.
    #[error("no operator for '{name}' with kind: '{kind}', syntax: '{syntax}'")]
    UnresolvedOperator {
        name: String,
        kind: String,
        syntax: String,
    },

    /// A table path in a plan document did not resolve against the
    /// caller-supplied catalog scope.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Structural wire-format violation.
    ///
    /// Missing required keys, values of the wrong shape, and inconsistent
    /// input-id references all land here. The message names the offending
    /// field.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A decoded literal value is incompatible with its declared type,
    /// e.g. a JSON string where the declared type is numeric.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Internal error indicating a bug or violated invariant.
    ///
    /// This should never occur during normal operation. It is not a
    /// user-recoverable condition.
    #[error("an internal operation failed: {0}")]
    Internal(String),

    /// Wrapper attaching the originating node id to a decode failure.
    ///
    /// Plan decoding is all-or-nothing; the first failing record aborts
    /// the decode and its id travels with the underlying error.
    #[error("decode failed at node {node_id}: {source}")]
    NodeDecode {
        node_id: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a malformed-document error from any displayable message.
    #[inline]
    pub fn malformed<M: fmt::Display>(msg: M) -> Self {
        Error::MalformedDocument(msg.to_string())
    }

    /// Create a type-mismatch error from any displayable message.
    #[inline]
    pub fn type_mismatch<M: fmt::Display>(msg: M) -> Self {
        Error::TypeMismatch(msg.to_string())
    }

    /// Attach a node id to this error, unless one is already attached.
    ///
    /// Used by the plan reader so nested decode helpers can stay oblivious
    /// to record ids while the top-level loop still reports them.
    pub fn at_node(self, node_id: impl Into<String>) -> Self {
        match self {
            Error::NodeDecode { .. } => self,
            other => Error::NodeDecode {
                node_id: node_id.into(),
                source: Box::new(other),
            },
        }
    }

    /// The node id attached to this error, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Error::NodeDecode { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}
