//! Name matching policy.
//!
//! One matcher instance is configured per resolver and applied uniformly:
//! schema, table, and function lookup, and row-field lookup by alias.

use relwire_types::{RelField, RelType};

/// Case-sensitivity-configurable name comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameMatcher {
    case_sensitive: bool,
}

impl NameMatcher {
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }

    pub fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
        }
    }

    pub fn with_case_sensitive(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    #[inline]
    pub fn is_case_sensitive(self) -> bool {
        self.case_sensitive
    }

    /// Whether `candidate` matches the requested `name` under this policy.
    #[inline]
    pub fn matches(self, candidate: &str, name: &str) -> bool {
        if self.case_sensitive {
            candidate == name
        } else {
            candidate.eq_ignore_ascii_case(name)
        }
    }

    /// Look up a field of a row type by alias. Returns the ordinal and the
    /// field, or `None` when the alias does not match (or the type is not
    /// a row).
    pub fn field_of<'a>(
        self,
        row_type: &'a RelType,
        alias: &str,
    ) -> Option<(usize, &'a RelField)> {
        row_type
            .fields()?
            .iter()
            .enumerate()
            .find(|(_, field)| self.matches(&field.name, alias))
    }
}
