//! Resolver configuration.

/// Dialect conformance, as far as operator conversion cares about it: the
/// default conformance accepts both bare-identifier and call form for
/// niladic functions, other conformances pick one based on whether the
/// dialect allows niladic parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conformance {
    Default,
    Custom { allow_niladic_parentheses: bool },
}

/// Per-resolver configuration, bound once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub case_sensitive: bool,
    pub conformance: Conformance,
    /// Character set assumed for string literals that carry none.
    pub default_charset: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            conformance: Conformance::Default,
            default_charset: "ISO-8859-1".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_conformance(mut self, conformance: Conformance) -> Self {
        self.conformance = conformance;
        self
    }
}
