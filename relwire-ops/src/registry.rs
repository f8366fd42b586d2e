//! Operator registry: the standard table plus named extension libraries.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use relwire_types::RelType;

use crate::operator::{KindTag, OperatorDef, ReturnTypeRule, SyntaxForm};

type OpKey = (String, String, String);

fn key(name: &str, kind: &KindTag, syntax: SyntaxForm) -> OpKey {
    (
        name.to_ascii_uppercase(),
        kind.as_str().to_string(),
        syntax.as_str().to_string(),
    )
}

struct Library {
    name: String,
    ops: FxHashMap<OpKey, Arc<OperatorDef>>,
}

/// Resolves operator identities for the decode path.
///
/// Lookup consults the built-in standard table first, then each registered
/// library in registration order. The registry is populated once at
/// startup/extension-load time and treated as read-only afterward.
pub struct OperatorRegistry {
    builtins: FxHashMap<OpKey, Arc<OperatorDef>>,
    libraries: Vec<Library>,
}

impl OperatorRegistry {
    /// Registry with no operators at all (useful in tests).
    pub fn empty() -> Self {
        Self {
            builtins: FxHashMap::default(),
            libraries: Vec::new(),
        }
    }

    /// Registry pre-populated with the standard operator table.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for op in standard_operators() {
            registry.register_builtin(op);
        }
        registry
    }

    fn register_builtin(&mut self, op: OperatorDef) {
        self.builtins
            .insert(key(&op.name, &op.kind, op.syntax), Arc::new(op));
    }

    /// Register a named library of additional operators. Decoding consults
    /// libraries after the built-in table, in registration order.
    pub fn register_library(
        &mut self,
        name: impl Into<String>,
        ops: impl IntoIterator<Item = OperatorDef>,
    ) {
        let mut table = FxHashMap::default();
        for op in ops {
            table.insert(key(&op.name, &op.kind, op.syntax), Arc::new(op));
        }
        self.libraries.push(Library {
            name: name.into(),
            ops: table,
        });
    }

    /// Builder-style variant of [`register_library`](Self::register_library).
    pub fn with_library(
        mut self,
        name: impl Into<String>,
        ops: impl IntoIterator<Item = OperatorDef>,
    ) -> Self {
        self.register_library(name, ops);
        self
    }

    /// Resolve an identity triple to a definition.
    pub fn lookup(
        &self,
        name: &str,
        kind: &KindTag,
        syntax: SyntaxForm,
    ) -> Option<Arc<OperatorDef>> {
        let k = key(name, kind, syntax);
        if let Some(op) = self.builtins.get(&k) {
            return Some(Arc::clone(op));
        }
        self.libraries
            .iter()
            .find_map(|lib| lib.ops.get(&k).map(Arc::clone))
    }

    /// Names of the registered extension libraries, in lookup order.
    pub fn library_names(&self) -> Vec<&str> {
        self.libraries.iter().map(|lib| lib.name.as_str()).collect()
    }

    /// Convenience lookup by wire strings, parsing the tag and syntax.
    pub fn lookup_wire(
        &self,
        name: &str,
        kind: &str,
        syntax: &str,
    ) -> Option<Arc<OperatorDef>> {
        let syntax = SyntaxForm::parse(syntax)?;
        self.lookup(name, &KindTag::parse(kind), syntax)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn bool_nullable() -> ReturnTypeRule {
    ReturnTypeRule::Fixed(RelType::boolean().with_nullable(true))
}

fn bool_not_null() -> ReturnTypeRule {
    ReturnTypeRule::Fixed(RelType::boolean())
}

/// The built-in standard operator table.
fn standard_operators() -> Vec<OperatorDef> {
    use crate::operator::OperandRule;
    use KindTag::*;
    use SyntaxForm::*;

    vec![
        // Comparisons
        OperatorDef::scalar("=", Equals, Binary, bool_nullable()),
        OperatorDef::scalar("<>", NotEquals, Binary, bool_nullable()),
        OperatorDef::scalar("<", LessThan, Binary, bool_nullable()),
        OperatorDef::scalar("<=", LessThanOrEqual, Binary, bool_nullable()),
        OperatorDef::scalar(">", GreaterThan, Binary, bool_nullable()),
        OperatorDef::scalar(">=", GreaterThanOrEqual, Binary, bool_nullable()),
        OperatorDef::scalar("IS NULL", IsNull, Postfix, bool_not_null()),
        OperatorDef::scalar("IS NOT NULL", IsNotNull, Postfix, bool_not_null()),
        // Arithmetic
        OperatorDef::scalar("+", Plus, Binary, ReturnTypeRule::FirstArg),
        OperatorDef::scalar("-", Minus, Binary, ReturnTypeRule::FirstArg),
        OperatorDef::scalar("*", Times, Binary, ReturnTypeRule::FirstArg),
        OperatorDef::scalar("/", Divide, Binary, ReturnTypeRule::FirstArg),
        OperatorDef::scalar("-", MinusPrefix, Prefix, ReturnTypeRule::FirstArg),
        // Logical
        OperatorDef::scalar("AND", And, Binary, bool_nullable()),
        OperatorDef::scalar("OR", Or, Binary, bool_nullable()),
        OperatorDef::scalar("NOT", Not, Prefix, bool_nullable()),
        // Conversions and special forms: results are not derivable from
        // operands, so encoded calls carry their type.
        OperatorDef::scalar("CAST", Cast, Special, ReturnTypeRule::Explicit),
        OperatorDef::scalar("CASE", Case, Special, ReturnTypeRule::Explicit)
            .with_operands(OperandRule::Variadic),
        OperatorDef::scalar("LIKE", Like, Special, bool_nullable()),
        OperatorDef::scalar("||", Other, Binary, ReturnTypeRule::FirstArgNullable),
        // Aggregates; COUNT is variadic to cover both `COUNT(*)` and
        // `COUNT(expr…)` calls.
        OperatorDef::aggregate(
            "COUNT",
            Count,
            ReturnTypeRule::Fixed(RelType::bigint()),
        )
        .with_syntax(FunctionStar)
        .with_operands(OperandRule::Variadic),
        OperatorDef::aggregate("SUM", Sum, ReturnTypeRule::FirstArgNullable),
        OperatorDef::aggregate("MIN", Min, ReturnTypeRule::FirstArgNullable),
        OperatorDef::aggregate("MAX", Max, ReturnTypeRule::FirstArgNullable),
        OperatorDef::aggregate("AVG", Avg, ReturnTypeRule::FirstArgNullable),
        OperatorDef::aggregate("SINGLE_VALUE", SingleValue, ReturnTypeRule::FirstArgNullable),
    ]
}

/// An optional library of non-standard operators: dialect extensions that
/// documents may reference but the standard table does not carry.
pub fn extended_library() -> Vec<OperatorDef> {
    vec![
        OperatorDef::scalar(
            "SAFE_CAST",
            KindTag::SafeCast,
            SyntaxForm::Function,
            ReturnTypeRule::Explicit,
        ),
        OperatorDef::scalar(
            "CURRENT_DATETIME",
            KindTag::OtherFunction,
            SyntaxForm::FunctionId,
            ReturnTypeRule::Fixed(RelType::timestamp().with_nullable(true)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lookup_hits_and_misses() {
        let registry = OperatorRegistry::standard();
        let eq = registry
            .lookup("=", &KindTag::Equals, SyntaxForm::Binary)
            .expect("= is standard");
        assert_eq!(eq.name, "=");

        // Same name, wrong syntax: no match.
        assert!(registry
            .lookup("=", &KindTag::Equals, SyntaxForm::Function)
            .is_none());
        // Mutated name: no silent substitution.
        assert!(registry
            .lookup("MAXS", &KindTag::Max, SyntaxForm::Function)
            .is_none());
    }

    #[test]
    fn lookup_is_case_insensitive_on_name() {
        let registry = OperatorRegistry::standard();
        assert!(registry
            .lookup("count", &KindTag::Count, SyntaxForm::FunctionStar)
            .is_some());
    }

    #[test]
    fn libraries_resolve_after_builtins() {
        let registry = OperatorRegistry::standard().with_library("extended", extended_library());
        assert_eq!(registry.library_names(), vec!["extended"]);
        let safe_cast = registry
            .lookup("SAFE_CAST", &KindTag::SafeCast, SyntaxForm::Function)
            .expect("library operator resolves");
        assert!(safe_cast.returns.needs_explicit_type());

        let bare = OperatorRegistry::standard();
        assert!(bare
            .lookup("SAFE_CAST", &KindTag::SafeCast, SyntaxForm::Function)
            .is_none());
    }

    #[test]
    fn wire_lookup_parses_identity_strings() {
        let registry = OperatorRegistry::standard();
        assert!(registry.lookup_wire("COUNT", "COUNT", "FUNCTION_STAR").is_some());
        assert!(registry.lookup_wire("COUNT", "COUNT", "NO_SUCH_SYNTAX").is_none());
    }
}
