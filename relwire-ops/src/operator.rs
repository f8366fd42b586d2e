//! Operator definitions: identity, operand metadata, and type inference.

use std::fmt;
use std::sync::Arc;

use relwire_types::{RelType, TypeKind};

/// Kind tag half of an operator's wire identity.
///
/// The well-known tags form a closed core set; anything else round-trips
/// through [`KindTag::Custom`] so extension operators keep their tags
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KindTag {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    IsNull,
    IsNotNull,
    Plus,
    Minus,
    Times,
    Divide,
    MinusPrefix,
    And,
    Or,
    Not,
    Cast,
    SafeCast,
    Case,
    Like,
    Count,
    Sum,
    Min,
    Max,
    Avg,
    SingleValue,
    OtherFunction,
    Other,
    Custom(String),
}

impl KindTag {
    pub fn as_str(&self) -> &str {
        match self {
            KindTag::Equals => "EQUALS",
            KindTag::NotEquals => "NOT_EQUALS",
            KindTag::LessThan => "LESS_THAN",
            KindTag::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            KindTag::GreaterThan => "GREATER_THAN",
            KindTag::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            KindTag::IsNull => "IS_NULL",
            KindTag::IsNotNull => "IS_NOT_NULL",
            KindTag::Plus => "PLUS",
            KindTag::Minus => "MINUS",
            KindTag::Times => "TIMES",
            KindTag::Divide => "DIVIDE",
            KindTag::MinusPrefix => "MINUS_PREFIX",
            KindTag::And => "AND",
            KindTag::Or => "OR",
            KindTag::Not => "NOT",
            KindTag::Cast => "CAST",
            KindTag::SafeCast => "SAFE_CAST",
            KindTag::Case => "CASE",
            KindTag::Like => "LIKE",
            KindTag::Count => "COUNT",
            KindTag::Sum => "SUM",
            KindTag::Min => "MIN",
            KindTag::Max => "MAX",
            KindTag::Avg => "AVG",
            KindTag::SingleValue => "SINGLE_VALUE",
            KindTag::OtherFunction => "OTHER_FUNCTION",
            KindTag::Other => "OTHER",
            KindTag::Custom(tag) => tag,
        }
    }

    /// Parse a wire tag; unknown tags become [`KindTag::Custom`].
    pub fn parse(tag: &str) -> KindTag {
        match tag {
            "EQUALS" => KindTag::Equals,
            "NOT_EQUALS" => KindTag::NotEquals,
            "LESS_THAN" => KindTag::LessThan,
            "LESS_THAN_OR_EQUAL" => KindTag::LessThanOrEqual,
            "GREATER_THAN" => KindTag::GreaterThan,
            "GREATER_THAN_OR_EQUAL" => KindTag::GreaterThanOrEqual,
            "IS_NULL" => KindTag::IsNull,
            "IS_NOT_NULL" => KindTag::IsNotNull,
            "PLUS" => KindTag::Plus,
            "MINUS" => KindTag::Minus,
            "TIMES" => KindTag::Times,
            "DIVIDE" => KindTag::Divide,
            "MINUS_PREFIX" => KindTag::MinusPrefix,
            "AND" => KindTag::And,
            "OR" => KindTag::Or,
            "NOT" => KindTag::Not,
            "CAST" => KindTag::Cast,
            "SAFE_CAST" => KindTag::SafeCast,
            "CASE" => KindTag::Case,
            "LIKE" => KindTag::Like,
            "COUNT" => KindTag::Count,
            "SUM" => KindTag::Sum,
            "MIN" => KindTag::Min,
            "MAX" => KindTag::Max,
            "AVG" => KindTag::Avg,
            "SINGLE_VALUE" => KindTag::SingleValue,
            "OTHER_FUNCTION" => KindTag::OtherFunction,
            "OTHER" => KindTag::Other,
            other => KindTag::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syntax form half of an operator's wire identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxForm {
    Function,
    /// Function call that also accepts `*` as its argument (COUNT).
    FunctionStar,
    /// Bare identifier, no parentheses allowed.
    FunctionId,
    /// Bare identifier or empty call form, both accepted.
    FunctionIdConstant,
    Binary,
    Prefix,
    Postfix,
    Special,
    Internal,
}

impl SyntaxForm {
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxForm::Function => "FUNCTION",
            SyntaxForm::FunctionStar => "FUNCTION_STAR",
            SyntaxForm::FunctionId => "FUNCTION_ID",
            SyntaxForm::FunctionIdConstant => "FUNCTION_ID_CONSTANT",
            SyntaxForm::Binary => "BINARY",
            SyntaxForm::Prefix => "PREFIX",
            SyntaxForm::Postfix => "POSTFIX",
            SyntaxForm::Special => "SPECIAL",
            SyntaxForm::Internal => "INTERNAL",
        }
    }

    pub fn parse(text: &str) -> Option<SyntaxForm> {
        Some(match text {
            "FUNCTION" => SyntaxForm::Function,
            "FUNCTION_STAR" => SyntaxForm::FunctionStar,
            "FUNCTION_ID" => SyntaxForm::FunctionId,
            "FUNCTION_ID_CONSTANT" => SyntaxForm::FunctionIdConstant,
            "BINARY" => SyntaxForm::Binary,
            "PREFIX" => SyntaxForm::Prefix,
            "POSTFIX" => SyntaxForm::Postfix,
            "SPECIAL" => SyntaxForm::Special,
            "INTERNAL" => SyntaxForm::Internal,
            _ => return None,
        })
    }
}

impl fmt::Display for SyntaxForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse type family used for overload disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Numeric,
    Character,
    Binary,
    Boolean,
    Date,
    Time,
    Timestamp,
    IntervalYearMonth,
    IntervalDayTime,
    Any,
}

impl TypeFamily {
    /// The family a type belongs to. Kinds with no specific family map to
    /// [`TypeFamily::Any`].
    pub fn of(ty: &RelType) -> TypeFamily {
        match ty.kind() {
            kind if kind.is_numeric() => TypeFamily::Numeric,
            kind if kind.is_character() => TypeFamily::Character,
            kind if kind.is_binary() => TypeFamily::Binary,
            TypeKind::Boolean => TypeFamily::Boolean,
            TypeKind::Date => TypeFamily::Date,
            TypeKind::Time => TypeFamily::Time,
            TypeKind::Timestamp | TypeKind::TimestampWithLocalTimeZone => TypeFamily::Timestamp,
            TypeKind::Interval(unit) if unit.is_year_month() => TypeFamily::IntervalYearMonth,
            TypeKind::Interval(_) => TypeFamily::IntervalDayTime,
            _ => TypeFamily::Any,
        }
    }
}

/// Per-parameter metadata recorded at operator registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMetadata {
    pub name: String,
    pub ty: RelType,
    pub family: TypeFamily,
    pub optional: bool,
}

/// Operand-type rule bound at registration time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OperandRule {
    /// No registered constraint (built-ins validated upstream).
    #[default]
    Any,
    /// Explicit binding to the parameter list recorded at registration;
    /// never re-derived per call.
    Explicit(Vec<ParamMetadata>),
    /// Accepts any operand count.
    Variadic,
}

/// Return-type inference rule.
#[derive(Clone)]
pub enum ReturnTypeRule {
    /// Always the given type.
    Fixed(RelType),
    /// The type of the first operand.
    FirstArg,
    /// The type of the first operand, forced nullable.
    FirstArgNullable,
    /// Always CURSOR (table functions and table macros).
    Cursor,
    /// Not derivable from operands; the wire record must carry an explicit
    /// result type.
    Explicit,
    /// Computed from the call's operand types (binding-aware catalog
    /// functions).
    Binding(Arc<dyn Fn(&[RelType]) -> RelType + Send + Sync>),
}

impl ReturnTypeRule {
    /// Infer the call's result type from its operand types, or `None` when
    /// the rule requires an explicit wire type.
    pub fn infer(&self, operand_types: &[RelType]) -> Option<RelType> {
        match self {
            ReturnTypeRule::Fixed(ty) => Some(ty.clone()),
            ReturnTypeRule::FirstArg => operand_types.first().cloned(),
            ReturnTypeRule::FirstArgNullable => {
                operand_types.first().cloned().map(|ty| ty.with_nullable(true))
            }
            ReturnTypeRule::Cursor => Some(RelType::cursor()),
            ReturnTypeRule::Explicit => None,
            ReturnTypeRule::Binding(infer) => Some(infer(operand_types)),
        }
    }

    /// Whether encoded calls of this operator must carry their result type.
    pub fn needs_explicit_type(&self) -> bool {
        matches!(self, ReturnTypeRule::Explicit)
    }
}

impl fmt::Debug for ReturnTypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnTypeRule::Fixed(ty) => f.debug_tuple("Fixed").field(ty).finish(),
            ReturnTypeRule::FirstArg => f.write_str("FirstArg"),
            ReturnTypeRule::FirstArgNullable => f.write_str("FirstArgNullable"),
            ReturnTypeRule::Cursor => f.write_str("Cursor"),
            ReturnTypeRule::Explicit => f.write_str("Explicit"),
            ReturnTypeRule::Binding(_) => f.write_str("Binding(..)"),
        }
    }
}

/// Which call position an operator is legal in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Scalar,
    Aggregate,
    TableFunction,
    TableMacro,
}

/// A callable operator usable inside expressions.
///
/// Identity for wire purposes is (name, kind, syntax); equality compares
/// exactly that triple, with names compared case-insensitively the way the
/// registry looks them up.
#[derive(Debug, Clone)]
pub struct OperatorDef {
    pub name: String,
    pub kind: KindTag,
    pub syntax: SyntaxForm,
    pub category: OperatorCategory,
    pub operands: OperandRule,
    pub returns: ReturnTypeRule,
}

impl OperatorDef {
    pub fn new(
        name: impl Into<String>,
        kind: KindTag,
        syntax: SyntaxForm,
        category: OperatorCategory,
        returns: ReturnTypeRule,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            syntax,
            category,
            operands: OperandRule::Any,
            returns,
        }
    }

    /// Scalar operator shorthand.
    pub fn scalar(
        name: impl Into<String>,
        kind: KindTag,
        syntax: SyntaxForm,
        returns: ReturnTypeRule,
    ) -> Self {
        Self::new(name, kind, syntax, OperatorCategory::Scalar, returns)
    }

    /// Aggregate operator shorthand.
    pub fn aggregate(name: impl Into<String>, kind: KindTag, returns: ReturnTypeRule) -> Self {
        Self::new(
            name,
            kind,
            SyntaxForm::Function,
            OperatorCategory::Aggregate,
            returns,
        )
    }

    pub fn with_syntax(mut self, syntax: SyntaxForm) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_operands(mut self, operands: OperandRule) -> Self {
        self.operands = operands;
        self
    }

    pub fn is_aggregate(&self) -> bool {
        self.category == OperatorCategory::Aggregate
    }

    /// Whether the identity triples match (the wire notion of "same
    /// operator").
    pub fn same_identity(&self, other: &OperatorDef) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.kind == other.kind
            && self.syntax == other.syntax
    }
}

impl PartialEq for OperatorDef {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for OperatorDef {}

impl fmt::Display for OperatorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}, {}]", self.name, self.kind, self.syntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_round_trip_including_custom() {
        assert_eq!(KindTag::parse("EQUALS"), KindTag::Equals);
        assert_eq!(KindTag::parse("COUNT").as_str(), "COUNT");
        let custom = KindTag::parse("MY_KIND");
        assert_eq!(custom, KindTag::Custom("MY_KIND".into()));
        assert_eq!(custom.as_str(), "MY_KIND");
    }

    #[test]
    fn syntax_parse_is_total_over_as_str() {
        for syntax in [
            SyntaxForm::Function,
            SyntaxForm::FunctionStar,
            SyntaxForm::FunctionId,
            SyntaxForm::FunctionIdConstant,
            SyntaxForm::Binary,
            SyntaxForm::Prefix,
            SyntaxForm::Postfix,
            SyntaxForm::Special,
            SyntaxForm::Internal,
        ] {
            assert_eq!(SyntaxForm::parse(syntax.as_str()), Some(syntax));
        }
        assert_eq!(SyntaxForm::parse("TERNARY"), None);
    }

    #[test]
    fn identity_equality_ignores_inference_rules() {
        let a = OperatorDef::scalar("=", KindTag::Equals, SyntaxForm::Binary, ReturnTypeRule::Explicit);
        let b = OperatorDef::scalar(
            "=",
            KindTag::Equals,
            SyntaxForm::Binary,
            ReturnTypeRule::Fixed(RelType::boolean()),
        );
        assert_eq!(a, b);
        let c = OperatorDef::scalar("=", KindTag::Equals, SyntaxForm::Special, ReturnTypeRule::Explicit);
        assert_ne!(a, c);
    }

    #[test]
    fn first_arg_nullable_inference() {
        let rule = ReturnTypeRule::FirstArgNullable;
        let inferred = rule.infer(&[RelType::integer()]).unwrap();
        assert!(inferred.nullable());
        assert_eq!(rule.infer(&[]), None);
    }

    #[test]
    fn family_assignment() {
        assert_eq!(TypeFamily::of(&RelType::decimal(10, 2)), TypeFamily::Numeric);
        assert_eq!(TypeFamily::of(&RelType::varchar(None)), TypeFamily::Character);
        assert_eq!(TypeFamily::of(&RelType::any()), TypeFamily::Any);
        assert_eq!(
            TypeFamily::of(&RelType::interval(relwire_types::IntervalUnit::Month)),
            TypeFamily::IntervalYearMonth
        );
    }
}
