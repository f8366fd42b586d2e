//! Scalar expression AST.

use std::sync::Arc;

use relwire_ops::OperatorDef;
use relwire_result::{Error, Result};
use relwire_types::{LiteralValue, RelType};

/// A typed scalar expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    /// A constant with its declared type.
    Literal { value: LiteralValue, ty: RelType },
    /// Reference to a field of the node's inputs, by ordinal into the
    /// concatenated input row type.
    InputRef { index: usize, ty: RelType },
    /// An operator call.
    Call(CallExpr),
    /// A correlation variable (`$cor0`), typed independently of the
    /// current inputs.
    Correl { name: String, ty: RelType },
    /// A dynamic parameter placeholder (`?0`), typed independently of the
    /// current inputs.
    DynamicParam { index: usize, ty: RelType },
}

impl ScalarExpr {
    pub fn literal(value: impl Into<LiteralValue>, ty: RelType) -> Self {
        ScalarExpr::Literal {
            value: value.into(),
            ty,
        }
    }

    pub fn input(index: usize, ty: RelType) -> Self {
        ScalarExpr::InputRef { index, ty }
    }

    pub fn correl(name: impl Into<String>, ty: RelType) -> Self {
        ScalarExpr::Correl {
            name: name.into(),
            ty,
        }
    }

    pub fn dynamic_param(index: usize, ty: RelType) -> Self {
        ScalarExpr::DynamicParam { index, ty }
    }

    /// Build a call, deriving the result type from the operator's return
    /// rule. Fails for operators whose result type is not derivable; use
    /// [`ScalarExpr::call_with_type`] for those.
    pub fn call(op: Arc<OperatorDef>, operands: Vec<ScalarExpr>) -> Result<Self> {
        let operand_types: Vec<RelType> = operands.iter().map(|e| e.ty().clone()).collect();
        let ty = op.returns.infer(&operand_types).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "operator {} requires an explicit result type",
                op.name
            ))
        })?;
        Ok(ScalarExpr::Call(CallExpr {
            op,
            operands,
            ty,
            distinct: false,
            window: None,
        }))
    }

    /// Build a call with an explicit result type (CAST-like operators).
    pub fn call_with_type(op: Arc<OperatorDef>, operands: Vec<ScalarExpr>, ty: RelType) -> Self {
        ScalarExpr::Call(CallExpr {
            op,
            operands,
            ty,
            distinct: false,
            window: None,
        })
    }

    /// Build a windowed aggregate call.
    pub fn window_call(
        op: Arc<OperatorDef>,
        operands: Vec<ScalarExpr>,
        ty: RelType,
        distinct: bool,
        window: WindowSpec,
    ) -> Self {
        ScalarExpr::Call(CallExpr {
            op,
            operands,
            ty,
            distinct,
            window: Some(window),
        })
    }

    /// The node's resolved type.
    pub fn ty(&self) -> &RelType {
        match self {
            ScalarExpr::Literal { ty, .. }
            | ScalarExpr::InputRef { ty, .. }
            | ScalarExpr::Correl { ty, .. }
            | ScalarExpr::DynamicParam { ty, .. } => ty,
            ScalarExpr::Call(call) => &call.ty,
        }
    }
}

/// An operator call, optionally windowed.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub op: Arc<OperatorDef>,
    pub operands: Vec<ScalarExpr>,
    pub ty: RelType,
    pub distinct: bool,
    pub window: Option<WindowSpec>,
}

/// Sort direction of an ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }

    pub fn parse(text: &str) -> Option<Direction> {
        Some(match text {
            "ASCENDING" => Direction::Ascending,
            "DESCENDING" => Direction::Descending,
            _ => return None,
        })
    }
}

/// Where nulls sort relative to values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullDirection {
    First,
    Last,
}

impl NullDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            NullDirection::First => "FIRST",
            NullDirection::Last => "LAST",
        }
    }

    pub fn parse(text: &str) -> Option<NullDirection> {
        Some(match text {
            "FIRST" => NullDirection::First,
            "LAST" => NullDirection::Last,
            _ => return None,
        })
    }
}

/// One ordering key of a window specification.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub expr: ScalarExpr,
    pub direction: Direction,
    pub null_direction: NullDirection,
}

impl OrderKey {
    pub fn ascending(expr: ScalarExpr) -> Self {
        Self {
            expr,
            direction: Direction::Ascending,
            null_direction: NullDirection::Last,
        }
    }
}

/// Frame bound unit system: the two systems are mutually exclusive on the
/// wire (`rows-lower`/`rows-upper` vs `range-lower`/`range-upper`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameUnits {
    Rows,
    Range,
}

/// One frame bound.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowBound {
    UnboundedPreceding,
    CurrentRow,
    /// Offset preceding the current row; the offset is a literal
    /// expression.
    Preceding(Box<ScalarExpr>),
    /// Offset following the current row.
    Following(Box<ScalarExpr>),
}

/// A window frame: unit system plus lower/upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub lower: WindowBound,
    pub upper: WindowBound,
}

impl WindowFrame {
    /// `ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW`, the common
    /// default.
    pub fn rows_unbounded_to_current() -> Self {
        Self {
            units: FrameUnits::Rows,
            lower: WindowBound::UnboundedPreceding,
            upper: WindowBound::CurrentRow,
        }
    }
}

/// A window specification attached to an aggregate call.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub partition: Vec<ScalarExpr>,
    pub order: Vec<OrderKey>,
    pub frame: WindowFrame,
}

#[cfg(test)]
mod tests {
    use super::*;
    use relwire_ops::OperatorRegistry;
    use relwire_types::LiteralValue;

    #[test]
    fn call_infers_type_from_operator_rule() {
        let registry = OperatorRegistry::standard();
        let plus = registry
            .lookup_wire("+", "PLUS", "BINARY")
            .expect("+ is standard");
        let call = ScalarExpr::call(
            plus,
            vec![
                ScalarExpr::input(0, RelType::integer()),
                ScalarExpr::literal(2i64, RelType::integer()),
            ],
        )
        .unwrap();
        assert_eq!(call.ty(), &RelType::integer());
    }

    #[test]
    fn explicit_rule_operators_refuse_inference() {
        let registry = OperatorRegistry::standard();
        let cast = registry.lookup_wire("CAST", "CAST", "SPECIAL").unwrap();
        let operand = ScalarExpr::input(0, RelType::integer());
        assert!(ScalarExpr::call(cast.clone(), vec![operand.clone()]).is_err());

        let typed = ScalarExpr::call_with_type(cast, vec![operand], RelType::varchar(None));
        assert_eq!(typed.ty(), &RelType::varchar(None));
    }

    #[test]
    fn literal_carries_declared_type() {
        let e = ScalarExpr::literal(LiteralValue::Null, RelType::integer());
        assert_eq!(e.ty(), &RelType::integer());
    }
}
