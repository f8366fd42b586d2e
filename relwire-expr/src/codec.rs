//! Wire codec for scalar expressions.
//!
//! Encoding needs no context; decoding resolves operator identities
//! through an [`OperatorRegistry`] and input ordinals against the
//! concatenated row fields of the current inputs, both supplied via
//! [`ExprContext`]. An [`InputTranslator`] hook can replace the default
//! input-reference strategy, e.g. to remap ordinals under an external
//! renumbering.

use serde_json::{Map, Value};

use relwire_ops::OperatorRegistry;
use relwire_result::{Error, Result};
use relwire_types::codec::{decode_literal, decode_type, encode_literal, encode_type};
use relwire_types::{RelField, RelType};

use crate::expr::{
    CallExpr, Direction, FrameUnits, NullDirection, OrderKey, ScalarExpr, WindowBound,
    WindowFrame, WindowSpec,
};

/// Pluggable strategy for decoding input references.
pub trait InputTranslator {
    fn translate_input(&self, index: usize, ctx: &ExprContext<'_>) -> Result<ScalarExpr>;
}

/// Decode-side context: the operator registry plus the row fields of the
/// node's current inputs.
pub struct ExprContext<'a> {
    registry: &'a OperatorRegistry,
    fields: Vec<RelField>,
    translator: Option<&'a dyn InputTranslator>,
}

impl<'a> ExprContext<'a> {
    pub fn new(registry: &'a OperatorRegistry) -> Self {
        Self {
            registry,
            fields: Vec::new(),
            translator: None,
        }
    }

    /// Append the fields of each input row type, in input order.
    pub fn with_input_rows(mut self, rows: &[RelType]) -> Self {
        for row in rows {
            if let Some(fields) = row.fields() {
                self.fields.extend(fields.iter().cloned());
            }
        }
        self
    }

    pub fn with_fields(mut self, fields: Vec<RelField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_translator(mut self, translator: &'a dyn InputTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn registry(&self) -> &OperatorRegistry {
        self.registry
    }

    /// The concatenated row fields of all current inputs.
    pub fn fields(&self) -> &[RelField] {
        &self.fields
    }
}

/// Encode an expression as a structured value.
pub fn encode_expr(expr: &ScalarExpr) -> Result<Value> {
    let mut map = Map::new();
    match expr {
        ScalarExpr::Literal { value, ty } => {
            map.insert("literal".into(), encode_literal(value, ty)?);
            map.insert("type".into(), encode_type(ty));
        }
        ScalarExpr::InputRef { index, .. } => {
            map.insert("input".into(), Value::Number((*index as u64).into()));
            // Diagnostics only; decode relies on the ordinal.
            map.insert("name".into(), Value::String(format!("${index}")));
        }
        ScalarExpr::Call(call) => {
            map.insert("op".into(), op_identity(call));
            let operands = call
                .operands
                .iter()
                .map(encode_expr)
                .collect::<Result<Vec<_>>>()?;
            map.insert("operands".into(), Value::Array(operands));
            match &call.window {
                Some(window) => {
                    // Windowed calls always carry distinctness and type.
                    map.insert("distinct".into(), Value::Bool(call.distinct));
                    map.insert("type".into(), encode_type(&call.ty));
                    map.insert("window".into(), encode_window(window)?);
                }
                None => {
                    if call.op.returns.needs_explicit_type() {
                        map.insert("type".into(), encode_type(&call.ty));
                    }
                }
            }
        }
        ScalarExpr::Correl { name, ty } => {
            map.insert("correl".into(), Value::String(name.clone()));
            map.insert("type".into(), encode_type(ty));
        }
        ScalarExpr::DynamicParam { index, ty } => {
            map.insert("dynamicParam".into(), Value::Number((*index as u64).into()));
            map.insert("type".into(), encode_type(ty));
        }
    }
    Ok(Value::Object(map))
}

fn op_identity(call: &CallExpr) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(call.op.name.clone()));
    map.insert(
        "kind".into(),
        Value::String(call.op.kind.as_str().to_string()),
    );
    map.insert(
        "syntax".into(),
        Value::String(call.op.syntax.as_str().to_string()),
    );
    Value::Object(map)
}

fn encode_window(window: &WindowSpec) -> Result<Value> {
    let mut map = Map::new();
    if !window.partition.is_empty() {
        let keys = window
            .partition
            .iter()
            .map(encode_expr)
            .collect::<Result<Vec<_>>>()?;
        map.insert("partition".into(), Value::Array(keys));
    }
    if !window.order.is_empty() {
        let keys = window
            .order
            .iter()
            .map(encode_order_key)
            .collect::<Result<Vec<_>>>()?;
        map.insert("order".into(), Value::Array(keys));
    }
    let (lower_key, upper_key) = match window.frame.units {
        FrameUnits::Rows => ("rows-lower", "rows-upper"),
        FrameUnits::Range => ("range-lower", "range-upper"),
    };
    map.insert(lower_key.into(), encode_bound(&window.frame.lower)?);
    map.insert(upper_key.into(), encode_bound(&window.frame.upper)?);
    Ok(Value::Object(map))
}

fn encode_order_key(key: &OrderKey) -> Result<Value> {
    let mut map = Map::new();
    map.insert("expr".into(), encode_expr(&key.expr)?);
    map.insert(
        "direction".into(),
        Value::String(key.direction.as_str().to_string()),
    );
    map.insert(
        "null-direction".into(),
        Value::String(key.null_direction.as_str().to_string()),
    );
    Ok(Value::Object(map))
}

fn encode_bound(bound: &WindowBound) -> Result<Value> {
    let mut map = Map::new();
    match bound {
        WindowBound::UnboundedPreceding => {
            map.insert("type".into(), Value::String("UNBOUNDED_PRECEDING".into()));
        }
        WindowBound::CurrentRow => {
            map.insert("type".into(), Value::String("CURRENT_ROW".into()));
        }
        WindowBound::Preceding(offset) => {
            map.insert("type".into(), Value::String("PRECEDING".into()));
            map.insert("offset".into(), encode_expr(offset)?);
        }
        WindowBound::Following(offset) => {
            map.insert("type".into(), Value::String("FOLLOWING".into()));
            map.insert("offset".into(), encode_expr(offset)?);
        }
    }
    Ok(Value::Object(map))
}

/// Decode an expression from a structured value.
pub fn decode_expr(value: &Value, ctx: &ExprContext<'_>) -> Result<ScalarExpr> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed(format!("expression must be an object, got {value}")))?;

    if map.contains_key("literal") {
        return decode_literal_expr(map);
    }
    if let Some(index) = map.get("input") {
        return decode_input(index, ctx);
    }
    if let Some(name) = map.get("correl") {
        let name = name
            .as_str()
            .ok_or_else(|| Error::malformed("'correl' must be a string"))?;
        let ty = required_type(map)?;
        return Ok(ScalarExpr::correl(name, ty));
    }
    if let Some(index) = map.get("dynamicParam") {
        let index = index
            .as_u64()
            .ok_or_else(|| Error::malformed("'dynamicParam' must be an ordinal"))?;
        let ty = required_type(map)?;
        return Ok(ScalarExpr::dynamic_param(index as usize, ty));
    }
    if map.contains_key("op") {
        return decode_call(map, ctx);
    }
    Err(Error::malformed(format!(
        "unrecognized expression shape: {value}"
    )))
}

fn decode_literal_expr(map: &Map<String, Value>) -> Result<ScalarExpr> {
    let ty = required_type(map)?;
    let value = decode_literal(&map["literal"], &ty)?;
    Ok(ScalarExpr::Literal { value, ty })
}

fn decode_input(index: &Value, ctx: &ExprContext<'_>) -> Result<ScalarExpr> {
    let index = index
        .as_u64()
        .ok_or_else(|| Error::malformed("'input' must be an ordinal"))? as usize;
    if let Some(translator) = ctx.translator {
        return translator.translate_input(index, ctx);
    }
    let field = ctx.fields().get(index).ok_or_else(|| {
        Error::malformed(format!(
            "input ordinal {index} out of range for {} input fields",
            ctx.fields().len()
        ))
    })?;
    Ok(ScalarExpr::input(index, field.ty.clone()))
}

fn decode_call(map: &Map<String, Value>, ctx: &ExprContext<'_>) -> Result<ScalarExpr> {
    let (op_name, op_kind, op_syntax) = decode_op_identity(&map["op"])?;
    let Some(op) = ctx.registry().lookup_wire(&op_name, &op_kind, &op_syntax) else {
        tracing::debug!(name = %op_name, kind = %op_kind, syntax = %op_syntax,
            "operator identity did not resolve");
        return Err(Error::UnresolvedOperator {
            name: op_name,
            kind: op_kind,
            syntax: op_syntax,
        });
    };

    let operands = match map.get("operands") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| decode_expr(item, ctx))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(Error::malformed(format!(
                "'operands' must be an array, got {other}"
            )));
        }
        None => Vec::new(),
    };

    let distinct = map
        .get("distinct")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // An explicit wire type always wins over re-inference.
    let ty = match map.get("type") {
        Some(ty) => decode_type(ty)?,
        None => {
            let operand_types: Vec<RelType> =
                operands.iter().map(|e| e.ty().clone()).collect();
            op.returns.infer(&operand_types).ok_or_else(|| {
                Error::malformed(format!(
                    "operator {} requires an explicit result type",
                    op.name
                ))
            })?
        }
    };

    let window = match map.get("window") {
        Some(window) => Some(decode_window(window, ctx)?),
        None => None,
    };

    Ok(ScalarExpr::Call(CallExpr {
        op,
        operands,
        ty,
        distinct,
        window,
    }))
}

fn decode_op_identity(value: &Value) -> Result<(String, String, String)> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed("'op' must be an object"))?;
    let get = |key: &str| -> Result<String> {
        map.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::malformed(format!("operator identity is missing '{key}'")))
    };
    Ok((get("name")?, get("kind")?, get("syntax")?))
}

fn decode_window(value: &Value, ctx: &ExprContext<'_>) -> Result<WindowSpec> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed("'window' must be an object"))?;

    let partition = decode_expr_list(map.get("partition"), ctx)?;
    let order = match map.get("order") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| decode_order_key(item, ctx))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(Error::malformed(format!(
                "'order' must be an array, got {other}"
            )));
        }
        None => Vec::new(),
    };

    let rows = map.contains_key("rows-lower") || map.contains_key("rows-upper");
    let range = map.contains_key("range-lower") || map.contains_key("range-upper");
    let (units, lower_key, upper_key) = match (rows, range) {
        (true, false) => (FrameUnits::Rows, "rows-lower", "rows-upper"),
        (false, true) => (FrameUnits::Range, "range-lower", "range-upper"),
        (true, true) => {
            return Err(Error::malformed(
                "window frame mixes row and range bounds",
            ));
        }
        (false, false) => {
            return Err(Error::malformed("window frame is missing its bounds"));
        }
    };
    let lower = decode_bound(
        map.get(lower_key)
            .ok_or_else(|| Error::malformed(format!("window frame is missing '{lower_key}'")))?,
        ctx,
    )?;
    let upper = decode_bound(
        map.get(upper_key)
            .ok_or_else(|| Error::malformed(format!("window frame is missing '{upper_key}'")))?,
        ctx,
    )?;

    Ok(WindowSpec {
        partition,
        order,
        frame: WindowFrame {
            units,
            lower,
            upper,
        },
    })
}

fn decode_expr_list(value: Option<&Value>, ctx: &ExprContext<'_>) -> Result<Vec<ScalarExpr>> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|item| decode_expr(item, ctx)).collect(),
        Some(other) => Err(Error::malformed(format!(
            "expected an expression array, got {other}"
        ))),
        None => Ok(Vec::new()),
    }
}

fn decode_order_key(value: &Value, ctx: &ExprContext<'_>) -> Result<OrderKey> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed("order key must be an object"))?;
    let expr = decode_expr(
        map.get("expr")
            .ok_or_else(|| Error::malformed("order key is missing 'expr'"))?,
        ctx,
    )?;
    let direction = map
        .get("direction")
        .and_then(Value::as_str)
        .and_then(Direction::parse)
        .ok_or_else(|| Error::malformed("order key has a bad 'direction'"))?;
    let null_direction = map
        .get("null-direction")
        .and_then(Value::as_str)
        .and_then(NullDirection::parse)
        .ok_or_else(|| Error::malformed("order key has a bad 'null-direction'"))?;
    Ok(OrderKey {
        expr,
        direction,
        null_direction,
    })
}

fn decode_bound(value: &Value, ctx: &ExprContext<'_>) -> Result<WindowBound> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed("window bound must be an object"))?;
    let tag = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed("window bound is missing 'type'"))?;
    let offset = || -> Result<Box<ScalarExpr>> {
        let offset = map
            .get("offset")
            .ok_or_else(|| Error::malformed(format!("{tag} bound is missing 'offset'")))?;
        Ok(Box::new(decode_expr(offset, ctx)?))
    };
    match tag {
        "UNBOUNDED_PRECEDING" => Ok(WindowBound::UnboundedPreceding),
        "CURRENT_ROW" => Ok(WindowBound::CurrentRow),
        "PRECEDING" => Ok(WindowBound::Preceding(offset()?)),
        "FOLLOWING" => Ok(WindowBound::Following(offset()?)),
        other => Err(Error::malformed(format!("unknown bound type '{other}'"))),
    }
}

fn required_type(map: &Map<String, Value>) -> Result<RelType> {
    decode_type(
        map.get("type")
            .ok_or_else(|| Error::malformed("expression is missing 'type'"))?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use relwire_ops::{extended_library, OperatorRegistry};
    use relwire_types::{DecimalValue, LiteralValue};
    use serde_json::json;

    fn emps_row() -> RelType {
        RelType::row(vec![
            RelField::new("empid", RelType::integer()),
            RelField::new("deptno", RelType::integer().with_nullable(true)),
            RelField::new("name", RelType::varchar(None).with_nullable(true)),
        ])
    }

    fn round_trip(expr: &ScalarExpr, registry: &OperatorRegistry) -> ScalarExpr {
        let encoded = encode_expr(expr).unwrap();
        let ctx = ExprContext::new(registry).with_input_rows(&[emps_row()]);
        let decoded = decode_expr(&encoded, &ctx).unwrap();
        assert_eq!(&decoded, expr, "round trip changed the expression");
        // Canonical stability: re-encoding the decoded tree is bytewise
        // identical.
        let re_encoded = encode_expr(&decoded).unwrap();
        assert_eq!(re_encoded.to_string(), encoded.to_string());
        decoded
    }

    #[test]
    fn literal_and_input_round_trip() {
        let registry = OperatorRegistry::standard();
        round_trip(
            &ScalarExpr::literal(10i64, RelType::integer()),
            &registry,
        );
        round_trip(&ScalarExpr::input(1, RelType::integer().with_nullable(true)), &registry);
        round_trip(
            &ScalarExpr::literal(LiteralValue::Null, RelType::integer()),
            &registry,
        );
    }

    #[test]
    fn call_round_trip_reinfers_type() {
        let registry = OperatorRegistry::standard();
        let eq = registry.lookup_wire("=", "EQUALS", "BINARY").unwrap();
        let expr = ScalarExpr::call(
            eq,
            vec![
                ScalarExpr::input(1, RelType::integer().with_nullable(true)),
                ScalarExpr::literal(10i64, RelType::integer()),
            ],
        )
        .unwrap();
        let encoded = encode_expr(&expr).unwrap();
        // Derivable result types stay off the wire.
        assert!(encoded.get("type").is_none());
        round_trip(&expr, &registry);
    }

    #[test]
    fn explicit_type_survives_and_wins() {
        let registry = OperatorRegistry::standard().with_library("extended", extended_library());
        let safe_cast = registry
            .lookup_wire("SAFE_CAST", "SAFE_CAST", "FUNCTION")
            .unwrap();
        let expr = ScalarExpr::call_with_type(
            safe_cast,
            vec![ScalarExpr::input(0, RelType::integer())],
            RelType::date().with_nullable(true),
        );
        let encoded = encode_expr(&expr).unwrap();
        assert_eq!(encoded["type"]["type"], "DATE");
        round_trip(&expr, &registry);
    }

    #[test]
    fn unresolved_operator_is_a_hard_failure() {
        let registry = OperatorRegistry::standard();
        let ctx = ExprContext::new(&registry).with_input_rows(&[emps_row()]);
        let doc = json!({
            "op": {"name": "MAXS", "kind": "MAX", "syntax": "FUNCTION"},
            "operands": [{"input": 0, "name": "$0"}]
        });
        let err = decode_expr(&doc, &ctx).unwrap_err();
        match err {
            Error::UnresolvedOperator { name, kind, syntax } => {
                assert_eq!(name, "MAXS");
                assert_eq!(kind, "MAX");
                assert_eq!(syntax, "FUNCTION");
            }
            other => panic!("expected UnresolvedOperator, got {other}"),
        }
    }

    #[test]
    fn window_call_round_trip_rows_and_range() {
        let registry = OperatorRegistry::standard();
        let count = registry.lookup_wire("COUNT", "COUNT", "FUNCTION_STAR").unwrap();
        let sum = registry.lookup_wire("SUM", "SUM", "FUNCTION").unwrap();

        let rows_window = WindowSpec {
            partition: vec![ScalarExpr::input(2, RelType::varchar(None).with_nullable(true))],
            order: vec![OrderKey::ascending(ScalarExpr::input(
                1,
                RelType::integer().with_nullable(true),
            ))],
            frame: WindowFrame::rows_unbounded_to_current(),
        };
        let count_over = ScalarExpr::window_call(
            count,
            vec![ScalarExpr::input(0, RelType::integer())],
            RelType::bigint(),
            false,
            rows_window,
        );
        let encoded = encode_expr(&count_over).unwrap();
        assert!(encoded["window"].get("rows-lower").is_some());
        assert!(encoded["window"].get("range-lower").is_none());
        round_trip(&count_over, &registry);

        let range_window = WindowSpec {
            partition: vec![],
            order: vec![OrderKey::ascending(ScalarExpr::input(
                1,
                RelType::integer().with_nullable(true),
            ))],
            frame: WindowFrame {
                units: FrameUnits::Range,
                lower: WindowBound::CurrentRow,
                upper: WindowBound::Following(Box::new(ScalarExpr::literal(
                    1i64,
                    RelType::integer(),
                ))),
            },
        };
        let sum_over = ScalarExpr::window_call(
            sum,
            vec![ScalarExpr::input(0, RelType::integer())],
            RelType::bigint(),
            false,
            range_window,
        );
        let encoded = encode_expr(&sum_over).unwrap();
        assert_eq!(encoded["window"]["range-upper"]["type"], "FOLLOWING");
        round_trip(&sum_over, &registry);
    }

    #[test]
    fn mixed_frame_units_are_rejected() {
        let registry = OperatorRegistry::standard();
        let ctx = ExprContext::new(&registry);
        let doc = json!({
            "op": {"name": "COUNT", "kind": "COUNT", "syntax": "FUNCTION_STAR"},
            "operands": [],
            "distinct": false,
            "type": {"type": "BIGINT", "nullable": false},
            "window": {
                "rows-lower": {"type": "UNBOUNDED_PRECEDING"},
                "range-upper": {"type": "CURRENT_ROW"}
            }
        });
        assert!(matches!(
            decode_expr(&doc, &ctx).unwrap_err(),
            Error::MalformedDocument(_)
        ));
    }

    #[test]
    fn correl_and_dynamic_param_carry_their_own_types() {
        let registry = OperatorRegistry::standard();
        // Neither depends on the (empty) input context.
        let ctx = ExprContext::new(&registry);
        for expr in [
            ScalarExpr::correl("$cor0", emps_row().with_nullable(false)),
            ScalarExpr::dynamic_param(0, RelType::integer().with_nullable(true)),
        ] {
            let encoded = encode_expr(&expr).unwrap();
            let decoded = decode_expr(&encoded, &ctx).unwrap();
            assert_eq!(decoded, expr);
        }
    }

    #[test]
    fn bare_string_type_on_null_literal_decodes() {
        let registry = OperatorRegistry::standard();
        let ctx = ExprContext::new(&registry);
        let doc = json!({"literal": null, "type": "INTEGER"});
        let decoded = decode_expr(&doc, &ctx).unwrap();
        assert_eq!(
            decoded,
            ScalarExpr::literal(LiteralValue::Null, RelType::integer().with_nullable(true))
        );
    }

    #[test]
    fn big_decimal_literal_survives_decode() {
        let registry = OperatorRegistry::standard();
        let ctx = ExprContext::new(&registry);
        let doc = json!({
            "literal": 3129400000i64,
            "type": {"type": "TIMESTAMP", "nullable": false}
        });
        let decoded = decode_expr(&doc, &ctx).unwrap();
        assert_eq!(
            decoded,
            ScalarExpr::Literal {
                value: LiteralValue::Timestamp(3_129_400_000),
                ty: RelType::timestamp(),
            }
        );
    }

    struct PlusThousand;

    impl InputTranslator for PlusThousand {
        fn translate_input(&self, index: usize, _ctx: &ExprContext<'_>) -> Result<ScalarExpr> {
            Ok(ScalarExpr::literal(
                DecimalValue::from_i64(1000 + index as i64),
                RelType::integer(),
            ))
        }
    }

    #[test]
    fn input_translator_replaces_default_strategy() {
        let registry = OperatorRegistry::standard();
        let translator = PlusThousand;
        let ctx = ExprContext::new(&registry).with_translator(&translator);
        let doc = json!({
            "op": {"name": "+", "kind": "PLUS", "syntax": "BINARY"},
            "operands": [
                {"input": 1, "name": "$1"},
                {"literal": 2, "type": {"type": "INTEGER", "nullable": false}}
            ]
        });
        let decoded = decode_expr(&doc, &ctx).unwrap();
        let ScalarExpr::Call(call) = decoded else {
            panic!("expected a call");
        };
        assert_eq!(
            call.operands[0],
            ScalarExpr::literal(DecimalValue::from_i64(1001), RelType::integer())
        );
    }

    #[test]
    fn out_of_range_input_is_malformed() {
        let registry = OperatorRegistry::standard();
        let ctx = ExprContext::new(&registry).with_input_rows(&[emps_row()]);
        let doc = json!({"input": 9, "name": "$9"});
        assert!(matches!(
            decode_expr(&doc, &ctx).unwrap_err(),
            Error::MalformedDocument(_)
        ));
    }
}
