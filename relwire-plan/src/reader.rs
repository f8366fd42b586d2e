//! Plan decoding: the `"rels"` record sequence back to an algebra tree.

use serde_json::{Map, Value};

use rustc_hash::FxHashMap;

use relwire_catalog::{CatalogResolver, TableHandle};
use relwire_expr::{decode_expr, ExprContext, InputTranslator, ScalarExpr};
use relwire_ops::OperatorRegistry;
use relwire_result::{Error, Result};
use relwire_types::codec::{decode_field, decode_literal, decode_type};
use relwire_types::{LiteralValue, RelType};

use crate::node::{
    AggregateCall, AlgebraNode, CollationKey, Distribution, DistributionType, JoinType,
    ModifyOp, NodeKind,
};
use crate::PlanResult;

/// Decodes a wire document back into an algebra tree.
///
/// Table references resolve through the supplied resolver, operator
/// identities through the registry. Decoding is all-or-nothing: the first
/// failing record aborts with its node id attached.
pub struct PlanReader<'a> {
    resolver: &'a CatalogResolver,
    registry: &'a OperatorRegistry,
    translator: Option<&'a dyn InputTranslator>,
}

impl<'a> PlanReader<'a> {
    pub fn new(resolver: &'a CatalogResolver, registry: &'a OperatorRegistry) -> Self {
        Self {
            resolver,
            registry,
            translator: None,
        }
    }

    /// Substitute a custom input-reference decode strategy.
    pub fn with_input_translator(mut self, translator: &'a dyn InputTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Decode a document from its JSON text.
    pub fn decode_str(&self, text: &str) -> PlanResult<AlgebraNode> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|err| Error::malformed(format!("document is not valid JSON: {err}")))?;
        self.decode(&doc)
    }

    /// Decode a structured document. The last record is the root.
    pub fn decode(&self, doc: &Value) -> PlanResult<AlgebraNode> {
        let records = doc
            .as_object()
            .and_then(|map| map.get("rels"))
            .ok_or_else(|| Error::malformed("document is missing 'rels'"))?
            .as_array()
            .ok_or_else(|| Error::malformed("'rels' must be an array"))?;
        if records.is_empty() {
            return Err(Error::malformed("'rels' is empty"));
        }

        let mut nodes: Vec<AlgebraNode> = Vec::with_capacity(records.len());
        let mut ids: FxHashMap<String, usize> = FxHashMap::default();
        for (position, record) in records.iter().enumerate() {
            let id = record_id(record, position);
            let node = self
                .decode_record(record, &nodes, &ids)
                .map_err(|err| err.at_node(id.clone()))?;
            tracing::debug!(id = %id, tag = node.kind.tag(), "decoded plan record");
            ids.insert(id, position);
            nodes.push(node);
        }
        Ok(nodes.pop().expect("checked non-empty above"))
    }

    fn decode_record(
        &self,
        record: &Value,
        nodes: &[AlgebraNode],
        ids: &FxHashMap<String, usize>,
    ) -> Result<AlgebraNode> {
        let record = record
            .as_object()
            .ok_or_else(|| Error::malformed("plan record must be an object"))?;
        let tag = record
            .get("relOp")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed("plan record is missing 'relOp'"))?;

        let input_indexes = self.resolve_inputs(record, nodes, ids)?;
        let arity = NodeKind::arity_for_tag(tag)
            .ok_or_else(|| Error::malformed(format!("unknown node kind '{tag}'")))?;
        if !arity.check(input_indexes.len()) {
            return Err(Error::malformed(format!(
                "{tag} expects {arity} input(s), got {}",
                input_indexes.len()
            )));
        }

        let input_rows: Vec<RelType> = input_indexes
            .iter()
            .map(|&index| nodes[index].row_type())
            .collect();
        let mut ctx = ExprContext::new(self.registry).with_input_rows(&input_rows);
        if let Some(translator) = self.translator {
            ctx = ctx.with_translator(translator);
        }

        let kind = self.decode_kind(tag, record, &ctx)?;

        let inputs = input_indexes
            .iter()
            .map(|&index| nodes[index].clone())
            .collect();
        Ok(AlgebraNode::new(kind, inputs))
    }

    /// Input-list rule: an explicit list (possibly empty) is used as
    /// given; a missing list means "the immediately preceding record", or
    /// no inputs when this is the first record.
    fn resolve_inputs(
        &self,
        record: &Map<String, Value>,
        nodes: &[AlgebraNode],
        ids: &FxHashMap<String, usize>,
    ) -> Result<Vec<usize>> {
        match record.get("inputs") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    let key = match item {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        other => {
                            return Err(Error::malformed(format!(
                                "input id must be a string, got {other}"
                            )));
                        }
                    };
                    ids.get(&key).copied().ok_or_else(|| {
                        Error::malformed(format!(
                            "input id '{key}' does not reference a previous record"
                        ))
                    })
                })
                .collect(),
            Some(other) => Err(Error::malformed(format!(
                "'inputs' must be an array, got {other}"
            ))),
            None if nodes.is_empty() => Ok(Vec::new()),
            None => Ok(vec![nodes.len() - 1]),
        }
    }

    fn decode_kind(
        &self,
        tag: &str,
        record: &Map<String, Value>,
        ctx: &ExprContext<'_>,
    ) -> Result<NodeKind> {
        match tag {
            "TableScan" => {
                let table = self.resolve_table(record)?;
                Ok(NodeKind::TableScan { table })
            }
            "Values" => self.decode_values(record),
            "Filter" => Ok(NodeKind::Filter {
                condition: decode_expr(required(record, "condition")?, ctx)?,
            }),
            "Project" => Ok(NodeKind::Project {
                exprs: expr_list(required(record, "exprs")?, ctx)?,
                fields: name_list(required(record, "fields")?)?,
            }),
            "Aggregate" => self.decode_aggregate(record, ctx),
            "Join" => Ok(NodeKind::Join {
                condition: decode_expr(required(record, "condition")?, ctx)?,
                join_type: join_type(record)?,
            }),
            "Correlate" => Ok(NodeKind::Correlate {
                correlation: ordinal(required(record, "correlation")?, "correlation")? as u32,
                join_type: join_type(record)?,
                required_columns: ordinal_list(required(record, "requiredColumns")?)?,
            }),
            "Sort" => Ok(NodeKind::Sort {
                collation: collation(required(record, "collation")?)?,
                offset: optional_expr(record.get("offset"), ctx)?,
                fetch: optional_expr(record.get("fetch"), ctx)?,
            }),
            "Exchange" => Ok(NodeKind::Exchange {
                distribution: distribution(required(record, "distribution")?)?,
            }),
            "SortExchange" => Ok(NodeKind::SortExchange {
                distribution: distribution(required(record, "distribution")?)?,
                collation: collation(required(record, "collation")?)?,
            }),
            "Union" => Ok(NodeKind::Union { all: all_flag(record)? }),
            "Intersect" => Ok(NodeKind::Intersect { all: all_flag(record)? }),
            "Minus" => Ok(NodeKind::Minus { all: all_flag(record)? }),
            "Calc" => Ok(NodeKind::Calc {
                exprs: expr_list(required(record, "exprs")?, ctx)?,
                fields: name_list(required(record, "fields")?)?,
                condition: optional_expr(record.get("condition"), ctx)?,
            }),
            "TableModify" => self.decode_modify(record, ctx),
            "Snapshot" => Ok(NodeKind::Snapshot {
                period: decode_expr(required(record, "period")?, ctx)?,
            }),
            other => Err(Error::malformed(format!("unknown node kind '{other}'"))),
        }
    }

    fn resolve_table(&self, record: &Map<String, Value>) -> Result<TableHandle> {
        let path = name_list(required(record, "table")?)?;
        self.resolver
            .resolve_table(&path)
            .ok_or_else(|| Error::TableNotFound(path.join(".")))
    }

    fn decode_values(&self, record: &Map<String, Value>) -> Result<NodeKind> {
        let fields = required(record, "type")?
            .as_array()
            .ok_or_else(|| Error::malformed("'type' must be a field array"))?
            .iter()
            .map(decode_field)
            .collect::<Result<Vec<_>>>()?;
        let tuples = required(record, "tuples")?
            .as_array()
            .ok_or_else(|| Error::malformed("'tuples' must be an array"))?
            .iter()
            .map(|row| self.decode_tuple(row))
            .collect::<Result<Vec<_>>>()?;
        Ok(NodeKind::Values { fields, tuples })
    }

    fn decode_tuple(&self, row: &Value) -> Result<Vec<(LiteralValue, RelType)>> {
        row.as_array()
            .ok_or_else(|| Error::malformed("tuple must be an array"))?
            .iter()
            .map(|cell| {
                let cell = cell
                    .as_object()
                    .ok_or_else(|| Error::malformed("tuple cell must be an object"))?;
                let ty = decode_type(required(cell, "type")?)?;
                let value = decode_literal(required(cell, "literal")?, &ty)?;
                Ok((value, ty))
            })
            .collect()
    }

    fn decode_aggregate(
        &self,
        record: &Map<String, Value>,
        ctx: &ExprContext<'_>,
    ) -> Result<NodeKind> {
        let group = ordinal_list(required(record, "group")?)?;
        let aggs = required(record, "aggs")?
            .as_array()
            .ok_or_else(|| Error::malformed("'aggs' must be an array"))?
            .iter()
            .map(|call| self.decode_agg_call(call, ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(NodeKind::Aggregate { group, aggs })
    }

    fn decode_agg_call(&self, value: &Value, _ctx: &ExprContext<'_>) -> Result<AggregateCall> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::malformed("aggregate call must be an object"))?;
        let identity = required(map, "agg")?
            .as_object()
            .ok_or_else(|| Error::malformed("'agg' must be an object"))?;
        let get = |key: &str| -> Result<&str> {
            identity.get(key).and_then(Value::as_str).ok_or_else(|| {
                Error::malformed(format!("aggregate identity is missing '{key}'"))
            })
        };
        let (name, kind, syntax) = (get("name")?, get("kind")?, get("syntax")?);
        let agg = self
            .registry
            .lookup_wire(name, kind, syntax)
            .ok_or_else(|| Error::UnresolvedOperator {
                name: name.to_string(),
                kind: kind.to_string(),
                syntax: syntax.to_string(),
            })?;

        let ty = decode_type(required(map, "type")?)?;
        let distinct = map
            .get("distinct")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let operands = ordinal_list(required(map, "operands")?)?;
        let filter = match map.get("filter") {
            Some(value) => Some(ordinal(value, "filter")?),
            None => None,
        };
        let call_name = map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(AggregateCall {
            agg,
            ty,
            distinct,
            operands,
            filter,
            name: call_name,
        })
    }

    fn decode_modify(
        &self,
        record: &Map<String, Value>,
        ctx: &ExprContext<'_>,
    ) -> Result<NodeKind> {
        let table = self.resolve_table(record)?;
        let operation = required(record, "operation")?
            .as_str()
            .and_then(ModifyOp::parse)
            .ok_or_else(|| Error::malformed("bad or missing 'operation'"))?;
        let update_columns = match record.get("updateColumnList") {
            Some(value) => name_list(value)?,
            None => Vec::new(),
        };
        let source_expressions = match record.get("sourceExpressionList") {
            Some(value) => expr_list(value, ctx)?,
            None => Vec::new(),
        };
        let flattened = record
            .get("flattened")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(NodeKind::TableModify {
            table,
            operation,
            update_columns,
            source_expressions,
            flattened,
        })
    }
}

fn record_id(record: &Value, position: usize) -> String {
    record
        .as_object()
        .and_then(|map| map.get("id"))
        .map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| position.to_string())
}

fn required<'v>(map: &'v Map<String, Value>, key: &str) -> Result<&'v Value> {
    map.get(key)
        .ok_or_else(|| Error::malformed(format!("record is missing '{key}'")))
}

fn optional_expr(
    value: Option<&Value>,
    ctx: &ExprContext<'_>,
) -> Result<Option<ScalarExpr>> {
    value.map(|v| decode_expr(v, ctx)).transpose()
}

fn expr_list(value: &Value, ctx: &ExprContext<'_>) -> Result<Vec<ScalarExpr>> {
    value
        .as_array()
        .ok_or_else(|| Error::malformed("expected an expression array"))?
        .iter()
        .map(|item| decode_expr(item, ctx))
        .collect()
}

fn name_list(value: &Value) -> Result<Vec<String>> {
    value
        .as_array()
        .ok_or_else(|| Error::malformed("expected a name array"))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::malformed(format!("expected a name string, got {item}")))
        })
        .collect()
}

fn ordinal(value: &Value, key: &str) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| Error::malformed(format!("'{key}' must be a non-negative ordinal")))
}

fn ordinal_list(value: &Value) -> Result<Vec<usize>> {
    value
        .as_array()
        .ok_or_else(|| Error::malformed("expected an ordinal array"))?
        .iter()
        .map(|item| ordinal(item, "ordinal"))
        .collect()
}

fn join_type(record: &Map<String, Value>) -> Result<JoinType> {
    required(record, "joinType")?
        .as_str()
        .and_then(JoinType::parse)
        .ok_or_else(|| Error::malformed("bad or missing 'joinType'"))
}

fn all_flag(record: &Map<String, Value>) -> Result<bool> {
    required(record, "all")?
        .as_bool()
        .ok_or_else(|| Error::malformed("'all' must be a boolean"))
}

fn collation(value: &Value) -> Result<Vec<CollationKey>> {
    use relwire_expr::{Direction, NullDirection};
    value
        .as_array()
        .ok_or_else(|| Error::malformed("'collation' must be an array"))?
        .iter()
        .map(|item| {
            let map = item
                .as_object()
                .ok_or_else(|| Error::malformed("collation key must be an object"))?;
            let field = ordinal(required(map, "field")?, "field")?;
            let direction = map
                .get("direction")
                .and_then(Value::as_str)
                .and_then(Direction::parse)
                .ok_or_else(|| Error::malformed("collation key has a bad 'direction'"))?;
            let nulls = map
                .get("nulls")
                .and_then(Value::as_str)
                .and_then(NullDirection::parse)
                .ok_or_else(|| Error::malformed("collation key has a bad 'nulls'"))?;
            Ok(CollationKey {
                field,
                direction,
                nulls,
            })
        })
        .collect()
}

fn distribution(value: &Value) -> Result<Distribution> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::malformed("'distribution' must be an object"))?;
    let dist = required(map, "type")?
        .as_str()
        .and_then(DistributionType::parse)
        .ok_or_else(|| Error::malformed("bad or missing distribution 'type'"))?;
    let keys = match map.get("keys") {
        Some(keys) => ordinal_list(keys)?,
        None => Vec::new(),
    };
    Ok(Distribution { dist, keys })
}
