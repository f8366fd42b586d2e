//! Plan encoding: algebra tree to the `"rels"` record sequence.

use serde_json::{Map, Value};

use relwire_expr::encode_expr;
use relwire_result::Result;
use relwire_types::codec::{encode_field, encode_literal, encode_type};

use crate::node::{AggregateCall, AlgebraNode, CollationKey, Distribution, NodeKind};
use crate::PlanResult;

/// Encodes an algebra tree into the wire document.
///
/// Nodes are emitted in a single topological (input-before-consumer)
/// order; each record carries a sequential id assigned at emit time. A
/// record omits its input list exactly when its sole input is the
/// immediately preceding record; leaves always carry an explicit empty
/// list.
pub struct PlanWriter;

impl PlanWriter {
    /// Encode the tree rooted at `root` as a structured document.
    pub fn encode(root: &AlgebraNode) -> PlanResult<Value> {
        let mut records = Vec::new();
        Self::write_node(root, &mut records)?;
        let mut doc = Map::new();
        doc.insert("rels".into(), Value::Array(records));
        Ok(Value::Object(doc))
    }

    /// Encode straight to the JSON document text.
    pub fn encode_to_string(root: &AlgebraNode) -> PlanResult<String> {
        Ok(Self::encode(root)?.to_string())
    }

    fn write_node(node: &AlgebraNode, records: &mut Vec<Value>) -> Result<usize> {
        let input_ids: Vec<usize> = node
            .inputs
            .iter()
            .map(|input| Self::write_node(input, records))
            .collect::<Result<Vec<_>>>()?;

        let id = records.len();
        let mut record = Map::new();
        record.insert("id".into(), Value::String(id.to_string()));
        record.insert(
            "relOp".into(),
            Value::String(node.kind.tag().to_string()),
        );
        encode_attributes(&node.kind, &mut record)?;

        // Input-list rule: leaves carry an explicit empty list; a sole
        // input that is the immediately preceding record is implied;
        // everything else is an explicit id list.
        if input_ids.is_empty() {
            record.insert("inputs".into(), Value::Array(Vec::new()));
        } else if !(input_ids.len() == 1 && input_ids[0] + 1 == id) {
            let ids = input_ids
                .iter()
                .map(|input| Value::String(input.to_string()))
                .collect();
            record.insert("inputs".into(), Value::Array(ids));
        }

        records.push(Value::Object(record));
        Ok(id)
    }
}

fn encode_attributes(kind: &NodeKind, record: &mut Map<String, Value>) -> Result<()> {
    match kind {
        NodeKind::TableScan { table } => {
            record.insert("table".into(), encode_path(&table.path));
        }
        NodeKind::Values { fields, tuples } => {
            let field_list = fields.iter().map(encode_field).collect();
            record.insert("type".into(), Value::Array(field_list));
            let mut rows = Vec::with_capacity(tuples.len());
            for tuple in tuples {
                let mut cells = Vec::with_capacity(tuple.len());
                for (value, ty) in tuple {
                    let mut cell = Map::new();
                    cell.insert("literal".into(), encode_literal(value, ty)?);
                    cell.insert("type".into(), encode_type(ty));
                    cells.push(Value::Object(cell));
                }
                rows.push(Value::Array(cells));
            }
            record.insert("tuples".into(), Value::Array(rows));
        }
        NodeKind::Filter { condition } => {
            record.insert("condition".into(), encode_expr(condition)?);
        }
        NodeKind::Project { exprs, fields } => {
            record.insert("fields".into(), encode_names(fields));
            let exprs = exprs.iter().map(encode_expr).collect::<Result<Vec<_>>>()?;
            record.insert("exprs".into(), Value::Array(exprs));
        }
        NodeKind::Aggregate { group, aggs } => {
            record.insert("group".into(), encode_ordinals(group));
            let aggs = aggs
                .iter()
                .map(encode_agg_call)
                .collect::<Result<Vec<_>>>()?;
            record.insert("aggs".into(), Value::Array(aggs));
        }
        NodeKind::Join {
            condition,
            join_type,
        } => {
            record.insert("condition".into(), encode_expr(condition)?);
            record.insert(
                "joinType".into(),
                Value::String(join_type.as_str().to_string()),
            );
        }
        NodeKind::Correlate {
            correlation,
            join_type,
            required_columns,
        } => {
            record.insert(
                "correlation".into(),
                Value::Number((*correlation as u64).into()),
            );
            record.insert(
                "joinType".into(),
                Value::String(join_type.as_str().to_string()),
            );
            record.insert("requiredColumns".into(), encode_ordinals(required_columns));
        }
        NodeKind::Sort {
            collation,
            offset,
            fetch,
        } => {
            record.insert("collation".into(), encode_collation(collation));
            if let Some(offset) = offset {
                record.insert("offset".into(), encode_expr(offset)?);
            }
            if let Some(fetch) = fetch {
                record.insert("fetch".into(), encode_expr(fetch)?);
            }
        }
        NodeKind::Exchange { distribution } => {
            record.insert("distribution".into(), encode_distribution(distribution));
        }
        NodeKind::SortExchange {
            distribution,
            collation,
        } => {
            record.insert("distribution".into(), encode_distribution(distribution));
            record.insert("collation".into(), encode_collation(collation));
        }
        NodeKind::Union { all } | NodeKind::Intersect { all } | NodeKind::Minus { all } => {
            record.insert("all".into(), Value::Bool(*all));
        }
        NodeKind::Calc {
            exprs,
            fields,
            condition,
        } => {
            record.insert("fields".into(), encode_names(fields));
            let exprs = exprs.iter().map(encode_expr).collect::<Result<Vec<_>>>()?;
            record.insert("exprs".into(), Value::Array(exprs));
            if let Some(condition) = condition {
                record.insert("condition".into(), encode_expr(condition)?);
            }
        }
        NodeKind::TableModify {
            table,
            operation,
            update_columns,
            source_expressions,
            flattened,
        } => {
            record.insert("table".into(), encode_path(&table.path));
            record.insert(
                "operation".into(),
                Value::String(operation.as_str().to_string()),
            );
            if !update_columns.is_empty() {
                record.insert("updateColumnList".into(), encode_names(update_columns));
            }
            if !source_expressions.is_empty() {
                let exprs = source_expressions
                    .iter()
                    .map(encode_expr)
                    .collect::<Result<Vec<_>>>()?;
                record.insert("sourceExpressionList".into(), Value::Array(exprs));
            }
            record.insert("flattened".into(), Value::Bool(*flattened));
        }
        NodeKind::Snapshot { period } => {
            record.insert("period".into(), encode_expr(period)?);
        }
    }
    Ok(())
}

fn encode_agg_call(call: &AggregateCall) -> Result<Value> {
    let mut map = Map::new();
    let mut identity = Map::new();
    identity.insert("name".into(), Value::String(call.agg.name.clone()));
    identity.insert(
        "kind".into(),
        Value::String(call.agg.kind.as_str().to_string()),
    );
    identity.insert(
        "syntax".into(),
        Value::String(call.agg.syntax.as_str().to_string()),
    );
    map.insert("agg".into(), Value::Object(identity));
    map.insert("type".into(), encode_type(&call.ty));
    map.insert("distinct".into(), Value::Bool(call.distinct));
    map.insert("operands".into(), encode_ordinals(&call.operands));
    if let Some(filter) = call.filter {
        map.insert("filter".into(), Value::Number((filter as u64).into()));
    }
    if let Some(name) = &call.name {
        map.insert("name".into(), Value::String(name.clone()));
    }
    Ok(Value::Object(map))
}

fn encode_collation(keys: &[CollationKey]) -> Value {
    Value::Array(
        keys.iter()
            .map(|key| {
                let mut map = Map::new();
                map.insert("field".into(), Value::Number((key.field as u64).into()));
                map.insert(
                    "direction".into(),
                    Value::String(key.direction.as_str().to_string()),
                );
                map.insert(
                    "nulls".into(),
                    Value::String(key.nulls.as_str().to_string()),
                );
                Value::Object(map)
            })
            .collect(),
    )
}

fn encode_distribution(distribution: &Distribution) -> Value {
    let mut map = Map::new();
    map.insert(
        "type".into(),
        Value::String(distribution.dist.as_str().to_string()),
    );
    if !distribution.keys.is_empty() {
        map.insert("keys".into(), encode_ordinals(&distribution.keys));
    }
    Value::Object(map)
}

fn encode_path(path: &[String]) -> Value {
    Value::Array(path.iter().map(|part| Value::String(part.clone())).collect())
}

fn encode_names(names: &[String]) -> Value {
    Value::Array(names.iter().map(|name| Value::String(name.clone())).collect())
}

fn encode_ordinals(ordinals: &[usize]) -> Value {
    Value::Array(
        ordinals
            .iter()
            .map(|ordinal| Value::Number((*ordinal as u64).into()))
            .collect(),
    )
}
