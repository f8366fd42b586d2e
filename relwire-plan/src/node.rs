//! Algebra-node structures for the relwire IR.
//!
//! Nodes own their inputs; sequential ids exist only on the wire. Each
//! node can derive its output row type from its attributes and inputs,
//! which is what expression decoding downstream of it relies on.

use std::sync::Arc;

use relwire_catalog::TableHandle;
use relwire_expr::{Direction, NullDirection, ScalarExpr};
use relwire_ops::OperatorDef;
use relwire_types::{LiteralValue, RelField, RelType};

/// Join semantics, rendered lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Semi,
    Anti,
}

impl JoinType {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
            JoinType::Semi => "semi",
            JoinType::Anti => "anti",
        }
    }

    pub fn parse(text: &str) -> Option<JoinType> {
        Some(match text {
            "inner" => JoinType::Inner,
            "left" => JoinType::Left,
            "right" => JoinType::Right,
            "full" => JoinType::Full,
            "semi" => JoinType::Semi,
            "anti" => JoinType::Anti,
            _ => return None,
        })
    }

    /// Whether the right side's fields survive into the output row.
    pub fn projects_right(self) -> bool {
        !matches!(self, JoinType::Semi | JoinType::Anti)
    }
}

/// Table modification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifyOp {
    Insert,
    Update,
    Delete,
    Merge,
}

impl ModifyOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ModifyOp::Insert => "INSERT",
            ModifyOp::Update => "UPDATE",
            ModifyOp::Delete => "DELETE",
            ModifyOp::Merge => "MERGE",
        }
    }

    pub fn parse(text: &str) -> Option<ModifyOp> {
        Some(match text {
            "INSERT" => ModifyOp::Insert,
            "UPDATE" => ModifyOp::Update,
            "DELETE" => ModifyOp::Delete,
            "MERGE" => ModifyOp::Merge,
            _ => return None,
        })
    }
}

/// Physical distribution strategy of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionType {
    Hash,
    Range,
    Random,
    RoundRobin,
    Broadcast,
    Singleton,
    Any,
}

impl DistributionType {
    pub fn as_str(self) -> &'static str {
        match self {
            DistributionType::Hash => "HASH_DISTRIBUTED",
            DistributionType::Range => "RANGE_DISTRIBUTED",
            DistributionType::Random => "RANDOM_DISTRIBUTED",
            DistributionType::RoundRobin => "ROUND_ROBIN_DISTRIBUTED",
            DistributionType::Broadcast => "BROADCAST_DISTRIBUTED",
            DistributionType::Singleton => "SINGLETON",
            DistributionType::Any => "ANY",
        }
    }

    pub fn parse(text: &str) -> Option<DistributionType> {
        Some(match text {
            "HASH_DISTRIBUTED" => DistributionType::Hash,
            "RANGE_DISTRIBUTED" => DistributionType::Range,
            "RANDOM_DISTRIBUTED" => DistributionType::Random,
            "ROUND_ROBIN_DISTRIBUTED" => DistributionType::RoundRobin,
            "BROADCAST_DISTRIBUTED" => DistributionType::Broadcast,
            "SINGLETON" => DistributionType::Singleton,
            "ANY" => DistributionType::Any,
            _ => return None,
        })
    }
}

/// A distribution spec: strategy plus the key ordinals it shards on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub dist: DistributionType,
    pub keys: Vec<usize>,
}

impl Distribution {
    pub fn hash(keys: Vec<usize>) -> Self {
        Self {
            dist: DistributionType::Hash,
            keys,
        }
    }

    pub fn random() -> Self {
        Self {
            dist: DistributionType::Random,
            keys: Vec::new(),
        }
    }
}

/// One key of a collation: field ordinal, direction, null placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollationKey {
    pub field: usize,
    pub direction: Direction,
    pub nulls: NullDirection,
}

impl CollationKey {
    pub fn ascending(field: usize) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
            nulls: NullDirection::Last,
        }
    }
}

/// One aggregate call of an Aggregate node. Operands are input-field
/// ordinals; distinctness is per call, never part of the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub agg: Arc<OperatorDef>,
    pub ty: RelType,
    pub distinct: bool,
    pub operands: Vec<usize>,
    pub filter: Option<usize>,
    pub name: Option<String>,
}

impl AggregateCall {
    pub fn new(agg: Arc<OperatorDef>, ty: RelType, operands: Vec<usize>) -> Self {
        Self {
            agg,
            ty,
            distinct: false,
            operands,
            filter: None,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_filter(mut self, filter: usize) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Node-kind tag plus kind-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    TableScan {
        table: TableHandle,
    },
    Values {
        fields: Vec<RelField>,
        tuples: Vec<Vec<(LiteralValue, RelType)>>,
    },
    Filter {
        condition: ScalarExpr,
    },
    Project {
        exprs: Vec<ScalarExpr>,
        fields: Vec<String>,
    },
    Aggregate {
        group: Vec<usize>,
        aggs: Vec<AggregateCall>,
    },
    Join {
        condition: ScalarExpr,
        join_type: JoinType,
    },
    Correlate {
        correlation: u32,
        join_type: JoinType,
        required_columns: Vec<usize>,
    },
    Sort {
        collation: Vec<CollationKey>,
        offset: Option<ScalarExpr>,
        fetch: Option<ScalarExpr>,
    },
    Exchange {
        distribution: Distribution,
    },
    SortExchange {
        distribution: Distribution,
        collation: Vec<CollationKey>,
    },
    Union {
        all: bool,
    },
    Intersect {
        all: bool,
    },
    Minus {
        all: bool,
    },
    Calc {
        exprs: Vec<ScalarExpr>,
        fields: Vec<String>,
        condition: Option<ScalarExpr>,
    },
    TableModify {
        table: TableHandle,
        operation: ModifyOp,
        update_columns: Vec<String>,
        source_expressions: Vec<ScalarExpr>,
        flattened: bool,
    },
    Snapshot {
        period: ScalarExpr,
    },
}

/// How many inputs a node kind takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputArity {
    Exactly(usize),
    AtLeast(usize),
}

impl InputArity {
    pub fn check(self, actual: usize) -> bool {
        match self {
            InputArity::Exactly(n) => actual == n,
            InputArity::AtLeast(n) => actual >= n,
        }
    }
}

impl std::fmt::Display for InputArity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputArity::Exactly(n) => write!(f, "{n}"),
            InputArity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

impl NodeKind {
    /// The record's `relOp` tag.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::TableScan { .. } => "TableScan",
            NodeKind::Values { .. } => "Values",
            NodeKind::Filter { .. } => "Filter",
            NodeKind::Project { .. } => "Project",
            NodeKind::Aggregate { .. } => "Aggregate",
            NodeKind::Join { .. } => "Join",
            NodeKind::Correlate { .. } => "Correlate",
            NodeKind::Sort { .. } => "Sort",
            NodeKind::Exchange { .. } => "Exchange",
            NodeKind::SortExchange { .. } => "SortExchange",
            NodeKind::Union { .. } => "Union",
            NodeKind::Intersect { .. } => "Intersect",
            NodeKind::Minus { .. } => "Minus",
            NodeKind::Calc { .. } => "Calc",
            NodeKind::TableModify { .. } => "TableModify",
            NodeKind::Snapshot { .. } => "Snapshot",
        }
    }

    /// The input count this kind requires.
    pub fn input_arity(&self) -> InputArity {
        NodeKind::arity_for_tag(self.tag()).expect("every kind has a tag")
    }

    /// Arity by record tag, available before the record's attributes are
    /// decoded. `None` for unknown tags.
    pub fn arity_for_tag(tag: &str) -> Option<InputArity> {
        Some(match tag {
            "TableScan" | "Values" => InputArity::Exactly(0),
            "Join" | "Correlate" => InputArity::Exactly(2),
            "Union" | "Intersect" | "Minus" => InputArity::AtLeast(2),
            "Filter" | "Project" | "Aggregate" | "Sort" | "Exchange" | "SortExchange"
            | "Calc" | "TableModify" | "Snapshot" => InputArity::Exactly(1),
            _ => return None,
        })
    }
}

/// One step of the relational IR, owning its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgebraNode {
    pub kind: NodeKind,
    pub inputs: Vec<AlgebraNode>,
}

impl AlgebraNode {
    pub fn new(kind: NodeKind, inputs: Vec<AlgebraNode>) -> Self {
        Self { kind, inputs }
    }

    pub fn table_scan(table: TableHandle) -> Self {
        Self::new(NodeKind::TableScan { table }, Vec::new())
    }

    pub fn values(fields: Vec<RelField>, tuples: Vec<Vec<(LiteralValue, RelType)>>) -> Self {
        Self::new(NodeKind::Values { fields, tuples }, Vec::new())
    }

    pub fn filter(input: AlgebraNode, condition: ScalarExpr) -> Self {
        Self::new(NodeKind::Filter { condition }, vec![input])
    }

    pub fn project(input: AlgebraNode, exprs: Vec<ScalarExpr>, fields: Vec<String>) -> Self {
        Self::new(NodeKind::Project { exprs, fields }, vec![input])
    }

    pub fn aggregate(input: AlgebraNode, group: Vec<usize>, aggs: Vec<AggregateCall>) -> Self {
        Self::new(NodeKind::Aggregate { group, aggs }, vec![input])
    }

    pub fn join(
        left: AlgebraNode,
        right: AlgebraNode,
        condition: ScalarExpr,
        join_type: JoinType,
    ) -> Self {
        Self::new(
            NodeKind::Join {
                condition,
                join_type,
            },
            vec![left, right],
        )
    }

    pub fn correlate(
        left: AlgebraNode,
        right: AlgebraNode,
        correlation: u32,
        join_type: JoinType,
        required_columns: Vec<usize>,
    ) -> Self {
        Self::new(
            NodeKind::Correlate {
                correlation,
                join_type,
                required_columns,
            },
            vec![left, right],
        )
    }

    pub fn sort(
        input: AlgebraNode,
        collation: Vec<CollationKey>,
        offset: Option<ScalarExpr>,
        fetch: Option<ScalarExpr>,
    ) -> Self {
        Self::new(
            NodeKind::Sort {
                collation,
                offset,
                fetch,
            },
            vec![input],
        )
    }

    pub fn exchange(input: AlgebraNode, distribution: Distribution) -> Self {
        Self::new(NodeKind::Exchange { distribution }, vec![input])
    }

    pub fn sort_exchange(
        input: AlgebraNode,
        distribution: Distribution,
        collation: Vec<CollationKey>,
    ) -> Self {
        Self::new(
            NodeKind::SortExchange {
                distribution,
                collation,
            },
            vec![input],
        )
    }

    pub fn union(inputs: Vec<AlgebraNode>, all: bool) -> Self {
        Self::new(NodeKind::Union { all }, inputs)
    }

    pub fn intersect(inputs: Vec<AlgebraNode>, all: bool) -> Self {
        Self::new(NodeKind::Intersect { all }, inputs)
    }

    pub fn minus(inputs: Vec<AlgebraNode>, all: bool) -> Self {
        Self::new(NodeKind::Minus { all }, inputs)
    }

    pub fn calc(
        input: AlgebraNode,
        exprs: Vec<ScalarExpr>,
        fields: Vec<String>,
        condition: Option<ScalarExpr>,
    ) -> Self {
        Self::new(
            NodeKind::Calc {
                exprs,
                fields,
                condition,
            },
            vec![input],
        )
    }

    pub fn table_modify(
        input: AlgebraNode,
        table: TableHandle,
        operation: ModifyOp,
        update_columns: Vec<String>,
        source_expressions: Vec<ScalarExpr>,
    ) -> Self {
        Self::new(
            NodeKind::TableModify {
                table,
                operation,
                update_columns,
                source_expressions,
                flattened: false,
            },
            vec![input],
        )
    }

    pub fn snapshot(input: AlgebraNode, period: ScalarExpr) -> Self {
        Self::new(NodeKind::Snapshot { period }, vec![input])
    }

    /// The node's output row type, derived from its attributes and inputs.
    pub fn row_type(&self) -> RelType {
        match &self.kind {
            NodeKind::TableScan { table } => table.row_type.clone(),
            NodeKind::Values { fields, .. } => RelType::row(fields.clone()),
            NodeKind::Filter { .. }
            | NodeKind::Sort { .. }
            | NodeKind::Exchange { .. }
            | NodeKind::SortExchange { .. }
            | NodeKind::Snapshot { .. }
            | NodeKind::Union { .. }
            | NodeKind::Intersect { .. }
            | NodeKind::Minus { .. } => self.inputs[0].row_type(),
            NodeKind::Project { exprs, fields } | NodeKind::Calc { exprs, fields, .. } => {
                let fields = fields
                    .iter()
                    .zip(exprs.iter())
                    .map(|(name, expr)| RelField::new(name.clone(), expr.ty().clone()))
                    .collect();
                RelType::row(fields)
            }
            NodeKind::Aggregate { group, aggs } => {
                let input_row = self.inputs[0].row_type();
                let input_fields = input_row.fields().unwrap_or(&[]);
                let mut fields = Vec::with_capacity(group.len() + aggs.len());
                for &ordinal in group {
                    if let Some(field) = input_fields.get(ordinal) {
                        fields.push(field.clone());
                    }
                }
                for (i, call) in aggs.iter().enumerate() {
                    let name = call
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("agg#{i}"));
                    fields.push(RelField::new(name, call.ty.clone()));
                }
                RelType::row(fields)
            }
            NodeKind::Join { join_type, .. } => {
                let mut fields = self
                    .inputs[0]
                    .row_type()
                    .fields()
                    .unwrap_or(&[])
                    .to_vec();
                if join_type.projects_right() {
                    fields.extend(self.inputs[1].row_type().fields().unwrap_or(&[]).to_vec());
                }
                RelType::row(fields)
            }
            NodeKind::Correlate { .. } => {
                let mut fields = self
                    .inputs[0]
                    .row_type()
                    .fields()
                    .unwrap_or(&[])
                    .to_vec();
                fields.extend(self.inputs[1].row_type().fields().unwrap_or(&[]).to_vec());
                RelType::row(fields)
            }
            NodeKind::TableModify { .. } => {
                RelType::row(vec![RelField::new("ROWCOUNT", RelType::bigint())])
            }
        }
    }
}
