use std::sync::Arc;

use relwire_catalog::{
    Catalog, CatalogResolver, CatalogTable, ResolverConfig, SimpleTable,
};
use relwire_expr::{
    FrameUnits, OrderKey, ScalarExpr, WindowBound, WindowFrame, WindowSpec,
};
use relwire_ops::{extended_library, OperatorRegistry};
use relwire_plan::{
    AggregateCall, AlgebraNode, CollationKey, Distribution, JoinType, ModifyOp, NodeKind,
    PlanReader, PlanWriter,
};
use relwire_result::Error;
use relwire_types::{LiteralValue, RelField, RelType};

fn emps_table() -> Arc<dyn CatalogTable> {
    Arc::new(SimpleTable::new(vec![
        RelField::new("empid", RelType::integer()),
        RelField::new("deptno", RelType::integer().with_nullable(true)),
    ]))
}

fn depts_table() -> Arc<dyn CatalogTable> {
    Arc::new(SimpleTable::new(vec![
        RelField::new("deptno", RelType::integer()),
        RelField::new("dname", RelType::varchar(None).with_nullable(true)),
    ]))
}

fn hr_resolver() -> CatalogResolver {
    let mut catalog = Catalog::new();
    let hr = catalog.add_schema_path(&["hr"]);
    catalog.add_table(hr, "emps", emps_table());
    catalog.add_table(hr, "depts", depts_table());
    CatalogResolver::new(Arc::new(catalog), Vec::new(), ResolverConfig::default())
}

fn registry() -> OperatorRegistry {
    OperatorRegistry::standard().with_library("extended", extended_library())
}

fn scan(resolver: &CatalogResolver, path: &[&str]) -> AlgebraNode {
    AlgebraNode::table_scan(resolver.resolve_table(path).expect("table exists"))
}

/// Round-trip helper asserting structural equality and canonical
/// re-encoding stability.
fn round_trip(plan: &AlgebraNode, resolver: &CatalogResolver, registry: &OperatorRegistry) {
    let encoded = PlanWriter::encode(plan).expect("encode");
    let reader = PlanReader::new(resolver, registry);
    let decoded = reader.decode(&encoded).expect("decode");
    assert_eq!(&decoded, plan, "decode(encode(p)) != p");
    let re_encoded = PlanWriter::encode(&decoded).expect("re-encode");
    assert_eq!(
        re_encoded.to_string(),
        encoded.to_string(),
        "encode(decode(encode(p))) != encode(p)"
    );
}

/// The filter+aggregate scenario:
/// scan(emps) -> filter(deptno = 10)
///            -> aggregate(group {0}; count(distinct $1) as c; count(*) as d).
fn filter_aggregate_plan(resolver: &CatalogResolver, registry: &OperatorRegistry) -> AlgebraNode {
    let eq = registry.lookup_wire("=", "EQUALS", "BINARY").unwrap();
    let count = registry.lookup_wire("COUNT", "COUNT", "FUNCTION_STAR").unwrap();

    let scan = scan(resolver, &["hr", "emps"]);
    let filter = AlgebraNode::filter(
        scan,
        ScalarExpr::call(
            eq,
            vec![
                ScalarExpr::input(1, RelType::integer().with_nullable(true)),
                ScalarExpr::literal(10i64, RelType::integer()),
            ],
        )
        .unwrap(),
    );
    AlgebraNode::aggregate(
        filter,
        vec![0],
        vec![
            AggregateCall::new(count.clone(), RelType::bigint(), vec![1])
                .distinct(true)
                .named("c"),
            AggregateCall::new(count, RelType::bigint(), vec![]).named("d"),
        ],
    )
}

#[test]
fn filter_aggregate_round_trip_and_document_shape() {
    let resolver = hr_resolver();
    let registry = registry();
    let plan = filter_aggregate_plan(&resolver, &registry);

    let doc = PlanWriter::encode(&plan).unwrap();
    let rels = doc["rels"].as_array().unwrap();
    assert_eq!(rels.len(), 3);

    // Leaf: explicit empty input list, sequential string ids.
    assert_eq!(rels[0]["id"], "0");
    assert_eq!(rels[0]["relOp"], "TableScan");
    assert_eq!(rels[0]["table"], serde_json::json!(["hr", "emps"]));
    assert_eq!(rels[0]["inputs"], serde_json::json!([]));

    // Linear chain: the input list is omitted.
    assert_eq!(rels[1]["id"], "1");
    assert_eq!(rels[1]["relOp"], "Filter");
    assert!(rels[1].get("inputs").is_none());
    assert_eq!(rels[1]["condition"]["op"]["name"], "=");
    assert_eq!(rels[1]["condition"]["operands"][0]["input"], 1);
    assert_eq!(rels[1]["condition"]["operands"][1]["literal"], 10);

    assert_eq!(rels[2]["relOp"], "Aggregate");
    assert_eq!(rels[2]["group"], serde_json::json!([0]));
    let aggs = rels[2]["aggs"].as_array().unwrap();
    assert_eq!(aggs[0]["agg"]["name"], "COUNT");
    assert_eq!(aggs[0]["distinct"], true);
    assert_eq!(aggs[0]["operands"], serde_json::json!([1]));
    assert_eq!(aggs[0]["name"], "c");
    assert_eq!(aggs[1]["distinct"], false);
    assert_eq!(aggs[1]["operands"], serde_json::json!([]));
    assert_eq!(aggs[1]["name"], "d");

    round_trip(&plan, &resolver, &registry);

    // Attribute fidelity on the decoded tree.
    let decoded = PlanReader::new(&resolver, &registry).decode(&doc).unwrap();
    let NodeKind::Aggregate { group, aggs } = &decoded.kind else {
        panic!("root must be an Aggregate");
    };
    assert_eq!(group, &vec![0]);
    assert!(aggs[0].distinct && aggs[0].name.as_deref() == Some("c"));
    assert!(!aggs[1].distinct && aggs[1].name.as_deref() == Some("d"));
    let NodeKind::Filter { condition } = &decoded.inputs[0].kind else {
        panic!("aggregate input must be a Filter");
    };
    let ScalarExpr::Call(call) = condition else {
        panic!("condition must be a call");
    };
    assert_eq!(call.op.name, "=");
    assert_eq!(
        call.operands[0],
        ScalarExpr::input(1, RelType::integer().with_nullable(true))
    );
    assert_eq!(
        call.operands[1],
        ScalarExpr::literal(10i64, RelType::integer())
    );
}

#[test]
fn mutated_operator_name_fails_with_the_identity() {
    let resolver = hr_resolver();
    let registry = registry();
    let plan = filter_aggregate_plan(&resolver, &registry);
    let text = PlanWriter::encode_to_string(&plan).unwrap();
    let mutated = text.replace("\"name\":\"COUNT\"", "\"name\":\"COUNTZ\"");
    assert_ne!(text, mutated);

    let err = PlanReader::new(&resolver, &registry)
        .decode_str(&mutated)
        .unwrap_err();
    let Error::NodeDecode { node_id, source } = err else {
        panic!("expected NodeDecode, got {err}");
    };
    assert_eq!(node_id, "2");
    let Error::UnresolvedOperator { name, kind, syntax } = *source else {
        panic!("expected UnresolvedOperator, got {source}");
    };
    assert_eq!(name, "COUNTZ");
    assert_eq!(kind, "COUNT");
    assert_eq!(syntax, "FUNCTION_STAR");
}

#[test]
fn join_inputs_are_explicit_and_arity_checked() {
    let resolver = hr_resolver();
    let registry = registry();
    let eq = registry.lookup_wire("=", "EQUALS", "BINARY").unwrap();

    let join = AlgebraNode::join(
        scan(&resolver, &["hr", "emps"]),
        scan(&resolver, &["hr", "depts"]),
        ScalarExpr::call(
            eq,
            vec![
                // deptno of emps vs deptno of depts in the concatenated row.
                ScalarExpr::input(1, RelType::integer().with_nullable(true)),
                ScalarExpr::input(2, RelType::integer()),
            ],
        )
        .unwrap(),
        JoinType::Inner,
    );

    let doc = PlanWriter::encode(&join).unwrap();
    let rels = doc["rels"].as_array().unwrap();
    assert_eq!(rels[2]["relOp"], "Join");
    assert_eq!(rels[2]["inputs"], serde_json::json!(["0", "1"]));
    round_trip(&join, &resolver, &registry);

    // A two-input node listing a single prior id is malformed.
    let mut crippled = doc.clone();
    crippled["rels"][2]["inputs"] = serde_json::json!(["0"]);
    let err = PlanReader::new(&resolver, &registry)
        .decode(&crippled)
        .unwrap_err();
    let Error::NodeDecode { source, .. } = err else {
        panic!("expected NodeDecode, got {err}");
    };
    assert!(matches!(*source, Error::MalformedDocument(_)));
}

#[test]
fn unresolved_table_aborts_with_node_id() {
    let resolver = hr_resolver();
    let registry = registry();
    let doc = serde_json::json!({
        "rels": [
            {"id": "0", "relOp": "TableScan", "table": ["hr", "nope"], "inputs": []}
        ]
    });
    let err = PlanReader::new(&resolver, &registry).decode(&doc).unwrap_err();
    let Error::NodeDecode { node_id, source } = err else {
        panic!("expected NodeDecode, got {err}");
    };
    assert_eq!(node_id, "0");
    assert!(matches!(*source, Error::TableNotFound(ref path) if path == "hr.nope"));
}

#[test]
fn omitted_input_list_means_previous_record_only() {
    let resolver = hr_resolver();
    let registry = registry();
    // A scan that is not the first record and omits its input list picks
    // up the previous record, which violates its zero-input arity.
    let doc = serde_json::json!({
        "rels": [
            {"id": "0", "relOp": "TableScan", "table": ["hr", "emps"], "inputs": []},
            {"id": "1", "relOp": "TableScan", "table": ["hr", "depts"]}
        ]
    });
    let err = PlanReader::new(&resolver, &registry).decode(&doc).unwrap_err();
    let Error::NodeDecode { node_id, source } = err else {
        panic!("expected NodeDecode, got {err}");
    };
    assert_eq!(node_id, "1");
    assert!(matches!(*source, Error::MalformedDocument(_)));
}

#[test]
fn windowed_project_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let count = registry.lookup_wire("COUNT", "COUNT", "FUNCTION_STAR").unwrap();
    let sum = registry.lookup_wire("SUM", "SUM", "FUNCTION").unwrap();

    let deptno_ty = RelType::integer().with_nullable(true);
    let count_over = ScalarExpr::window_call(
        count,
        vec![ScalarExpr::input(0, RelType::integer())],
        RelType::bigint(),
        false,
        WindowSpec {
            partition: vec![ScalarExpr::input(1, deptno_ty.clone())],
            order: vec![OrderKey::ascending(ScalarExpr::input(1, deptno_ty.clone()))],
            frame: WindowFrame::rows_unbounded_to_current(),
        },
    );
    let sum_over = ScalarExpr::window_call(
        sum,
        vec![ScalarExpr::input(0, RelType::integer())],
        RelType::integer().with_nullable(true),
        false,
        WindowSpec {
            partition: vec![ScalarExpr::input(1, deptno_ty.clone())],
            order: vec![OrderKey::ascending(ScalarExpr::input(1, deptno_ty))],
            frame: WindowFrame {
                units: FrameUnits::Range,
                lower: WindowBound::CurrentRow,
                upper: WindowBound::Following(Box::new(ScalarExpr::literal(
                    1i64,
                    RelType::integer(),
                ))),
            },
        },
    );

    let plan = AlgebraNode::project(
        scan(&resolver, &["hr", "emps"]),
        vec![
            ScalarExpr::input(0, RelType::integer()),
            count_over,
            sum_over,
        ],
        vec!["field0".into(), "field1".into(), "field2".into()],
    );

    let doc = PlanWriter::encode(&plan).unwrap();
    let exprs = doc["rels"][1]["exprs"].as_array().unwrap();
    assert_eq!(
        exprs[1]["window"]["rows-lower"]["type"],
        "UNBOUNDED_PRECEDING"
    );
    assert_eq!(exprs[2]["window"]["range-upper"]["type"], "FOLLOWING");
    assert_eq!(exprs[2]["window"]["range-upper"]["offset"]["literal"], 1);

    round_trip(&plan, &resolver, &registry);
}

#[test]
fn sort_with_dynamic_param_fetch_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let plan = AlgebraNode::sort(
        scan(&resolver, &["hr", "emps"]),
        vec![],
        None,
        Some(ScalarExpr::dynamic_param(
            0,
            RelType::integer().with_nullable(false),
        )),
    );
    let doc = PlanWriter::encode(&plan).unwrap();
    assert_eq!(doc["rels"][1]["fetch"]["dynamicParam"], 0);
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn sort_exchange_distribution_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();

    let hashed = AlgebraNode::sort_exchange(
        scan(&resolver, &["hr", "emps"]),
        Distribution::hash(vec![0]),
        vec![CollationKey::ascending(0)],
    );
    let doc = PlanWriter::encode(&hashed).unwrap();
    let record = &doc["rels"][1];
    assert_eq!(record["distribution"]["type"], "HASH_DISTRIBUTED");
    assert_eq!(record["distribution"]["keys"], serde_json::json!([0]));
    assert_eq!(record["collation"][0]["field"], 0);
    assert_eq!(record["collation"][0]["direction"], "ASCENDING");
    assert_eq!(record["collation"][0]["nulls"], "LAST");
    round_trip(&hashed, &resolver, &registry);

    // Keyless hash distribution omits the key list.
    let keyless = AlgebraNode::sort_exchange(
        scan(&resolver, &["hr", "emps"]),
        Distribution::hash(vec![]),
        vec![CollationKey::ascending(0)],
    );
    let doc = PlanWriter::encode(&keyless).unwrap();
    assert!(doc["rels"][1]["distribution"].get("keys").is_none());
    round_trip(&keyless, &resolver, &registry);
}

#[test]
fn values_with_binary_literal_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let plan = AlgebraNode::values(
        vec![RelField::new("$f0", RelType::binary(2))],
        vec![vec![(
            LiteralValue::Bytes(vec![0x0a, 0x4b]),
            RelType::binary(2),
        )]],
    );
    let doc = PlanWriter::encode(&plan).unwrap();
    let record = &doc["rels"][0];
    assert_eq!(record["type"][0]["type"], "BINARY");
    assert_eq!(record["type"][0]["precision"], 2);
    assert_eq!(record["tuples"][0][0]["literal"], "0a4b");
    assert_eq!(record["inputs"], serde_json::json!([]));
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn table_modify_update_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let eq = registry.lookup_wire("=", "EQUALS", "BINARY").unwrap();

    let table = resolver.resolve_table(&["hr", "emps"]).unwrap();
    let filtered = AlgebraNode::filter(
        scan(&resolver, &["hr", "emps"]),
        ScalarExpr::call(
            eq,
            vec![
                ScalarExpr::input(0, RelType::integer()),
                ScalarExpr::literal(100i64, RelType::integer()),
            ],
        )
        .unwrap(),
    );
    let plan = AlgebraNode::table_modify(
        filtered,
        table,
        ModifyOp::Update,
        vec!["deptno".into()],
        vec![ScalarExpr::literal(20i64, RelType::integer())],
    );

    let doc = PlanWriter::encode(&plan).unwrap();
    let record = &doc["rels"][2];
    assert_eq!(record["operation"], "UPDATE");
    assert_eq!(record["updateColumnList"], serde_json::json!(["deptno"]));
    assert_eq!(record["flattened"], false);
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn snapshot_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let plan = AlgebraNode::snapshot(
        scan(&resolver, &["hr", "emps"]),
        ScalarExpr::literal(
            LiteralValue::Timestamp(1_311_165_296_000),
            RelType::timestamp(),
        ),
    );
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn correlate_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let eq = registry.lookup_wire("=", "EQUALS", "BINARY").unwrap();

    let emps_row = scan(&resolver, &["hr", "emps"]).row_type();
    let right = AlgebraNode::filter(
        scan(&resolver, &["hr", "depts"]),
        ScalarExpr::call(
            eq,
            vec![
                ScalarExpr::input(0, RelType::integer()),
                ScalarExpr::correl("$cor0", emps_row),
            ],
        )
        .unwrap(),
    );
    let plan = AlgebraNode::correlate(
        scan(&resolver, &["hr", "emps"]),
        right,
        0,
        JoinType::Inner,
        vec![1],
    );

    let doc = PlanWriter::encode(&plan).unwrap();
    let record = &doc["rels"][3];
    assert_eq!(record["correlation"], 0);
    assert_eq!(record["joinType"], "inner");
    assert_eq!(record["requiredColumns"], serde_json::json!([1]));
    assert_eq!(record["inputs"], serde_json::json!(["0", "2"]));
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn union_requires_two_or_more_inputs() {
    let resolver = hr_resolver();
    let registry = registry();
    let plan = AlgebraNode::union(
        vec![
            scan(&resolver, &["hr", "emps"]),
            scan(&resolver, &["hr", "emps"]),
        ],
        true,
    );
    let doc = PlanWriter::encode(&plan).unwrap();
    assert_eq!(doc["rels"][2]["all"], true);
    assert_eq!(doc["rels"][2]["inputs"], serde_json::json!(["0", "1"]));
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn calc_round_trip() {
    let resolver = hr_resolver();
    let registry = registry();
    let gt = registry.lookup_wire(">", "GREATER_THAN", "BINARY").unwrap();
    let plan = AlgebraNode::calc(
        scan(&resolver, &["hr", "emps"]),
        vec![
            ScalarExpr::input(0, RelType::integer()),
            ScalarExpr::input(1, RelType::integer().with_nullable(true)),
        ],
        vec!["empid".into(), "deptno".into()],
        Some(
            ScalarExpr::call(
                gt,
                vec![
                    ScalarExpr::input(0, RelType::integer()),
                    ScalarExpr::literal(10i64, RelType::integer()),
                ],
            )
            .unwrap(),
        ),
    );
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn safe_cast_carries_explicit_type_through_a_plan() {
    let resolver = hr_resolver();
    let registry = registry();
    let safe_cast = registry
        .lookup_wire("SAFE_CAST", "SAFE_CAST", "FUNCTION")
        .unwrap();
    let plan = AlgebraNode::project(
        scan(&resolver, &["hr", "emps"]),
        vec![ScalarExpr::call_with_type(
            safe_cast,
            vec![ScalarExpr::input(0, RelType::integer())],
            RelType::date().with_nullable(true),
        )],
        vec!["d".into()],
    );
    let doc = PlanWriter::encode(&plan).unwrap();
    assert_eq!(doc["rels"][1]["exprs"][0]["type"]["type"], "DATE");
    round_trip(&plan, &resolver, &registry);
}

#[test]
fn decode_str_preserves_wide_timestamp_literals() {
    let resolver = hr_resolver();
    let registry = registry();
    let text = r#"{
        "rels": [
            {"id": "0", "relOp": "TableScan", "table": ["hr", "emps"], "inputs": []},
            {"id": "1", "relOp": "Filter", "condition": {
                "op": {"name": "=", "kind": "EQUALS", "syntax": "BINARY"},
                "operands": [
                    {"input": 0, "name": "$0"},
                    {"literal": 3129400000, "type": {"type": "TIMESTAMP", "nullable": false}}
                ]
            }}
        ]
    }"#;
    let decoded = PlanReader::new(&resolver, &registry).decode_str(text).unwrap();
    let NodeKind::Filter { condition } = &decoded.kind else {
        panic!("expected filter");
    };
    let ScalarExpr::Call(call) = condition else {
        panic!("expected call");
    };
    assert_eq!(
        call.operands[1],
        ScalarExpr::Literal {
            value: LiteralValue::Timestamp(3_129_400_000),
            ty: RelType::timestamp(),
        }
    );
}
