//! End-to-end range query tests against the in-memory store.
//!
//! These tests cover:
//! - Field sequence and range compilation for the documented scenarios
//! - Index reuse and determinism
//! - Duplicate and unsupported selectors
//! - Materialization and type mismatches
//! - Store errors, timeouts and pagination

use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use settee::prelude::*;
use settee::{ErrorCode, FieldPath, NodeKind, QueryConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Widget {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Price")]
    price: i64,
}

impl Entity for Widget {
    const ENTITY_NAME: &'static str = "Widget";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Doodad {
    #[serde(rename = "Name")]
    name: String,
}

impl Entity for Doodad {
    const ENTITY_NAME: &'static str = "Doodad";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LineItem {
    #[serde(rename = "Sku")]
    sku: String,
    #[serde(rename = "Qty")]
    qty: i64,
}

impl Entity for LineItem {
    const ENTITY_NAME: &'static str = "line-item";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    #[serde(rename = "Sensor1")]
    sensor1: i64,
    #[serde(rename = "Sensor2")]
    sensor2: i64,
}

impl Entity for Reading {
    const ENTITY_NAME: &'static str = "Reading";
}

fn widget(name: &str, price: i64) -> Widget {
    Widget {
        name: name.to_string(),
        price,
    }
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (id, name, price) in [
        ("1", "gizmo", 12),
        ("2", "gizmo", 8),
        ("3", "gizmo", 40),
        ("4", "sprocket", 25),
        ("5", "sprocket", 60),
    ] {
        store.put_entity(id, &widget(name, price)).unwrap();
    }
    store
        .put_entity("1", &Doodad { name: "gizmo".into() })
        .unwrap();
    store
}

fn widgets(store: MemoryStore) -> Repository<MemoryStore, Widget> {
    Repository::new(store)
}

// ============================================================================
// Compilation scenarios
// ============================================================================

#[test]
fn test_equal_then_greater_or_equal_compiles() {
    let spec = widgets(MemoryStore::new())
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .and(select!(w => w.Price))
        .unwrap()
        .greater_or_equal(10)
        .spec();

    let fields: Vec<String> = spec.fields().iter().map(ToString::to_string).collect();
    assert_eq!(fields, vec!["Name", "Price"]);
    assert_eq!(spec.range.start.to_json(), json!(["gizmo", 10]));
    assert_eq!(spec.range.end.to_json(), json!(["gizmo", null]));
}

#[test]
fn test_between_compiles_inclusive() {
    let spec = widgets(MemoryStore::new())
        .r#where(select!(w => w.Price))
        .unwrap()
        .between(5, 50)
        .spec();

    assert_eq!(spec.range.start.to_json(), json!([5]));
    assert_eq!(spec.range.end.to_json(), json!([50]));
    assert!(spec.range.inclusive_start);
    assert!(spec.range.inclusive_end);
}

#[test]
fn test_equal_only_pins_every_position() {
    let spec = widgets(MemoryStore::new())
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .and(select!(w => w.Price))
        .unwrap()
        .equal(12)
        .spec();
    assert_eq!(spec.range.start, spec.range.end);
}

#[test]
fn test_duplicate_field_is_rejected() {
    let err = widgets(MemoryStore::new())
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("a")
        .and(select!(w => w.Name))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::DuplicateField);
    assert!(err.to_string().contains("Name"));
}

#[test]
fn test_method_call_selector_is_rejected() {
    let err = widgets(MemoryStore::new())
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("a")
        .and(select!(w => w.Name.to_lowercase()))
        .unwrap_err();

    match err {
        QueryError::UnsupportedExpression { expression, kind } => {
            assert_eq!(expression, "w.Name.to_lowercase()");
            assert_eq!(kind, NodeKind::Call);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_spec_is_reproducible() {
    let build = || {
        widgets(MemoryStore::new())
            .r#where(select!(w => w.Name))
            .unwrap()
            .equal("gizmo")
            .and(select!(w => w.Price))
            .unwrap()
            .less_or_equal(30)
            .spec()
    };
    let (a, b) = (build(), build());
    assert_eq!(a.index.name, b.index.name);
    assert_eq!(a.index.map, b.index.map);
    assert_eq!(a.range, b.range);
    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn test_field_order_changes_the_index() {
    let repo = widgets(MemoryStore::new());
    let name_first = repo
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .and(select!(w => w.Price))
        .unwrap()
        .equal(1)
        .spec();
    let price_first = repo
        .r#where(select!(w => w.Price))
        .unwrap()
        .equal(1)
        .and(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .spec();
    assert_ne!(name_first.index.name, price_first.index.name);
}

// ============================================================================
// Execution
// ============================================================================

#[tokio::test]
async fn test_equal_then_range_returns_matches_in_key_order() {
    let found = widgets(seeded_store())
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .and(select!(w => w.Price))
        .unwrap()
        .greater_or_equal(10)
        .exec()
        .await
        .unwrap();

    assert_eq!(found, vec![widget("gizmo", 12), widget("gizmo", 40)]);
}

#[tokio::test]
async fn test_between_over_all_names() {
    let found = widgets(seeded_store())
        .r#where(select!(w => w.Price))
        .unwrap()
        .between(5, 50)
        .exec()
        .await
        .unwrap();

    let prices: Vec<i64> = found.iter().map(|w| w.price).collect();
    assert_eq!(prices, vec![8, 12, 25, 40]);
}

#[tokio::test]
async fn test_range_then_upper_bound() {
    let found = widgets(seeded_store())
        .r#where(select!(w => w.Name))
        .unwrap()
        .between("gizmo", "sprocket")
        .and(select!(w => w.Price))
        .unwrap()
        .less_or_equal(30)
        .exec()
        .await
        .unwrap();

    // the upper bound only applies at the end of the name range
    let names: Vec<(String, i64)> = found.into_iter().map(|w| (w.name, w.price)).collect();
    assert_eq!(
        names,
        vec![
            ("gizmo".to_string(), 8),
            ("gizmo".to_string(), 12),
            ("gizmo".to_string(), 40),
            ("sprocket".to_string(), 25),
        ]
    );
}

#[tokio::test]
async fn test_shared_prefix_reuses_the_index() {
    let store = seeded_store();
    let repo = widgets(store.clone());
    let gizmos = repo
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo");

    let cheap = gizmos
        .and(select!(w => w.Price))
        .unwrap()
        .less_or_equal(10);
    let pricey = gizmos
        .and(select!(w => w.Price))
        .unwrap()
        .greater_or_equal(30);
    let (cheap, pricey) = futures::join!(cheap.exec(), pricey.exec());

    assert_eq!(cheap.unwrap(), vec![widget("gizmo", 8)]);
    assert_eq!(pricey.unwrap(), vec![widget("gizmo", 40)]);
    assert_eq!(store.indexes(), vec!["by-Name-Price".to_string()]);
}

#[tokio::test]
async fn test_results_are_restartable_per_call() {
    let query = widgets(seeded_store())
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("sprocket");

    let first = query.exec().await.unwrap();
    let second = query.exec().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_foreign_document_is_a_type_mismatch() {
    let store = MemoryStore::new();
    store.put_entity("1", &widget("gizmo", 12)).unwrap();
    store.put("widget-2", json!({"Name": "gizmo"}));

    let mut stream = widgets(store)
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .list()
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), widget("gizmo", 12));
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.code(), ErrorCode::TypeMismatch);
    assert!(err.to_string().contains("widget-2"));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_documents_of_other_entities_are_not_scanned() {
    let doodads: Repository<_, Doodad> = Repository::new(seeded_store());
    let found = doodads
        .r#where(select!(w => w.Name))
        .unwrap()
        .equal("gizmo")
        .exec()
        .await
        .unwrap();
    assert_eq!(found, vec![Doodad { name: "gizmo".into() }]);
}

#[tokio::test]
async fn test_scan_failure_propagates() {
    let store = seeded_store();
    store.fail_next_scan(StoreError::unavailable("connection reset"));

    let err = widgets(store)
        .r#where(select!(w => w.Price))
        .unwrap()
        .greater_or_equal(0)
        .exec()
        .await
        .unwrap_err();

    assert!(err.is_store_error());
    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let store = seeded_store().with_latency(Duration::from_millis(250));
    let config = QueryConfig::builder()
        .timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let err = widgets(store)
        .with_config(config)
        .r#where(select!(w => w.Price))
        .unwrap()
        .greater_or_equal(0)
        .exec()
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_pagination() {
    let repo = widgets(seeded_store());
    let spec = repo
        .r#where(select!(w => w.Price))
        .unwrap()
        .greater_or_equal(0)
        .spec()
        .skip(1)
        .take(2);

    let page = repo
        .execute(&spec)
        .await
        .unwrap()
        .try_collect_vec()
        .await
        .unwrap();
    let prices: Vec<i64> = page.iter().map(|w| w.price).collect();
    assert_eq!(prices, vec![12, 25]);
}

#[tokio::test]
async fn test_runtime_assembled_chain() {
    let repo = widgets(seeded_store());
    let chain = ConstraintChain::new()
        .try_push(Constraint::new(
            FieldPath::parse("Name").unwrap(),
            Bound::Equal("sprocket".into()),
        ))
        .unwrap()
        .try_push(Constraint::open(FieldPath::parse("Price").unwrap()))
        .unwrap();

    let spec = repo.spec_for(&chain).unwrap();
    assert_eq!(spec.index.name, "by-Name-Price");

    let found = repo
        .execute(&spec)
        .await
        .unwrap()
        .try_collect_vec()
        .await
        .unwrap();
    assert_eq!(found, vec![widget("sprocket", 25), widget("sprocket", 60)]);
}

#[tokio::test]
async fn test_hyphenated_entity_name_round_trips() {
    let store = MemoryStore::new();
    for (id, sku, qty) in [("1", "A-1", 3), ("2", "B-7", 9)] {
        store
            .put_entity(id, &LineItem { sku: sku.into(), qty })
            .unwrap();
    }

    let items: Repository<_, LineItem> = Repository::new(store);
    let found = items
        .r#where(select!(i => i.Qty))
        .unwrap()
        .greater_or_equal(5usize)
        .exec()
        .await
        .unwrap();
    assert_eq!(
        found,
        vec![LineItem {
            sku: "B-7".into(),
            qty: 9
        }]
    );
}

#[tokio::test]
async fn test_lossy_field_names_get_separate_indexes() {
    let store = MemoryStore::new();
    store
        .put_entity("1", &Reading { sensor1: 4, sensor2: 40 })
        .unwrap();
    let readings: Repository<_, Reading> = Repository::new(store.clone());

    let by_first = readings
        .r#where(select!(r => r.Sensor1))
        .unwrap()
        .greater_or_equal(0)
        .exec()
        .await
        .unwrap();
    let by_second = readings
        .r#where(select!(r => r.Sensor2))
        .unwrap()
        .greater_or_equal(10)
        .exec()
        .await
        .unwrap();
    assert_eq!(by_first, by_second);
    assert_eq!(store.indexes().len(), 2);

    let nested = widgets(store.clone())
        .r#where(select!(w => w.Owner.Name))
        .unwrap()
        .equal("ann")
        .spec();
    let split = widgets(store.clone())
        .r#where(select!(w => w.Owner))
        .unwrap()
        .equal("ann")
        .and(select!(w => w.Name))
        .unwrap()
        .equal("ann")
        .spec();
    assert_ne!(nested.index.name, split.index.name);
    store.ensure_index(&nested.index).await.unwrap();
    store.ensure_index(&split.index).await.unwrap();
    assert_eq!(store.indexes().len(), 4);
}
