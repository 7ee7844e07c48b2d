//! Benchmarks for query building and compilation.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use settee_query::error::StoreResult;
use settee_query::traits::{BoxFuture, DocumentStream, ScanRequest};
use settee_query::{
    Bound, Constraint, ConstraintChain, DocumentStore, Entity, FieldPath, IndexDefinition,
    QueryResult, RangeSpec, Repository, Selector, select,
};
use std::hint::black_box;

struct NullStore;

impl DocumentStore for NullStore {
    fn ensure_index<'a>(&'a self, _: &'a IndexDefinition) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn range_scan(&self, _: ScanRequest) -> BoxFuture<'_, StoreResult<DocumentStream>> {
        Box::pin(async { Ok(futures::stream::empty().boxed()) })
    }
}

#[derive(Deserialize)]
struct Widget {}

impl Entity for Widget {
    const ENTITY_NAME: &'static str = "Widget";
}

fn path_of(selector: Selector<Widget>) -> QueryResult<FieldPath> {
    selector.path()
}

fn equality_chain(columns: usize) -> ConstraintChain {
    (0..columns).fold(ConstraintChain::new(), |chain, i| {
        let path = FieldPath::parse(&format!("Field{}", i)).expect("valid path");
        chain
            .try_push(Constraint::new(path, Bound::Equal((i as i64).into())))
            .expect("unique fields")
    })
}

/// Benchmark selector capture and path extraction.
fn bench_selectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("selectors");

    group.bench_function("select_member", |b| {
        b.iter(|| black_box(path_of(select!(w => w.Owner.Address.City))))
    });

    group.bench_function("reject_call", |b| {
        b.iter(|| black_box(path_of(select!(w => w.Name.len()))))
    });

    group.finish();
}

/// Benchmark the staged builder end to end.
fn bench_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");
    let repo: Repository<NullStore, Widget> = Repository::new(NullStore);

    group.bench_function("equal_then_range_spec", |b| {
        b.iter(|| {
            let spec = repo
                .r#where(select!(w => w.Name))
                .and_then(|op| op.equal("gizmo").and(select!(w => w.Price)))
                .map(|op| op.greater_or_equal(10).spec());
            black_box(spec)
        })
    });

    let prefix = repo
        .r#where(select!(w => w.Name))
        .expect("valid selector")
        .equal("gizmo");
    group.bench_function("extend_shared_prefix", |b| {
        b.iter(|| {
            black_box(
                prefix
                    .and(select!(w => w.Price))
                    .map(|op| op.between(5, 50).spec()),
            )
        })
    });

    group.finish();
}

/// Benchmark index generation and range compilation by key width.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for columns in [1usize, 4, 16] {
        let chain = equality_chain(columns);
        let fields = chain.fields();
        let constraints = chain.constraints();
        group.throughput(Throughput::Elements(columns as u64));

        group.bench_with_input(BenchmarkId::new("index", columns), &fields, |b, fields| {
            b.iter(|| black_box(IndexDefinition::generate("by", "widget", fields)))
        });

        group.bench_with_input(
            BenchmarkId::new("range", columns),
            &constraints,
            |b, constraints| b.iter(|| black_box(RangeSpec::compile(constraints))),
        );
    }

    group.finish();
}

/// Benchmark key membership checks.
fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    let range = RangeSpec::compile(&[
        Constraint::new(
            FieldPath::parse("Name").expect("valid path"),
            Bound::Equal("gizmo".into()),
        ),
        Constraint::new(
            FieldPath::parse("Price").expect("valid path"),
            Bound::Between(5.into(), 50.into()),
        ),
    ]);
    let inside = [json!("gizmo"), json!(20)];
    let outside = [json!("sprocket"), json!(20)];

    group.bench_function("hit", |b| b.iter(|| black_box(range.contains(&inside))));
    group.bench_function("miss", |b| b.iter(|| black_box(range.contains(&outside))));

    group.finish();
}

criterion_group!(
    benches,
    bench_selectors,
    bench_builder,
    bench_compile,
    bench_contains
);
criterion_main!(benches);
