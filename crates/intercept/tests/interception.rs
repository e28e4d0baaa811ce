//! End-to-end behavior of wrapped queries against the in-memory source.

use std::sync::Arc;

use intercept::{
    EagerPathDedup, Expr, FilterInjector, FilterSet, InterceptError, InterceptQuery,
    MemorySource, ProjectInjector, Query, QueryProvider, ScalarExpr, Value, VisitorChain,
};
use tokio_stream::StreamExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn numbers_source() -> Arc<dyn QueryProvider<Value>> {
    Arc::new(MemorySource::new().with_integers("numbers", &[1, 2, 3, 4, 5]))
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Integer).collect()
}

fn gt(threshold: i64) -> ScalarExpr {
    ScalarExpr::item().gt(ScalarExpr::lit(threshold))
}

fn times(factor: i64) -> ScalarExpr {
    ScalarExpr::item().mul(ScalarExpr::lit(factor))
}

#[tokio::test]
async fn empty_chain_preserves_results() {
    init_tracing();
    let provider = numbers_source();
    let base = Query::new(Expr::source("numbers"), Arc::clone(&provider));
    let bare = base.fetch().await.unwrap();

    let wrapped = InterceptQuery::wrap(base, VisitorChain::empty());
    assert_eq!(wrapped.fetch().await.unwrap(), bare);
}

#[tokio::test]
async fn filter_visitor_end_to_end() {
    let query = InterceptQuery::wrap(
        Query::new(Expr::source("numbers"), numbers_source()),
        VisitorChain::empty().with_visitor(Arc::new(FilterInjector::new(gt(2)))),
    );
    assert_eq!(query.fetch().await.unwrap(), ints(&[3, 4, 5]));
}

#[tokio::test]
async fn filter_then_projection_end_to_end() {
    let chain = VisitorChain::empty()
        .with_visitor(Arc::new(FilterInjector::new(gt(2))))
        .with_visitor(Arc::new(ProjectInjector::new(times(10))));
    let query = InterceptQuery::wrap(Query::new(Expr::source("numbers"), numbers_source()), chain);
    assert_eq!(query.fetch().await.unwrap(), ints(&[30, 40, 50]));
}

#[tokio::test]
async fn chain_order_is_observable() {
    // project-then-filter sees projected rows: 1*10 > 2 keeps everything
    let chain = VisitorChain::empty()
        .with_visitor(Arc::new(ProjectInjector::new(times(10))))
        .with_visitor(Arc::new(FilterInjector::new(gt(2))));
    let query = InterceptQuery::wrap(Query::new(Expr::source("numbers"), numbers_source()), chain);
    assert_eq!(query.fetch().await.unwrap(), ints(&[10, 20, 30, 40, 50]));
}

#[tokio::test]
async fn repeated_enumeration_does_not_accumulate() {
    let query = InterceptQuery::wrap(
        Query::new(Expr::source("numbers"), numbers_source()),
        VisitorChain::empty().with_visitor(Arc::new(FilterInjector::new(gt(2)))),
    );

    let first = query.fetch().await.unwrap();
    let second = query.fetch().await.unwrap();
    assert_eq!(first, second);

    // the rewritten tree is re-derived from the base both times
    let a = query.rewrite().unwrap();
    let b = query.rewrite().unwrap();
    assert_eq!(a.expr(), b.expr());
    assert_eq!(*query.expr(), Expr::source("numbers"));
}

#[tokio::test]
async fn streaming_matches_materialization() {
    let query = InterceptQuery::wrap(
        Query::new(Expr::source("numbers"), numbers_source()),
        VisitorChain::empty().with_visitor(Arc::new(FilterInjector::new(gt(3)))),
    );

    let fetched = query.fetch().await.unwrap();
    let mut stream = query.stream().await.unwrap();
    let mut streamed = Vec::new();
    while let Some(row) = stream.next().await {
        streamed.push(row.unwrap());
    }
    assert_eq!(streamed, fetched);
}

#[tokio::test]
async fn include_keeps_the_visitor_chain() {
    let provider: Arc<dyn QueryProvider<Value>> = Arc::new(
        MemorySource::new()
            .with_relation(
                "orders",
                vec![
                    order(1, true),
                    order(2, false),
                    order(3, true),
                ],
            )
            .with_relation("items", vec![item(1, "widget"), item(3, "gadget")]),
    );
    let open_only = FilterSet::new()
        .add("open", ScalarExpr::field("open").eq(ScalarExpr::lit(true)))
        .into_chain();

    let query = InterceptQuery::wrap(Query::new(Expr::source("orders"), provider), open_only);
    let augmented = query.include("items").unwrap();

    // same chain applies to the augmented query
    let rows = augmented.fetch().await.unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let Value::Object(fields) = row else {
            panic!("expected object rows");
        };
        assert_eq!(fields["open"], Value::Bool(true));
        assert!(matches!(fields["items"], Value::Array(_)));
    }

    // and the original query is left without the eager path
    assert!(query.expr().eager_paths().is_empty());
}

#[tokio::test]
async fn include_of_unknown_relation_propagates_the_failure() {
    let query = InterceptQuery::wrap(
        Query::new(Expr::source("numbers"), numbers_source()),
        VisitorChain::empty(),
    );
    let err = query.include("nope").unwrap_err();
    assert!(matches!(err, InterceptError::Provider { .. }));
}

#[tokio::test]
async fn eager_dedup_composes_with_include() {
    let provider: Arc<dyn QueryProvider<Value>> = Arc::new(
        MemorySource::new()
            .with_relation("orders", vec![order(1, true)])
            .with_relation("items", vec![item(1, "widget")]),
    );
    let chain = VisitorChain::empty().with_visitor(Arc::new(EagerPathDedup));
    let query = InterceptQuery::wrap(Query::new(Expr::source("orders"), provider), chain);

    let augmented = query.include("items").unwrap().include("items").unwrap();
    assert_eq!(augmented.expr().eager_paths().len(), 2);

    // the dedup visitor collapses the duplicate at execution time
    let rewritten = augmented.rewrite().unwrap();
    assert_eq!(rewritten.expr().eager_paths(), ["items"]);
    assert_eq!(augmented.fetch().await.unwrap().len(), 1);
}

#[tokio::test]
async fn terminal_operations_apply_the_chain() {
    let query = InterceptQuery::wrap(
        Query::new(Expr::source("numbers"), numbers_source()),
        VisitorChain::empty().with_visitor(Arc::new(FilterInjector::new(gt(4)))),
    );
    assert_eq!(query.first().await.unwrap(), Some(Value::Integer(5)));
    assert_eq!(query.count().await.unwrap(), 1);
}

#[tokio::test]
async fn composition_on_the_wrapped_query_stays_intercepted() {
    let query = InterceptQuery::wrap(
        Query::new(Expr::source("numbers"), numbers_source()),
        VisitorChain::empty().with_visitor(Arc::new(FilterInjector::new(gt(2)))),
    );

    // caller composes on the clean base; the injected filter still applies,
    // wrapping the composed shape: (numbers * 2) kept where > 2
    let composed = query.project(times(2));
    assert_eq!(composed.fetch().await.unwrap(), ints(&[4, 6, 8, 10]));

    // a second composition step keeps going through the wrapped provider
    let twice = composed.take(2);
    assert_eq!(twice.fetch().await.unwrap(), ints(&[4]));
}

fn order(id: i64, open: bool) -> Value {
    Value::Object(
        [
            ("id".to_string(), Value::Integer(id)),
            ("open".to_string(), Value::Bool(open)),
        ]
        .into_iter()
        .collect(),
    )
}

fn item(parent: i64, sku: &str) -> Value {
    Value::Object(
        [
            ("parent".to_string(), Value::Integer(parent)),
            ("sku".to_string(), Value::String(sku.to_string())),
        ]
        .into_iter()
        .collect(),
    )
}
