//! Property tests for the rewrite pipeline.

use std::future::Future;
use std::sync::Arc;

use intercept::{
    Expr, FilterInjector, InterceptQuery, MemorySource, ProjectInjector, Query, QueryProvider,
    ScalarExpr, Value, VisitorChain,
};
use proptest::prelude::*;

fn block_on<F: Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(fut)
}

fn wrapped(values: &[i64], chain: VisitorChain) -> InterceptQuery<Value> {
    let provider: Arc<dyn QueryProvider<Value>> =
        Arc::new(MemorySource::new().with_integers("numbers", values));
    InterceptQuery::wrap(Query::new(Expr::source("numbers"), provider), chain)
}

proptest! {
    #[test]
    fn injected_filter_matches_manual_filtering(
        values in proptest::collection::vec(-100i64..100, 0..40),
        threshold in -100i64..100,
    ) {
        let chain = VisitorChain::empty().with_visitor(Arc::new(FilterInjector::new(
            ScalarExpr::item().gt(ScalarExpr::lit(threshold)),
        )));
        let rows = block_on(wrapped(&values, chain).fetch()).unwrap();

        let expected: Vec<Value> = values
            .iter()
            .copied()
            .filter(|v| *v > threshold)
            .map(Value::Integer)
            .collect();
        prop_assert_eq!(rows, expected);
    }

    #[test]
    fn enumeration_is_idempotent(
        values in proptest::collection::vec(-50i64..50, 0..30),
        threshold in -50i64..50,
        factor in 1i64..10,
    ) {
        let chain = VisitorChain::empty()
            .with_visitor(Arc::new(FilterInjector::new(
                ScalarExpr::item().gt(ScalarExpr::lit(threshold)),
            )))
            .with_visitor(Arc::new(ProjectInjector::new(
                ScalarExpr::item().mul(ScalarExpr::lit(factor)),
            )));
        let query = wrapped(&values, chain);

        let first_expr = query.rewrite().unwrap().expr().clone();
        let second_expr = query.rewrite().unwrap().expr().clone();
        prop_assert_eq!(first_expr, second_expr);

        let first = block_on(query.fetch()).unwrap();
        let second = block_on(query.fetch()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn noop_chain_shares_the_base_expression(
        values in proptest::collection::vec(-50i64..50, 0..30),
    ) {
        let query = wrapped(&values, VisitorChain::empty());
        let rewritten = query.rewrite().unwrap();
        prop_assert!(Arc::ptr_eq(
            rewritten.shared_expr(),
            query.base().shared_expr()
        ));
    }
}
