//! Filter injection: the building block of query filtering.

use std::sync::Arc;

use intercept_api::{Expr, ScalarExpr};

use super::chain::VisitorChain;
use super::traits::ExprVisitor;

/// Wraps the query in a predicate at rewrite time.
///
/// The filter never shows up in the expression a caller composes on: it
/// is re-applied from scratch on every execution, so two enumerations of
/// the same query see the same filtering and the base tree stays clean.
pub struct FilterInjector {
    predicate: ScalarExpr,
}

impl FilterInjector {
    pub fn new(predicate: ScalarExpr) -> Self {
        Self { predicate }
    }
}

impl ExprVisitor for FilterInjector {
    fn name(&self) -> &'static str {
        "filter_injector"
    }

    fn visit(&self, expr: Expr) -> anyhow::Result<Expr> {
        Ok(expr.filter(self.predicate.clone()))
    }
}

/// Named filters assembled before wrapping a query.
///
/// Filters compile to [`FilterInjector`]s in insertion order. Disabling
/// keeps the entry (so a later `enable` can bring it back) but skips it
/// when the set becomes a chain. The set is a plain value the caller
/// builds and hands over; there is no registry behind it.
#[derive(Default)]
pub struct FilterSet {
    filters: Vec<NamedFilter>,
}

struct NamedFilter {
    name: String,
    predicate: ScalarExpr,
    enabled: bool,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter, enabled, at the end of the set.
    pub fn add(mut self, name: impl Into<String>, predicate: ScalarExpr) -> Self {
        self.filters.push(NamedFilter {
            name: name.into(),
            predicate,
            enabled: true,
        });
        self
    }

    pub fn enable(self, name: &str) -> Self {
        self.set_enabled(name, true)
    }

    pub fn disable(self, name: &str) -> Self {
        self.set_enabled(name, false)
    }

    fn set_enabled(mut self, name: &str, enabled: bool) -> Self {
        for filter in &mut self.filters {
            if filter.name == name {
                filter.enabled = enabled;
            }
        }
        self
    }

    /// Compile the enabled filters into a visitor chain, insertion order.
    pub fn into_chain(self) -> VisitorChain {
        let visitors = self
            .filters
            .into_iter()
            .filter(|f| f.enabled)
            .map(|f| Arc::new(FilterInjector::new(f.predicate)) as Arc<dyn ExprVisitor>)
            .collect();
        VisitorChain::new(visitors)
    }
}
