use std::fmt;
use std::sync::{Arc, OnceLock};

use intercept_api::{Expr, InterceptError, Result, RowStream, ScalarExpr};
use tracing::debug;

use super::base::Query;
use super::provider::QueryProvider;
use crate::rewrite::VisitorChain;

/// A query wrapped with a visitor chain.
///
/// The wrapped query keeps exposing the *un-rewritten* base expression:
/// composition builds on the clean tree, and the chain runs against that
/// base on every execution, never against the output of a previous
/// rewrite, so nothing accumulates across enumerations.
pub struct InterceptQuery<T>
where
    T: Send + Sync + 'static,
{
    base: Query<T>,
    chain: Arc<VisitorChain>,
    provider: OnceLock<Arc<InterceptProvider<T>>>,
}

impl<T> fmt::Debug for InterceptQuery<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptQuery")
            .field("expr", self.base.expr())
            .finish_non_exhaustive()
    }
}

impl<T> InterceptQuery<T>
where
    T: Send + Sync + 'static,
{
    /// Wrap `query` with `chain`. An empty chain is a passthrough.
    pub fn wrap(query: Query<T>, chain: VisitorChain) -> Self {
        Self::wrap_shared(query, Arc::new(chain))
    }

    fn wrap_shared(query: Query<T>, chain: Arc<VisitorChain>) -> Self {
        Self {
            base: query,
            chain,
            provider: OnceLock::new(),
        }
    }

    /// The un-rewritten base expression.
    ///
    /// Deliberate asymmetry: enumeration runs the rewritten tree, but
    /// composition gets the clean base so caller-added operators stack on
    /// top of what they wrote, not on what the visitors produced.
    pub fn expr(&self) -> &Expr {
        self.base.expr()
    }

    /// The wrapped base query, untouched.
    pub fn base(&self) -> &Query<T> {
        &self.base
    }

    pub fn chain(&self) -> &Arc<VisitorChain> {
        &self.chain
    }

    /// The interception provider for this query.
    ///
    /// Built on first access and cached for the query's lifetime. The
    /// cell is idempotent under concurrent first access; every candidate
    /// provider is equivalent, so whichever lands first wins.
    pub fn provider(&self) -> &Arc<InterceptProvider<T>> {
        self.provider.get_or_init(|| {
            Arc::new(InterceptProvider::new(
                Arc::clone(self.base.provider()),
                Arc::clone(&self.chain),
            ))
        })
    }

    /// Run the chain against the base expression and bind the result.
    ///
    /// When no visitor changed the tree this hands back the original
    /// query (same shared expression, no new binding), so an
    /// all-identity chain costs nothing extra.
    pub fn rewrite(&self) -> Result<Query<T>> {
        let rewritten = self.chain.apply(self.base.expr().clone())?;
        if rewritten == *self.base.expr() {
            return Ok(self.base.clone());
        }
        debug!(source = rewritten.source_name(), "expression rewritten");
        Ok(Query::new(rewritten, Arc::clone(self.base.provider())))
    }

    /// Rewrite, then materialize all rows.
    pub async fn fetch(&self) -> Result<Vec<T>> {
        self.rewrite()?.fetch().await
    }

    /// Rewrite, then stream rows; requires the streaming capability.
    pub async fn stream(&self) -> Result<RowStream<T>> {
        self.rewrite()?.stream().await
    }

    /// First row of the rewritten query, if any. Terminal operation:
    /// goes through the interception provider, which rewrites before
    /// delegating.
    pub async fn first(&self) -> Result<Option<T>> {
        let rows = self.provider().execute(self.base.expr()).await?;
        Ok(rows.into_iter().next())
    }

    /// Number of rows the query produces.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.provider().execute(self.base.expr()).await?.len())
    }

    /// Ask the backing source to eager-load `path`, keeping interception.
    ///
    /// Probes the eager-load capability on the base provider; when it is
    /// absent this fails with `UnsupportedCapability` and the current
    /// query is left untouched. The augmented query carries the same
    /// visitor chain as this one.
    pub fn include(&self, path: &str) -> Result<InterceptQuery<T>> {
        let eager =
            self.base
                .provider()
                .eager_loading()
                .ok_or(InterceptError::UnsupportedCapability {
                    capability: "eager-load augmentation",
                })?;
        let augmented = eager.add_eager_load_path(self.base.expr(), path)?;
        Ok(Self::wrap_shared(
            Query::new(augmented, Arc::clone(self.base.provider())),
            Arc::clone(&self.chain),
        ))
    }

    /// Compose a filter on the base expression; the result stays wrapped.
    pub fn filter(&self, predicate: ScalarExpr) -> InterceptQuery<T> {
        self.provider()
            .create_query(self.base.expr().clone().filter(predicate))
    }

    /// Compose a projection on the base expression.
    pub fn project(&self, output: ScalarExpr) -> InterceptQuery<T> {
        self.provider()
            .create_query(self.base.expr().clone().project(output))
    }

    pub fn take(&self, count: usize) -> InterceptQuery<T> {
        self.provider()
            .create_query(self.base.expr().clone().take(count))
    }

    pub fn skip(&self, count: usize) -> InterceptQuery<T> {
        self.provider()
            .create_query(self.base.expr().clone().skip(count))
    }
}

/// Keeps composed queries wrapped.
///
/// Holds the visitor chain it needs directly and the provider it
/// delegates to; there is no back-reference to the query that created
/// it, so ownership stays a straight line.
pub struct InterceptProvider<T>
where
    T: Send + Sync + 'static,
{
    inner: Arc<dyn QueryProvider<T>>,
    chain: Arc<VisitorChain>,
}

impl<T> InterceptProvider<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(inner: Arc<dyn QueryProvider<T>>, chain: Arc<VisitorChain>) -> Self {
        Self { inner, chain }
    }

    /// Build a wrapped query for `expr` instead of handing back a bare
    /// one, so chained composition keeps being intercepted.
    pub fn create_query(&self, expr: Expr) -> InterceptQuery<T> {
        InterceptQuery::wrap_shared(
            Query::new(expr, Arc::clone(&self.inner)),
            Arc::clone(&self.chain),
        )
    }

    /// Rewrite `expr` and execute it against the wrapped provider.
    ///
    /// For terminal operations (first row, counts) that need no further
    /// composition wrapping.
    pub async fn execute(&self, expr: &Expr) -> Result<Vec<T>> {
        let rewritten = self.chain.apply(expr.clone())?;
        self.inner.execute(&rewritten).await
    }
}
