use std::sync::Arc;

use intercept_api::{Expr, InterceptError, Result, RowStream};

use super::provider::QueryProvider;

/// A composable query: an expression bound to the provider that runs it.
///
/// This is the externally-owned query object of the contract. The
/// interception layer never mutates one; it reads the expression and the
/// provider and builds fresh queries from them. Cloning shares both.
pub struct Query<T>
where
    T: Send + Sync + 'static,
{
    expr: Arc<Expr>,
    provider: Arc<dyn QueryProvider<T>>,
}

impl<T> Clone for Query<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            expr: Arc::clone(&self.expr),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<T> Query<T>
where
    T: Send + Sync + 'static,
{
    /// Bind an expression to a provider. This is the `CreateQuery`
    /// operation of the external contract.
    pub fn new(expr: Expr, provider: Arc<dyn QueryProvider<T>>) -> Self {
        Self {
            expr: Arc::new(expr),
            provider,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Shared handle to the expression tree.
    ///
    /// Two queries returning pointer-equal handles are guaranteed to run
    /// the same tree; the no-op short-circuit of the interception layer
    /// is observable through this without a structural walk.
    pub fn shared_expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn provider(&self) -> &Arc<dyn QueryProvider<T>> {
        &self.provider
    }

    /// Materialize all rows.
    pub async fn fetch(&self) -> Result<Vec<T>> {
        self.provider.execute(&self.expr).await
    }

    /// Stream rows; requires the streaming capability.
    pub async fn stream(&self) -> Result<RowStream<T>> {
        let streaming =
            self.provider
                .streaming()
                .ok_or(InterceptError::UnsupportedCapability {
                    capability: "streaming enumeration",
                })?;
        streaming.execute_stream(&self.expr).await
    }
}
