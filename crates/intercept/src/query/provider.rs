//! Contracts between the interception layer and a backing data source.
//!
//! The layer treats the source as an external collaborator reached
//! through a deliberately narrow surface: execute an expression, and two
//! optional capabilities. Capabilities are probed through named accessors
//! that return `Option`, never through downcasting, so an absent
//! capability is an ordinary [`UnsupportedCapability`] error at the call
//! site instead of a cast failure at runtime.
//!
//! [`UnsupportedCapability`]: intercept_api::InterceptError::UnsupportedCapability

use async_trait::async_trait;
use intercept_api::{Expr, Result, RowStream};

/// Minimal execution contract the interception layer requires.
///
/// `execute` is the only mandatory operation and the only place a
/// round-trip to the backing store happens. Implementations report their
/// own failures as [`InterceptError::Provider`]; the layer passes them
/// through without retrying.
///
/// [`InterceptError::Provider`]: intercept_api::InterceptError::Provider
#[async_trait]
pub trait QueryProvider<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Materialize every row the expression produces.
    async fn execute(&self, expr: &Expr) -> Result<Vec<T>>;

    /// Probe for cooperative streaming. `None` means the source can only
    /// materialize.
    fn streaming(&self) -> Option<&dyn StreamSource<T>> {
        None
    }

    /// Probe for eager-load augmentation.
    fn eager_loading(&self) -> Option<&dyn EagerLoadSource> {
        None
    }
}

/// Streaming execution capability.
#[async_trait]
pub trait StreamSource<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Stream rows as the source produces them.
    ///
    /// Suspension happens inside the stream, at the source's pace.
    /// Dropping the stream cancels the enumeration.
    async fn execute_stream(&self, expr: &Expr) -> Result<RowStream<T>>;
}

/// Eager-load augmentation capability.
pub trait EagerLoadSource: Send + Sync {
    /// Return a new expression with `path` attached to the query root.
    ///
    /// Implementations validate the path: an unknown path is a provider
    /// failure, not a silent no-op.
    fn add_eager_load_path(&self, expr: &Expr, path: &str) -> Result<Expr>;
}
