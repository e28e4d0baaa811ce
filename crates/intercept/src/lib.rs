//! Query interception.
//!
//! Wrap a composable query together with an ordered chain of expression
//! visitors; every enumeration re-runs the chain against the untouched
//! base expression and hands the result to the backing provider. The
//! wrapped query still composes: filters, projections and eager-load
//! augmentation all stay intercepted.

pub mod cache;
pub mod memory;
pub mod query;
pub mod rewrite;

pub use cache::CachedSource;
pub use memory::MemorySource;
pub use query::{EagerLoadSource, InterceptProvider, InterceptQuery, Query, QueryProvider, StreamSource};
pub use rewrite::{
    EagerPathDedup, ExprVisitor, FilterInjector, FilterSet, ProjectInjector, VisitorChain,
};

// Re-export the shared IR so callers need a single dependency
pub use intercept_api::{
    from_rows, BinaryOp, Expr, InterceptError, Result, RowStream, ScalarExpr, Value,
};
