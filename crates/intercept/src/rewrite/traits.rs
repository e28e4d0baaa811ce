//! Core trait for expression rewriting

use intercept_api::Expr;

/// A pure transformation over a query expression tree.
///
/// Implement this trait to inject behavior into every execution of a
/// wrapped query. Visitors must be total: a tree the visitor does not
/// care about comes back unchanged. Returning an error aborts the whole
/// rewrite; a partially transformed tree cannot be safely executed, so
/// there is no partial-application fallback.
///
/// # Example
///
/// ```rust,ignore
/// struct MyVisitor;
///
/// impl ExprVisitor for MyVisitor {
///     fn visit(&self, expr: Expr) -> anyhow::Result<Expr> {
///         // rebuild the tree here
///         Ok(expr)
///     }
/// }
/// ```
pub trait ExprVisitor: Send + Sync {
    /// Human-readable name for logging and error reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Transform the expression, returning the (possibly identical) tree.
    fn visit(&self, expr: Expr) -> anyhow::Result<Expr>;
}
