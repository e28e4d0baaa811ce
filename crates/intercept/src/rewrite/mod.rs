//! Expression rewriting pipeline.
//!
//! A wrapped query carries an ordered chain of [`ExprVisitor`]s. On every
//! execution the chain runs against the query's untouched base expression
//! and the result is handed to the backing provider. Visitors are pure:
//! they build new trees, they never mutate shared state, and a visitor
//! that does not recognize a tree returns it unchanged so the chain stays
//! composable.
//!
//! Order is the caller's and it is significant: a filter injected before a
//! projection sees un-projected rows, and the other way around. The chain
//! never reorders what it was given.
//!
//! # Example
//!
//! ```rust,ignore
//! use intercept::rewrite::{FilterInjector, VisitorChain};
//!
//! let chain = VisitorChain::empty()
//!     .with_visitor(Arc::new(FilterInjector::new(predicate)));
//! let rewritten = chain.apply(expr)?;
//! ```

mod chain;
mod eager_dedup;
mod filter_injector;
mod project_injector;
mod traits;

pub use chain::VisitorChain;
pub use eager_dedup::EagerPathDedup;
pub use filter_injector::{FilterInjector, FilterSet};
pub use project_injector::ProjectInjector;
pub use traits::ExprVisitor;
