//! Ordered visitor chain

use std::sync::Arc;

use intercept_api::{Expr, InterceptError, Result};
use tracing::{debug, instrument};

use super::traits::ExprVisitor;

/// Ordered, immutable sequence of expression visitors.
///
/// Visitors run first-to-last, each seeing the output of the one before
/// it. The chain is closed under composition and applies in exactly the
/// order the caller supplied; there is no phase sorting and no ambient
/// registry feeding it.
#[derive(Clone, Default)]
pub struct VisitorChain {
    visitors: Vec<Arc<dyn ExprVisitor>>,
}

impl VisitorChain {
    /// Create a chain from the given visitors, preserving their order.
    pub fn new(visitors: Vec<Arc<dyn ExprVisitor>>) -> Self {
        Self { visitors }
    }

    /// A chain with no visitors: applying it is the identity.
    pub fn empty() -> Self {
        Self {
            visitors: Vec::new(),
        }
    }

    /// Append a visitor to the end of the chain.
    pub fn with_visitor(mut self, visitor: Arc<dyn ExprVisitor>) -> Self {
        self.visitors.push(visitor);
        self
    }

    /// Run every visitor in order against `expr`.
    ///
    /// Rewriting is pure and in-memory; there is no suspension point here.
    /// The first visitor failure aborts the fold and is reported with the
    /// visitor's name attached.
    #[instrument(skip_all, fields(visitors = self.visitors.len()))]
    pub fn apply(&self, mut expr: Expr) -> Result<Expr> {
        for visitor in &self.visitors {
            debug!(visitor = visitor.name(), "applying visitor");
            expr = visitor
                .visit(expr)
                .map_err(|reason| InterceptError::Visitor {
                    visitor: visitor.name().to_string(),
                    reason,
                })?;
        }
        Ok(expr)
    }

    /// Number of visitors in the chain.
    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}
