//! Projection injection.

use intercept_api::{Expr, ScalarExpr};

use super::traits::ExprVisitor;

/// Maps every row of the query through a fixed output expression.
///
/// Because the chain runs in caller order, a projection injected after a
/// filter sees filtered rows; injected before it, the filter would run
/// against the projected shape instead.
pub struct ProjectInjector {
    output: ScalarExpr,
}

impl ProjectInjector {
    pub fn new(output: ScalarExpr) -> Self {
        Self { output }
    }
}

impl ExprVisitor for ProjectInjector {
    fn name(&self) -> &'static str {
        "project_injector"
    }

    fn visit(&self, expr: Expr) -> anyhow::Result<Expr> {
        Ok(expr.project(self.output.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injector_wraps_the_current_tree() {
        let visitor = ProjectInjector::new(ScalarExpr::item().mul(ScalarExpr::lit(10)));
        let out = visitor.visit(Expr::source("numbers")).unwrap();
        assert!(matches!(out, Expr::Project { .. }));
    }
}
