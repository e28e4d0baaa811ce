//! Eager-load path normalization.

use intercept_api::Expr;

use super::traits::ExprVisitor;

/// Collapses redundant eager-load paths on the root source.
///
/// Exact duplicates are dropped, and a path that is a dot-prefix of
/// another is subsumed by it: loading `"orders.items"` already brings in
/// `"orders"`. When nothing is redundant the tree comes back unchanged,
/// so an already-normalized query still short-circuits at rewrite time.
pub struct EagerPathDedup;

impl ExprVisitor for EagerPathDedup {
    fn name(&self) -> &'static str {
        "eager_path_dedup"
    }

    fn visit(&self, expr: Expr) -> anyhow::Result<Expr> {
        let paths = expr.eager_paths();
        let normalized = normalize(paths);
        if normalized.len() == paths.len() {
            return Ok(expr);
        }
        Ok(expr.with_eager_paths(normalized))
    }
}

/// `longer` subsumes `shorter` when it extends it by at least one segment.
fn subsumes(longer: &str, shorter: &str) -> bool {
    longer.len() > shorter.len()
        && longer.starts_with(shorter)
        && longer.as_bytes()[shorter.len()] == b'.'
}

fn normalize(paths: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for path in paths {
        if kept.iter().any(|k| k == path || subsumes(k, path)) {
            continue;
        }
        kept.retain(|k| !subsumes(path, k));
        kept.push(path.clone());
    }
    kept
}
