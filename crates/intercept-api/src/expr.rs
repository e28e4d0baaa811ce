//! Expression IR for deferred, composable queries.
//!
//! An [`Expr`] is an immutable tree describing a computation over a named
//! data source. It is pure data: providers interpret it, visitors rewrite
//! it, and structural equality (`PartialEq`) tells the interception layer
//! whether a rewrite actually changed anything.

use serde::{Deserialize, Serialize};

use crate::Value;

/// Binary operators usable inside [`ScalarExpr::Binary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

/// A row-level expression: predicates and projections are built from these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScalarExpr {
    /// The current row itself.
    Item,
    /// A named field of the current row (rows must be objects).
    Field(String),
    /// A constant.
    Literal(Value),
    /// Binary application, e.g. `Item > 2`.
    Binary {
        op: BinaryOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    /// Boolean negation.
    Not(Box<ScalarExpr>),
}

impl ScalarExpr {
    /// The current row.
    pub fn item() -> Self {
        ScalarExpr::Item
    }

    /// A named field of the current row.
    pub fn field(name: impl Into<String>) -> Self {
        ScalarExpr::Field(name.into())
    }

    /// A constant value.
    pub fn lit(value: impl Into<Value>) -> Self {
        ScalarExpr::Literal(value.into())
    }

    fn binary(self, op: BinaryOp, rhs: ScalarExpr) -> Self {
        ScalarExpr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    pub fn eq(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Eq, rhs)
    }

    pub fn ne(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Ne, rhs)
    }

    pub fn lt(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    pub fn le(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Le, rhs)
    }

    pub fn gt(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    pub fn ge(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Ge, rhs)
    }

    pub fn and(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    pub fn add(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Add, rhs)
    }

    pub fn sub(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Sub, rhs)
    }

    pub fn mul(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Mul, rhs)
    }

    pub fn div(self, rhs: ScalarExpr) -> Self {
        self.binary(BinaryOp::Div, rhs)
    }

    pub fn not(self) -> Self {
        ScalarExpr::Not(Box::new(self))
    }
}

/// A query expression tree.
///
/// The root is always a [`Expr::Source`]; every other node wraps exactly
/// one input. Eager-load paths live on the source node because they are a
/// property of how the source materializes rows, not of the pipeline above
/// it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A named relation of the backing source, with the eager-load paths
    /// requested for it.
    Source { name: String, eager: Vec<String> },
    /// Keep rows for which `predicate` evaluates to `Bool(true)`.
    Filter {
        input: Box<Expr>,
        predicate: ScalarExpr,
    },
    /// Map every row through `output`.
    Project { input: Box<Expr>, output: ScalarExpr },
    /// Keep at most `count` rows.
    Take { input: Box<Expr>, count: usize },
    /// Drop the first `count` rows.
    Skip { input: Box<Expr>, count: usize },
}

impl Expr {
    /// A query over the named relation, no eager-load paths.
    pub fn source(name: impl Into<String>) -> Self {
        Expr::Source {
            name: name.into(),
            eager: Vec::new(),
        }
    }

    pub fn filter(self, predicate: ScalarExpr) -> Self {
        Expr::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project(self, output: ScalarExpr) -> Self {
        Expr::Project {
            input: Box::new(self),
            output,
        }
    }

    pub fn take(self, count: usize) -> Self {
        Expr::Take {
            input: Box::new(self),
            count,
        }
    }

    pub fn skip(self, count: usize) -> Self {
        Expr::Skip {
            input: Box::new(self),
            count,
        }
    }

    /// Name of the root source relation.
    pub fn source_name(&self) -> &str {
        self.root().0
    }

    /// Eager-load paths attached to the root source.
    pub fn eager_paths(&self) -> &[String] {
        self.root().1
    }

    fn root(&self) -> (&str, &[String]) {
        let mut node = self;
        loop {
            match node {
                Expr::Source { name, eager } => return (name, eager),
                Expr::Filter { input, .. }
                | Expr::Project { input, .. }
                | Expr::Take { input, .. }
                | Expr::Skip { input, .. } => node = input.as_ref(),
            }
        }
    }

    /// Rebuild the tree with `path` appended to the root source.
    pub fn with_eager_path(&self, path: &str) -> Expr {
        let mut paths: Vec<String> = self.eager_paths().to_vec();
        paths.push(path.to_string());
        self.with_eager_paths(paths)
    }

    /// Rebuild the tree with the root source's eager-load paths replaced.
    pub fn with_eager_paths(&self, paths: Vec<String>) -> Expr {
        fn replace(expr: Expr, paths: Vec<String>) -> Expr {
            match expr {
                Expr::Source { name, .. } => Expr::Source { name, eager: paths },
                Expr::Filter { input, predicate } => Expr::Filter {
                    input: Box::new(replace(*input, paths)),
                    predicate,
                },
                Expr::Project { input, output } => Expr::Project {
                    input: Box::new(replace(*input, paths)),
                    output,
                },
                Expr::Take { input, count } => Expr::Take {
                    input: Box::new(replace(*input, paths)),
                    count,
                },
                Expr::Skip { input, count } => Expr::Skip {
                    input: Box::new(replace(*input, paths)),
                    count,
                },
            }
        }
        replace(self.clone(), paths)
    }
}
