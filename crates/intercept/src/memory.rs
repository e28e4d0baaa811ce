//! In-memory data source.
//!
//! Interprets the expression IR over named relations of [`Value`] rows.
//! Offers both optional capabilities (streaming and eager-load
//! augmentation), which makes it the reference backend for tests and for
//! exercising the interception layer without a real store behind it.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use intercept_api::{from_rows, BinaryOp, Expr, Result, RowStream, ScalarExpr, Value};

use crate::query::{EagerLoadSource, QueryProvider, StreamSource};

/// Named relations of rows, queried by interpreting [`Expr`] trees.
///
/// Eager-load paths name other relations: when present, every object row
/// with an `"id"` field gets the related rows whose `"parent"` field
/// matches that id embedded under the path key.
#[derive(Default)]
pub struct MemorySource {
    relations: HashMap<String, Vec<Value>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register rows under `name`, replacing any prior contents.
    pub fn with_relation(mut self, name: impl Into<String>, rows: Vec<Value>) -> Self {
        self.relations.insert(name.into(), rows);
        self
    }

    /// Convenience for scalar integer relations.
    pub fn with_integers(self, name: impl Into<String>, values: &[i64]) -> Self {
        self.with_relation(name, values.iter().copied().map(Value::Integer).collect())
    }

    fn eval(&self, expr: &Expr) -> anyhow::Result<Vec<Value>> {
        match expr {
            Expr::Source { name, eager } => {
                let rows = self
                    .relations
                    .get(name)
                    .cloned()
                    .ok_or_else(|| anyhow!("unknown source '{name}'"))?;
                if eager.is_empty() {
                    return Ok(rows);
                }
                rows.into_iter()
                    .map(|row| self.attach_eager(row, eager))
                    .collect()
            }
            Expr::Filter { input, predicate } => {
                let mut kept = Vec::new();
                for row in self.eval(input)? {
                    match eval_scalar(predicate, &row)? {
                        Value::Bool(true) => kept.push(row),
                        Value::Bool(false) => {}
                        other => bail!("filter predicate produced {other:?}, expected a boolean"),
                    }
                }
                Ok(kept)
            }
            Expr::Project { input, output } => self
                .eval(input)?
                .iter()
                .map(|row| eval_scalar(output, row))
                .collect(),
            Expr::Take { input, count } => {
                Ok(self.eval(input)?.into_iter().take(*count).collect())
            }
            Expr::Skip { input, count } => {
                Ok(self.eval(input)?.into_iter().skip(*count).collect())
            }
        }
    }

    fn attach_eager(&self, row: Value, paths: &[String]) -> anyhow::Result<Value> {
        let Value::Object(mut fields) = row else {
            bail!("eager load requires object rows");
        };
        let id = fields
            .get("id")
            .cloned()
            .ok_or_else(|| anyhow!("eager load requires rows with an 'id' field"))?;
        for path in paths {
            let related = self
                .relations
                .get(path)
                .ok_or_else(|| anyhow!("unknown eager-load path '{path}'"))?;
            let children: Vec<Value> = related
                .iter()
                .filter(|child| matches!(child, Value::Object(f) if f.get("parent") == Some(&id)))
                .cloned()
                .collect();
            fields.insert(path.clone(), Value::Array(children));
        }
        Ok(Value::Object(fields))
    }
}

#[async_trait]
impl QueryProvider<Value> for MemorySource {
    async fn execute(&self, expr: &Expr) -> Result<Vec<Value>> {
        Ok(self.eval(expr)?)
    }

    fn streaming(&self) -> Option<&dyn StreamSource<Value>> {
        Some(self)
    }

    fn eager_loading(&self) -> Option<&dyn EagerLoadSource> {
        Some(self)
    }
}

#[async_trait]
impl StreamSource<Value> for MemorySource {
    async fn execute_stream(&self, expr: &Expr) -> Result<RowStream<Value>> {
        Ok(from_rows(self.eval(expr)?))
    }
}

impl EagerLoadSource for MemorySource {
    fn add_eager_load_path(&self, expr: &Expr, path: &str) -> Result<Expr> {
        if !self.relations.contains_key(path) {
            return Err(anyhow!("unknown eager-load path '{path}'").into());
        }
        Ok(expr.with_eager_path(path))
    }
}

fn eval_scalar(expr: &ScalarExpr, row: &Value) -> anyhow::Result<Value> {
    match expr {
        ScalarExpr::Item => Ok(row.clone()),
        ScalarExpr::Field(name) => match row {
            Value::Object(fields) => fields
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("row has no field '{name}'")),
            other => bail!("field access '{name}' on non-object row {other:?}"),
        },
        ScalarExpr::Literal(value) => Ok(value.clone()),
        ScalarExpr::Not(inner) => match eval_scalar(inner, row)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => bail!("NOT applied to {other:?}, expected a boolean"),
        },
        ScalarExpr::Binary { op, left, right } => {
            let left = eval_scalar(left, row)?;
            let right = eval_scalar(right, row)?;
            apply_binary(*op, left, right)
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> anyhow::Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => Ok(Value::Bool(compare(&left, &right)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare(&left, &right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(&left, &right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare(&left, &right)? != Ordering::Less)),
        BinaryOp::And => {
            let (a, b) = (as_bool(&left)?, as_bool(&right)?);
            Ok(Value::Bool(a && b))
        }
        BinaryOp::Or => {
            let (a, b) = (as_bool(&left)?, as_bool(&right)?);
            Ok(Value::Bool(a || b))
        }
        BinaryOp::Add => arith(left, right, i64::checked_add, |a, b| a + b),
        BinaryOp::Sub => arith(left, right, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => arith(left, right, i64::checked_mul, |a, b| a * b),
        BinaryOp::Div => divide(left, right),
    }
}

fn as_bool(value: &Value) -> anyhow::Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| anyhow!("expected a boolean, got {value:?}"))
}

fn as_number(value: &Value) -> anyhow::Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| anyhow!("expected a number, got {value:?}"))
}

fn compare(left: &Value, right: &Value) -> anyhow::Result<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    let (a, b) = (as_number(left)?, as_number(right)?);
    a.partial_cmp(&b)
        .ok_or_else(|| anyhow!("values {left:?} and {right:?} do not compare"))
}

fn arith(
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> anyhow::Result<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (&left, &right) {
        return int_op(*a, *b)
            .map(Value::Integer)
            .ok_or_else(|| anyhow!("integer arithmetic overflow"));
    }
    Ok(Value::Float(float_op(as_number(&left)?, as_number(&right)?)))
}

fn divide(left: Value, right: Value) -> anyhow::Result<Value> {
    if let (Value::Integer(a), Value::Integer(b)) = (&left, &right) {
        if *b == 0 {
            bail!("division by zero");
        }
        return Ok(Value::Integer(a / b));
    }
    let divisor = as_number(&right)?;
    if divisor == 0.0 {
        bail!("division by zero");
    }
    Ok(Value::Float(as_number(&left)? / divisor))
}
