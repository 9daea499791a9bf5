//! WHERE/SET expression tree and its evaluator.
//!
//! The dialect's condition grammar is `cond := cmp (AND|OR cmp)*`, with no
//! precedence between AND and OR — evaluation is strictly left-associative,
//! which falls out naturally here since the parser builds a left-leaning
//! `Binary` chain. Leaves (`cmp := prim op prim`) compare two `Expr` values
//! using same-type comparison after coercing to the matching column's
//! declared type.


use common::{DbError, DbResult, Row};
use std::cmp::Ordering;
use types::Value;

/// Comparison and logical operators. Comparison variants appear only as the
/// root of a `cmp`; `And`/`Or` combine `cmp` results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators (logical NOT only).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOp {
    Not,
}

/// Expression tree: either a scalar leaf (`Literal`/`Column`) or a
/// comparison/logical combination of leaves.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Literal(Value),
    /// Column reference with optional table/alias qualifier.
    Column {
        table: Option<String>,
        name: String,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

/// Evaluation context consisting of the row schema (column names in order).
pub struct EvalContext<'a> {
    pub schema: &'a [String],
}

impl<'a> EvalContext<'a> {
    /// Evaluate a condition expression (the root of a WHERE clause) to a bool.
    pub fn eval_predicate(&self, expr: &Expr, row: &Row) -> DbResult<bool> {
        match expr {
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => Ok(!self.eval_predicate(expr, row)?),
            Expr::Binary { left, op, right } if op.is_logical() => {
                let lb = self.eval_predicate(left, row)?;
                match op {
                    BinaryOp::And => Ok(lb && self.eval_predicate(right, row)?),
                    BinaryOp::Or => Ok(lb || self.eval_predicate(right, row)?),
                    _ => unreachable!(),
                }
            }
            Expr::Binary { left, op, right } => {
                let lv = self.eval_value(left, row)?;
                let rv = self.eval_value(right, row)?;
                self.eval_comparison(&lv, *op, &rv)
            }
            other => Err(DbError::Execution(format!(
                "expression is not a predicate: {other:?}"
            ))),
        }
    }

    /// Evaluate a scalar leaf (literal or column reference) against a row.
    pub fn eval_value(&self, expr: &Expr, row: &Row) -> DbResult<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Column { table, name } => {
                let idx = self.find_column(table.as_deref(), name)?;
                Ok(row.values[idx].clone())
            }
            other => Err(DbError::Execution(format!(
                "expression is not a scalar value: {other:?}"
            ))),
        }
    }

    fn eval_comparison(&self, l: &Value, op: BinaryOp, r: &Value) -> DbResult<bool> {
        use BinaryOp::*;

        // A comparison against NULL is never true: the dialect has no
        // three-valued logic, so unmatched types (including NULL on either
        // side) simply fail the predicate rather than erroring.
        let Some(ord) = l.cmp_same_type(r) else {
            return Ok(false);
        };

        Ok(match op {
            Eq => ord == Ordering::Equal,
            Ne => ord != Ordering::Equal,
            Lt => ord == Ordering::Less,
            Le => ord != Ordering::Greater,
            Gt => ord == Ordering::Greater,
            Ge => ord != Ordering::Less,
            And | Or => unreachable!("logical ops handled in eval_predicate"),
        })
    }

    /// Find column index in schema, supporting qualified and unqualified references.
    fn find_column(&self, table: Option<&str>, name: &str) -> DbResult<usize> {
        if let Some(qualifier) = table {
            let full_name = format!("{qualifier}.{name}");
            self.schema
                .iter()
                .position(|c| c == &full_name)
                .ok_or_else(|| DbError::Execution(format!("unknown column '{qualifier}.{name}'")))
        } else {
            self.schema
                .iter()
                .position(|c| c == name || c.ends_with(&format!(".{name}")))
                .ok_or_else(|| DbError::Execution(format!("unknown column '{name}'")))
        }
    }
}
