//! Numerical evaluation of expressions at a point `(t, x)`.
//!
//! The evaluator walks the same tree the differentiation engine builds: sums fold
//! left to right, products apply `*` or `/` to their two operands (so `a/b*c` is
//! `a/(b*c)` here too) and `x^(k)` with `k >= 1` is resolved by evaluating the
//! k-th table entry at the same point. Division by zero is not trapped; the
//! non-finite value travels up to the caller.
//!
//! Within one call the point is fixed, so every table entry is evaluated at most
//! once and cached until the call returns.
use crate::symbolic::symbolic_engine::{Expr, Func, ProductOp, Sign, Variable};
use crate::symbolic::symbolic_engine_derivatives::DerivativeTable;
use crate::symbolic::symbolic_errors::SymbolicError;

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// recursion limit of one evaluation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalBudget {
    pub max_depth: usize,
}

impl Default for EvalBudget {
    fn default() -> Self {
        EvalBudget {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

struct Evaluator<'a> {
    derivatives: &'a [Expr],
    x: f64,
    t: f64,
    budget: EvalBudget,
    cache: Vec<Option<f64>>,
}

impl<'a> Evaluator<'a> {
    fn new(derivatives: &'a [Expr], x: f64, t: f64, budget: EvalBudget) -> Self {
        Evaluator {
            derivatives,
            x,
            t,
            budget,
            cache: vec![None; derivatives.len()],
        }
    }

    fn eval(&mut self, expr: &Expr, depth: usize) -> Result<f64, SymbolicError> {
        if depth > self.budget.max_depth {
            return Err(SymbolicError::EvaluationBudgetExceeded {
                limit: self.budget.max_depth,
            });
        }
        match expr {
            Expr::Sum(operands) => {
                let mut acc = 0.0;
                for (sign, operand) in operands {
                    let value = self.eval(operand, depth + 1)?;
                    match sign {
                        Sign::Plus => acc += value,
                        Sign::Minus => acc -= value,
                    }
                }
                Ok(acc)
            }
            Expr::Product(lhs, rhs, op) => {
                let left = self.eval(lhs, depth + 1)?;
                let right = self.eval(rhs, depth + 1)?;
                Ok(match op {
                    ProductOp::Mul => left * right,
                    ProductOp::Div => left / right,
                })
            }
            Expr::Power(base, exponent) => {
                let base = self.eval(base, depth + 1)?;
                Ok(base.powf(self.eval(exponent, depth + 1)?))
            }
            Expr::Negate(inner) => Ok(-self.eval(inner, depth + 1)?),
            Expr::Const(val) => Ok(*val),
            Expr::Var(Variable::Time) => Ok(self.t),
            Expr::Var(Variable::State(0)) => Ok(self.x),
            Expr::Var(Variable::State(order)) => self.table_entry(*order, depth),
            Expr::Call(func, args) => {
                let arg = |i: usize| {
                    args.get(i)
                        .ok_or_else(|| SymbolicError::UnrecognizedTerm(expr.to_string()))
                };
                let u = self.eval(arg(0)?, depth + 1)?;
                Ok(match func {
                    Func::exp => u.exp(),
                    Func::pow => u.powf(self.eval(arg(1)?, depth + 1)?),
                    Func::sin => u.sin(),
                    Func::cos => u.cos(),
                    Func::tan => u.tan(),
                })
            }
            Expr::Opaque(text) => Err(SymbolicError::UnrecognizedTerm(text.clone())),
        }
    }

    /// value of `x^(order)`, i.e. of `derivatives[order-1]` at the fixed point
    fn table_entry(&mut self, order: usize, depth: usize) -> Result<f64, SymbolicError> {
        let derivatives = self.derivatives;
        let Some((index, entry)) = order
            .checked_sub(1)
            .and_then(|index| derivatives.get(index).map(|entry| (index, entry)))
        else {
            return Err(SymbolicError::DerivativeTableBounds {
                symbol: Expr::x(order).to_string(),
                order,
                max_order: derivatives.len(),
            });
        };
        if let Some(value) = self.cache[index] {
            return Ok(value);
        }
        let value = self.eval(entry, depth + 1)?;
        self.cache[index] = Some(value);
        Ok(value)
    }
}

impl Expr {
    /// Evaluates the expression at `(t, x)`, resolving `x^(k)` through `table`.
    pub fn evaluate(&self, table: &DerivativeTable, x: f64, t: f64) -> Result<f64, SymbolicError> {
        self.evaluate_with_budget(table, x, t, EvalBudget::default())
    }

    pub fn evaluate_with_budget(
        &self,
        table: &DerivativeTable,
        x: f64,
        t: f64,
        budget: EvalBudget,
    ) -> Result<f64, SymbolicError> {
        Evaluator::new(table.derivatives(), x, t, budget).eval(self, 0)
    }

    /// Evaluates an expression of `t` and `x` only; any `x'` and higher is out of bounds.
    pub fn eval_expression(&self, x: f64, t: f64) -> Result<f64, SymbolicError> {
        Evaluator::new(&[], x, t, EvalBudget::default()).eval(self, 0)
    }
}

impl DerivativeTable {
    /// value of `x^(k)` at `(t, x)`, `k` in `1..=N`
    pub fn evaluate(&self, k: usize, x: f64, t: f64) -> Result<f64, SymbolicError> {
        Evaluator::new(self.derivatives(), x, t, EvalBudget::default()).table_entry(k, 0)
    }

    /// Values of `x', x'', ..., x^(N)` at `(t, x)`, sharing one cache.
    pub fn evaluate_all(&self, x: f64, t: f64) -> Result<Vec<f64>, SymbolicError> {
        self.evaluate_all_with_budget(x, t, EvalBudget::default())
    }

    pub fn evaluate_all_with_budget(
        &self,
        x: f64,
        t: f64,
        budget: EvalBudget,
    ) -> Result<Vec<f64>, SymbolicError> {
        let mut evaluator = Evaluator::new(self.derivatives(), x, t, budget);
        (1..=self.order())
            .map(|k| evaluator.table_entry(k, 0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eval_basic() {
        let expr = Expr::parse_expression("x+pow(x,2)").unwrap();
        assert_relative_eq!(expr.eval_expression(2.0, 0.0).unwrap(), 6.0);
        let expr = Expr::parse_expression("exp(t)*x").unwrap();
        assert_relative_eq!(expr.eval_expression(3.0, 1.0).unwrap(), 3.0 * 1f64.exp());
        let expr = Expr::parse_expression("sin(t)^2+cos(t)^2").unwrap();
        assert_relative_eq!(expr.eval_expression(0.0, 0.7).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sum_folds_left_to_right() {
        let expr = Expr::parse_expression("10-4-3+1").unwrap();
        assert_relative_eq!(expr.eval_expression(0.0, 0.0).unwrap(), 4.0);
        let expr = Expr::parse_expression("-t+1").unwrap();
        assert_relative_eq!(expr.eval_expression(0.0, 3.0).unwrap(), -2.0);
    }

    #[test]
    fn test_products_nest_to_the_right() {
        // 8/2*4 is 8/(2*4)
        let expr = Expr::parse_expression("8/2*4").unwrap();
        assert_relative_eq!(expr.eval_expression(0.0, 0.0).unwrap(), 1.0);
        let expr = Expr::parse_expression("(8/2)*4").unwrap();
        assert_relative_eq!(expr.eval_expression(0.0, 0.0).unwrap(), 16.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = Expr::parse_expression("2^3^2").unwrap();
        assert_relative_eq!(expr.eval_expression(0.0, 0.0).unwrap(), 512.0);
    }

    #[test]
    fn test_division_by_zero_is_not_trapped() {
        let expr = Expr::parse_expression("1/t").unwrap();
        let value = expr.eval_expression(0.0, 0.0).unwrap();
        assert!(value.is_infinite());
        let expr = Expr::parse_expression("pow(t,0.5)").unwrap();
        assert!(expr.eval_expression(0.0, -1.0).unwrap().is_nan());
    }

    #[test]
    fn test_state_derivatives_resolve_through_table() {
        // x' = t*x, x'' = x+t*x'
        let table = DerivativeTable::from_text("t*x", 2).unwrap();
        assert_eq!(table.rendered(), vec!["t*x", "x+t*x'"]);
        let (x, t) = (2.0, 3.0);
        assert_relative_eq!(table.evaluate(1, x, t).unwrap(), 6.0);
        assert_relative_eq!(table.evaluate(2, x, t).unwrap(), 2.0 + 3.0 * 6.0);
        let values = table.evaluate_all(x, t).unwrap();
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[1], 20.0);
        let expr = Expr::parse_expression("x''-x'").unwrap();
        assert_relative_eq!(expr.evaluate(&table, x, t).unwrap(), 14.0);
    }

    #[test]
    fn test_out_of_table() {
        let table = DerivativeTable::from_text("x", 2).unwrap();
        let expr = Expr::x(3);
        assert_eq!(
            expr.evaluate(&table, 1.0, 0.0),
            Err(SymbolicError::DerivativeTableBounds {
                symbol: "x'''".to_string(),
                order: 3,
                max_order: 2
            })
        );
        assert!(table.evaluate(0, 1.0, 0.0).is_err());
        assert!(Expr::x(1).eval_expression(1.0, 0.0).is_err());
    }

    #[test]
    fn test_unrecognized_term() {
        let expr = Expr::parse_expression("t+log(t)").unwrap();
        assert_eq!(
            expr.eval_expression(0.0, 1.0),
            Err(SymbolicError::UnrecognizedTerm("log(t)".to_string()))
        );
    }

    #[test]
    fn test_budget_exceeded() {
        // x' = x' refers to itself
        let table = DerivativeTable::new(Expr::x(1), 2).unwrap();
        let result = table.evaluate(1, 1.0, 0.0);
        assert_eq!(
            result,
            Err(SymbolicError::EvaluationBudgetExceeded {
                limit: DEFAULT_MAX_DEPTH
            })
        );
        let deep = (0..20).fold(Expr::t(), |acc, _| acc.sin());
        let small = EvalBudget { max_depth: 5 };
        let table = DerivativeTable::new(Expr::t(), 1).unwrap();
        assert!(deep.evaluate_with_budget(&table, 0.0, 1.0, small).is_err());
        assert!(deep.evaluate(&table, 0.0, 1.0).is_ok());
    }
}
