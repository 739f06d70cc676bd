//! # Symbolic Engine Derivatives Module
//!
//! This module extends the symbolic engine with differentiation with respect to `t`
//! along the solution of `x' = f(t, x)`, and with the derivative table consumed by
//! the Taylor-series integrator.
//!
//! ## Purpose
//!
//! This module enables:
//! - **Analytical Differentiation**: total derivative `d/dt` by the sum, product,
//!   quotient and chain rules
//! - **Derivative Tables**: `x', x'', ..., x^(N)` as expressions of `t` and `x`
//!
//! ## Key Methods
//!
//! - `differentiate(symbols)` - one derivative, the state ladder given by `symbols`
//! - `derivative_text(text, symbols)` - parse, differentiate and simplify in one call
//! - `DerivativeTable::new(f, N)` - the whole table for `x' = f`
//!
//! ## Interesting Code Features
//!
//! 1. **State ladder**: `x` is not a free variable: the derivative of `x^(i)` is the
//!    symbol `x^(i+1)`, looked up in the symbol list. The evaluator later resolves
//!    `x^(k)` through the table, so the chain rule along the solution is implicit.
//!
//! 2. **Zero collapse**: the product and quotient rules check structural zeros of the
//!    operand derivatives before building the result, so `5*t` gives `5*1`, not `0*t+5*1`.
//!
//! 3. **Fixed output shapes**: `tan(u)` gives `u'*(1/tan(u))^2` and the quotient rule
//!    keeps its `v^2` denominator; downstream numbers depend on these exact shapes.

use crate::symbolic::symbolic_engine::{Expr, Func, ProductOp, Variable};
use crate::symbolic::symbolic_errors::SymbolicError;
use log::{debug, info};

impl Expr {
    /// DIFFERENTIATION

    /// Computes the total derivative `d/dt` of the expression.
    ///
    /// `symbols` is the state ladder `x, x', ..., x^(N)`: the derivative of `x^(i)` is
    /// `symbols[i+1]`, and `i >= N` is out of the table.
    ///
    /// Rules:
    /// - Sum: operand by operand, signs kept
    /// - Product: `u'*v+u*v'`, a zero derivative drops its branch
    /// - Quotient: `(u'*v-u*v')/v^2`, with `-u*v'/v^2` and `u'*v/v^2` when one derivative is zero
    /// - `pow(u,k)` and `u^k` with a literal `k`: `2*u'*u` for `k = 2`, else `k*u'*pow(u,k-1)`
    /// - `exp(u)` -> `u'*exp(u)`, `sin(u)` -> `u'*cos(u)`, `cos(u)` -> `-(u'*sin(u))`,
    ///   `tan(u)` -> `u'*(1/tan(u))^2`
    ///
    /// # Errors
    /// `UnrecognizedTerm` for an opaque leaf or a non-literal exponent,
    /// `DerivativeTableBounds` for a state derivative beyond the ladder.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::t().pow_call(Expr::Const(2.0));
    /// let df = f.differentiate(&[Expr::x(0), Expr::x(1)]).unwrap().simplify(); // 2*t
    /// ```
    pub fn differentiate(&self, symbols: &[Expr]) -> Result<Expr, SymbolicError> {
        match self {
            Expr::Sum(operands) => {
                let mut derivatives = Vec::with_capacity(operands.len());
                for (sign, operand) in operands {
                    derivatives.push((*sign, operand.differentiate(symbols)?));
                }
                Ok(Expr::Sum(derivatives))
            }
            Expr::Product(u, v, ProductOp::Mul) => {
                let (u, v) = (u.as_ref(), v.as_ref());
                let du = u.differentiate(symbols)?;
                let dv = v.differentiate(symbols)?;
                Ok(match (du.is_zero(), dv.is_zero()) {
                    (true, true) => Expr::Const(0.0),
                    (true, false) => u.clone() * dv,
                    (false, true) => du * v.clone(),
                    (false, false) => du * v.clone() + u.clone() * dv,
                })
            }
            Expr::Product(u, v, ProductOp::Div) => {
                let (u, v) = (u.as_ref(), v.as_ref());
                let du = u.differentiate(symbols)?;
                let dv = v.differentiate(symbols)?;
                let v_squared = v.clone().pow(Expr::Const(2.0));
                Ok(match (du.is_zero(), dv.is_zero()) {
                    (true, true) => Expr::Const(0.0),
                    (true, false) => -u.clone() * (dv / v_squared),
                    (false, true) => du * (v.clone() / v_squared),
                    (false, false) => (du * v.clone() - u.clone() * dv) / v_squared,
                })
            }
            Expr::Negate(inner) => Ok(-inner.differentiate(symbols)?),
            Expr::Const(_) => Ok(Expr::Const(0.0)),
            Expr::Var(Variable::Time) => Ok(Expr::Const(1.0)),
            Expr::Var(Variable::State(order)) => symbols.get(order + 1).cloned().ok_or_else(|| {
                SymbolicError::DerivativeTableBounds {
                    symbol: self.to_string(),
                    order: order + 1,
                    max_order: symbols.len().saturating_sub(1),
                }
            }),
            Expr::Power(base, exponent) => {
                let k = exponent
                    .as_literal()
                    .ok_or_else(|| SymbolicError::UnrecognizedTerm(self.to_string()))?;
                let du = base.differentiate(symbols)?;
                Ok(power_rule(base.as_ref().clone(), du, k, Expr::pow))
            }
            Expr::Call(func, args) => self.differentiate_call(*func, args, symbols),
            Expr::Opaque(text) => Err(SymbolicError::UnrecognizedTerm(text.clone())),
        }
    } // end of differentiate

    fn differentiate_call(
        &self,
        func: Func,
        args: &[Expr],
        symbols: &[Expr],
    ) -> Result<Expr, SymbolicError> {
        let malformed = || SymbolicError::UnrecognizedTerm(self.to_string());
        let u = args.first().ok_or_else(malformed)?;
        match func {
            Func::pow => {
                let k = args
                    .get(1)
                    .and_then(Expr::as_literal)
                    .ok_or_else(malformed)?;
                let du = u.differentiate(symbols)?;
                Ok(power_rule(u.clone(), du, k, Expr::pow_call))
            }
            Func::exp => Ok(u.differentiate(symbols)? * u.clone().exp()),
            Func::sin => Ok(u.differentiate(symbols)? * u.clone().cos()),
            Func::cos => Ok(-(u.differentiate(symbols)? * u.clone().sin())),
            Func::tan => {
                let cotangent = Expr::Const(1.0) / u.clone().tan();
                Ok(u.differentiate(symbols)? * cotangent.pow(Expr::Const(2.0)))
            }
        }
    }

    /// Parses `text`, differentiates it and simplifies the result.
    pub fn derivative_text(text: &str, symbols: &[Expr]) -> Result<String, SymbolicError> {
        let expr = Expr::parse_expression(text)?;
        Ok(expr.differentiate(symbols)?.simplify().to_string())
    }
}

/// `2*u'*u` for `k = 2`, else `k*u'*power(u, k-1)`
fn power_rule(u: Expr, du: Expr, k: f64, power: impl Fn(Expr, Expr) -> Expr) -> Expr {
    if k == 2.0 {
        Expr::Const(2.0) * (du * u)
    } else {
        Expr::number(k) * (du * power(u, Expr::number(k - 1.0)))
    }
}

/// Symbols `x, x', ..., x^(N)` and the expressions of `x', ..., x^(N)` for `x' = f(t, x)`.
///
/// `derivatives[0]` is `f` itself, `derivatives[k]` is the simplified derivative of
/// `derivatives[k-1]`. Built once, read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivativeTable {
    symbols: Vec<Expr>,
    derivatives: Vec<Expr>,
}

impl DerivativeTable {
    /// Builds the table of order `order` for `x' = function`.
    ///
    /// # Errors
    /// Any differentiation error aborts the construction. A table of order 0 cannot hold
    /// `x'` and is reported as `DerivativeTableBounds` of order 1 with `max_order: 0`.
    pub fn new(function: Expr, order: usize) -> Result<Self, SymbolicError> {
        if order == 0 {
            return Err(SymbolicError::DerivativeTableBounds {
                symbol: Expr::x(1).to_string(),
                order: 1,
                max_order: 0,
            });
        }
        info!("building derivative table of order {} for x' = {}", order, function);
        let symbols: Vec<Expr> = (0..=order).map(Expr::x).collect();
        let mut derivatives = Vec::with_capacity(order);
        debug!("{} = {}", symbols[1], function);
        derivatives.push(function);
        for k in 1..order {
            let next = derivatives[k - 1].differentiate(&symbols)?.simplify();
            debug!("{} = {}", symbols[k + 1], next);
            derivatives.push(next);
        }
        info!("derivative table of order {} is ready", order);
        Ok(DerivativeTable {
            symbols,
            derivatives,
        })
    }

    /// Parses `text` and builds the table.
    pub fn from_text(text: &str, order: usize) -> Result<Self, SymbolicError> {
        DerivativeTable::new(Expr::parse_expression(text)?, order)
    }

    /// highest derivative order `N` held by the table
    pub fn order(&self) -> usize {
        self.derivatives.len()
    }

    /// `x, x', ..., x^(N)`
    pub fn symbols(&self) -> &[Expr] {
        &self.symbols
    }

    /// expressions of `x', ..., x^(N)`
    pub fn derivatives(&self) -> &[Expr] {
        &self.derivatives
    }

    /// the expression of `x^(k)`, `k` in `1..=N`
    pub fn derivative(&self, k: usize) -> Result<&Expr, SymbolicError> {
        k.checked_sub(1)
            .and_then(|index| self.derivatives.get(index))
            .ok_or_else(|| SymbolicError::DerivativeTableBounds {
                symbol: Expr::x(k).to_string(),
                order: k,
                max_order: self.order(),
            })
    }

    /// the right-hand side `f`
    pub fn function(&self) -> &Expr {
        &self.derivatives[0]
    }

    pub fn rendered(&self) -> Vec<String> {
        self.derivatives.iter().map(|expr| expr.to_string()).collect()
    }
}

impl std::fmt::Display for DerivativeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (symbol, expr) in self.symbols[1..].iter().zip(self.derivatives.iter()) {
            writeln!(f, "{} = {}", symbol, expr)?;
        }
        Ok(())
    }
}
