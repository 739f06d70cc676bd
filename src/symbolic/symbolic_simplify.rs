//! # Symbolic Expression Simplification Module
//!
//! This module brings a freshly differentiated expression into a canonical,
//! redundancy-free form. It does not do algebra: no constant folding, no like-term
//! collection. It only removes what the differentiation rules leave behind.
//!
//! ## Simplification Strategy
//!
//! One bottom-up pass applies these rewrites, and `simplify` repeats the pass
//! until nothing changes:
//!
//! 1. **Duplicate operators**: `a+(-b)` -> `a-b`, `a-(-b)` -> `a+b`, `-(-a)` -> `a`
//! 2. **Head sign**: a sum never starts with a `-` operand; that sign moves into a negation
//! 3. **Redundant brackets**: nested sums are flattened, a one-operand sum is its operand
//! 4. **Multiplicative identity**: `1*u`, `u*1`, `u/1` -> `u`; `(-1)*u`, `u*(-1)` -> `-u`
//! 5. **Additive identity**: zero operands of a sum are dropped, `-0` -> `0`
//!
//! ## Key Features
//!
//! - **Sign correctness**: every rewrite preserves the value of the expression
//! - **Stable text form**: a negated product is written with the minus on its left
//!   factor, `-(a*b)` -> `(-a)*b`, so the printed text parses back into the same tree

use crate::symbolic::symbolic_engine::{Expr, ProductOp, Sign};

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies the expression until a fixpoint is reached, so
    /// `e.simplify().simplify() == e.simplify()`.
    ///
    /// # Examples
    /// ```
    /// use SymbTaylor::symbolic::symbolic_engine::Expr;
    /// let expr = Expr::parse_expression("1*cos(t)+0").unwrap();
    /// assert_eq!(expr.simplify().to_string(), "cos(t)");
    /// ```
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        loop {
            let next = current.simplify_();
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// one bottom-up rewrite pass
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Sum(operands) => collapse_sum(
                operands
                    .iter()
                    .map(|(sign, operand)| (*sign, operand.simplify_()))
                    .collect(),
            ),
            Expr::Product(lhs, rhs, op) => collapse_product(lhs.simplify_(), rhs.simplify_(), *op),
            Expr::Negate(inner) => collapse_negation(inner.simplify_()),
            Expr::Power(base, exponent) => base.simplify_().pow(exponent.simplify_()),
            Expr::Call(func, args) => Expr::Call(*func, args.iter().map(Expr::simplify_).collect()),
            Expr::Const(_) | Expr::Var(_) | Expr::Opaque(_) => self.clone(),
        }
    }
}

/// `-u` in the canonical shape: the minus sits on the leftmost factor of a product
/// spine, `-((a*b)*c)` -> `((-a)*b)*c`, and `-(-a)` -> `a`
fn negated(expr: Expr) -> Expr {
    match expr {
        Expr::Product(lhs, rhs, op) => Expr::Product(negated(*lhs).boxed(), rhs, op),
        Expr::Negate(inner) => *inner,
        other => Expr::Negate(other.boxed()),
    }
}

/// true if the leftmost factor of the product spine is a negation
fn has_leading_minus(expr: &Expr) -> bool {
    match expr {
        Expr::Negate(_) => true,
        Expr::Product(lhs, _, _) => has_leading_minus(lhs),
        _ => false,
    }
}

fn without_leading_minus(expr: Expr) -> Expr {
    match expr {
        Expr::Negate(inner) => *inner,
        Expr::Product(lhs, rhs, op) => Expr::Product(without_leading_minus(*lhs).boxed(), rhs, op),
        other => other,
    }
}

/// splits a leading minus off an operand: `-a` -> `(-, a)`, `((-a)*b)*c` -> `(-, (a*b)*c)`
fn pull_sign(sign: Sign, operand: Expr) -> (Sign, Expr) {
    if has_leading_minus(&operand) {
        (sign.flip(), without_leading_minus(operand))
    } else {
        (sign, operand)
    }
}

fn collapse_sum(operands: Vec<(Sign, Expr)>) -> Expr {
    let mut flat: Vec<(Sign, Expr)> = Vec::with_capacity(operands.len());
    for (sign, operand) in operands {
        match operand {
            Expr::Sum(inner) => {
                for (inner_sign, inner_operand) in inner {
                    let combined = if sign == Sign::Minus { inner_sign.flip() } else { inner_sign };
                    flat.push((combined, inner_operand));
                }
            }
            other => flat.push((sign, other)),
        }
    }

    let mut kept: Vec<(Sign, Expr)> = flat
        .into_iter()
        .filter(|(_, operand)| !operand.is_zero())
        .map(|(sign, operand)| pull_sign(sign, operand))
        .collect();

    if kept.is_empty() {
        return Expr::Const(0.0);
    }
    if kept[0].0 == Sign::Minus {
        let (_, head) = kept.remove(0);
        kept.insert(0, (Sign::Plus, negated(head)));
    }
    if kept.len() == 1 {
        let (_, single) = kept.remove(0);
        return single;
    }
    Expr::Sum(kept)
}

fn collapse_product(lhs: Expr, rhs: Expr, op: ProductOp) -> Expr {
    match op {
        ProductOp::Mul if lhs.is_one() => rhs,
        ProductOp::Mul if lhs.as_literal() == Some(-1.0) => negated(rhs),
        ProductOp::Mul | ProductOp::Div if rhs.is_one() => lhs,
        ProductOp::Mul if rhs.as_literal() == Some(-1.0) => negated(lhs),
        _ => Expr::Product(lhs.boxed(), rhs.boxed(), op),
    }
}

fn collapse_negation(inner: Expr) -> Expr {
    if inner.is_zero() {
        return Expr::Const(0.0);
    }
    negated(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simplified(text: &str) -> String {
        Expr::parse_expression(text).unwrap().simplify().to_string()
    }

    #[test]
    fn test_multiplicative_identity() {
        assert_eq!(simplified("1*cos(t)"), "cos(t)");
        assert_eq!(simplified("cos(t)*1"), "cos(t)");
        assert_eq!(simplified("x/1"), "x");
        assert_eq!(simplified("1/x"), "1/x");
        assert_eq!(simplified("-1*sin(t)"), "-sin(t)");
        assert_eq!(simplified("sin(t)*(-1)"), "-sin(t)");
    }

    #[test]
    fn test_additive_identity() {
        assert_eq!(simplified("0+t"), "t");
        assert_eq!(simplified("t+0-0"), "t");
        assert_eq!(simplified("0-t"), "-t");
        assert_eq!(simplified("0+0"), "0");
        assert_eq!(simplified("-0"), "0");
    }

    #[test]
    fn test_duplicate_operators() {
        assert_eq!(simplified("t+(-x)"), "t-x");
        assert_eq!(simplified("t-(-x)"), "t+x");
        assert_eq!(simplified("-(-t)"), "t");
        assert_eq!(simplified("t-(-2)*x"), "t+2*x");
    }

    #[test]
    fn test_nested_sums_are_flattened() {
        assert_eq!(simplified("t-(x-1)"), "t-x+1");
        assert_eq!(simplified("(t+x)+(1-t)"), "t+x+1-t");
        assert_eq!(simplified("((t))"), "t");
    }

    #[test]
    fn test_head_sign_is_kept() {
        assert_eq!(simplified("-x+t"), "-x+t");
        assert_eq!(simplified("0-x*t+1"), "-x*t+1");
    }

    #[test]
    fn test_negated_product_moves_minus_left() {
        let expr = -(Expr::x(1) * Expr::t().sin());
        let simple = expr.simplify();
        assert_eq!(simple, (-Expr::x(1)) * Expr::t().sin());
        assert_eq!(simple.to_string(), "-x'*sin(t)");
    }

    #[test]
    fn test_deep_left_nested_negation_settles() {
        // -((...((t)*t)...)*t) with 70 factors
        let nested = (0..70).fold("t".to_string(), |acc, _| format!("({})*t", acc));
        let expr = Expr::parse_expression(&format!("-({})", nested)).unwrap();
        let once = expr.simplify();
        assert_eq!(once.simplify(), once);
        assert_eq!(once.simplify_(), once);
        let mut leftmost = &once;
        while let Expr::Product(lhs, _, _) = leftmost {
            leftmost = lhs.as_ref();
        }
        assert_eq!(leftmost, &-Expr::t());
        assert_eq!(expr.eval_expression(0.0, 1.5).unwrap(), once.eval_expression(0.0, 1.5).unwrap());
    }

    #[test]
    fn test_sum_pulls_deep_minus_into_its_sign() {
        assert_eq!(simplified("x+(-t*x)*t"), "x-(t*x)*t");
        assert_eq!(simplified("x-((-t)*x)*t"), "x+(t*x)*t");
    }

    #[test]
    fn test_products_are_not_folded() {
        assert_eq!(simplified("2*3"), "2*3");
        assert_eq!(simplified("0*t"), "0*t");
    }

    #[test]
    fn test_idempotence() {
        for text in [
            "1*x'+2*(1*x'*x)",
            "(1*pow(t,2)-t*(2*(1*t)))/pow(t,2)^2",
            "-(1*sin(t))",
            "0-(x-(-t))",
            "-(-(-x))*1",
        ] {
            let once = Expr::parse_expression(text).unwrap().simplify();
            assert_eq!(once.simplify(), once, "{}", text);
        }
    }

    #[test]
    fn test_display_parse_round_trip() {
        for text in [
            "x'+2*x'*x",
            "t-x+1",
            "-x'*sin(t)",
            "(pow(t,2)-t*2*t)/pow(t,2)^2",
            "(t/x)*3",
            "x*(-t)+exp(t)",
            "-(t+x)*2",
        ] {
            let simple = Expr::parse_expression(text).unwrap().simplify();
            let reparsed = Expr::parse_expression(&simple.to_string()).unwrap();
            assert_eq!(reparsed, simple, "{}", text);
        }
    }
}
