//! # Symbolic Engine Module
//!
//! This module defines the expression tree used by every other part of the crate:
//! the parser builds it, the differentiation engine and the simplifier rewrite it,
//! the evaluator walks it and the Taylor solver consumes tables of it.
//!
//! ## Purpose
//!
//! The symbolic engine allows users to:
//! - Represent functions `x'(t, x)` built from `+ - * / ^`, `exp`, `pow`, `sin`, `cos`, `tan`
//! - Refer to the state variable `x` and its derivatives `x'`, `x''`, ... and to the argument `t`
//! - Print expressions back as text that parses into the same tree
//!
//! ## Main Structures
//!
//! ### `Expr` Enum
//! - **Sum**: `Sum(Vec<(Sign, Expr)>)` - ordered signed operands
//! - **Product**: `Product(left, right, ProductOp)` - exactly two operands, `*` or `/`
//! - **Call**: `Call(Func, args)` - `exp`, `pow`, `sin`, `cos`, `tan`
//! - **Power**: `Power(base, exponent)` - the `^` operator
//! - **Negate**, **Const**, **Var**
//! - **Opaque**: a leaf the parser could not recognize; it is carried along and
//!   reported as soon as someone tries to differentiate or evaluate it
//!
//! ## Interesting Code Features
//!
//! 1. **Right-nested products**: the term splitter cuts at the first top-level `*` or `/`,
//!    so `a/b*c` means `a/(b*c)`. `Display` parenthesizes a left-nested product to keep
//!    the text faithful to the tree.
//!
//! 2. **Operator Overloading**: `std::ops` traits build trees with natural syntax,
//!    `du * v.clone() + u * dv`
//!
//! 3. **Minimal parentheses**: `Display` adds brackets only where the splitter would
//!    otherwise cut the text in a different place

#![allow(non_camel_case_types)]

use itertools::Itertools;
use std::fmt;

/// sign of an operand in a sum
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn from_char(c: char) -> Option<Sign> {
        match c {
            '+' => Some(Sign::Plus),
            '-' => Some(Sign::Minus),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }

    pub fn flip(self) -> Sign {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

/// operator of a two-operand product
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductOp {
    Mul,
    Div,
}

impl ProductOp {
    pub fn from_char(c: char) -> Option<ProductOp> {
        match c {
            '*' => Some(ProductOp::Mul),
            '/' => Some(ProductOp::Div),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ProductOp::Mul => '*',
            ProductOp::Div => '/',
        }
    }
}

/// functions known to the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Func {
    exp,
    pow,
    sin,
    cos,
    tan,
}

impl Func {
    pub const ALL: [Func; 5] = [Func::exp, Func::pow, Func::sin, Func::cos, Func::tan];

    pub fn name(&self) -> &'static str {
        match self {
            Func::exp => "exp",
            Func::pow => "pow",
            Func::sin => "sin",
            Func::cos => "cos",
            Func::tan => "tan",
        }
    }

    /// number of arguments the function takes
    pub fn arity(&self) -> usize {
        match self {
            Func::pow => 2,
            _ => 1,
        }
    }
}

/// `t` or the k-th derivative of the state variable `x`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variable {
    Time,
    /// `State(0)` is `x`, `State(2)` is `x''`
    State(usize),
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Variable::Time => write!(f, "t"),
            Variable::State(order) => write!(f, "x{}", "'".repeat(*order)),
        }
    }
}

/// Core symbolic expression enum.
///
/// # Examples
/// ```rust, ignore
/// use SymbTaylor::symbolic::symbolic_engine::Expr;
/// let f = Expr::x(0) + Expr::x(0).pow(Expr::Const(2.0)); // x+x^2
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// ordered signed operands: `a-b+c` is `[(+,a), (-,b), (+,c)]`
    Sum(Vec<(Sign, Expr)>),
    /// `left * right` or `left / right`
    Product(Box<Expr>, Box<Expr>, ProductOp),
    /// function call: `pow` has two arguments, the others one
    Call(Func, Vec<Expr>),
    /// `base ^ exponent`
    Power(Box<Expr>, Box<Expr>),
    /// unary minus
    Negate(Box<Expr>),
    /// non-negative numerical literal (negative values are carried as `Negate(Const)`)
    Const(f64),
    Var(Variable),
    /// text that matched no production
    Opaque(String),
}

impl Expr {
    /// BASIC FEATURES

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn t() -> Expr {
        Expr::Var(Variable::Time)
    }

    /// the `order`-th derivative of the state variable: `x(0)` is `x`, `x(1)` is `x'`
    pub fn x(order: usize) -> Expr {
        Expr::Var(Variable::State(order))
    }

    /// numerical literal; negative values become `Negate(Const(|v|))`
    pub fn number(value: f64) -> Expr {
        if value < 0.0 {
            Expr::Negate(Expr::Const(-value).boxed())
        } else {
            Expr::Const(value)
        }
    }

    pub fn call(func: Func, arg: Expr) -> Expr {
        Expr::Call(func, vec![arg])
    }

    /// `pow(self, exponent)` in call form
    pub fn pow_call(self, exponent: Expr) -> Expr {
        Expr::Call(Func::pow, vec![self, exponent])
    }

    /// `self ^ exponent` in operator form
    pub fn pow(self, exponent: Expr) -> Expr {
        Expr::Power(self.boxed(), exponent.boxed())
    }

    pub fn exp(self) -> Expr {
        Expr::call(Func::exp, self)
    }

    pub fn sin(self) -> Expr {
        Expr::call(Func::sin, self)
    }

    pub fn cos(self) -> Expr {
        Expr::call(Func::cos, self)
    }

    pub fn tan(self) -> Expr {
        Expr::call(Func::tan, self)
    }

    /// Structural zero: `0`, `-0`, or a sum made only of zeros.
    ///
    /// The differentiation engine uses it to drop dead branches of the product and
    /// quotient rules before they are ever built.
    pub fn is_zero(&self) -> bool {
        match self {
            Expr::Const(val) => *val == 0.0,
            Expr::Negate(inner) => inner.is_zero(),
            Expr::Sum(operands) => operands.iter().all(|(_, operand)| operand.is_zero()),
            _ => false,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// `Some(-1.0)` for `-1`, `Some(2.5)` for `2.5`, `None` for anything that is not a literal
    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Expr::Const(val) => Some(*val),
            Expr::Negate(inner) => inner.as_literal().map(|val| -val),
            _ => None,
        }
    }

    /// atoms print without brackets in every context
    pub fn is_atomic(&self) -> bool {
        match self {
            Expr::Const(val) => *val >= 0.0,
            Expr::Var(_) | Expr::Call(..) | Expr::Opaque(_) => true,
            _ => false,
        }
    }

    /// highest derivative order of `x` referenced in the expression, `None` if `x` is absent
    pub fn max_state_order(&self) -> Option<usize> {
        match self {
            Expr::Var(Variable::State(order)) => Some(*order),
            Expr::Var(Variable::Time) | Expr::Const(_) | Expr::Opaque(_) => None,
            Expr::Sum(operands) => operands
                .iter()
                .filter_map(|(_, operand)| operand.max_state_order())
                .max(),
            Expr::Product(lhs, rhs, _) | Expr::Power(lhs, rhs) => {
                lhs.max_state_order().max(rhs.max_state_order())
            }
            Expr::Call(_, args) => args.iter().filter_map(|arg| arg.max_state_order()).max(),
            Expr::Negate(inner) => inner.max_state_order(),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Sum(vec![(Sign::Plus, self), (Sign::Plus, rhs)])
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sum(vec![(Sign::Plus, self), (Sign::Minus, rhs)])
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Product(self.boxed(), rhs.boxed(), ProductOp::Mul)
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Product(self.boxed(), rhs.boxed(), ProductOp::Div)
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Negate(self.boxed())
    }
}

fn bracketed(text: String, needed: bool) -> String {
    if needed { format!("({})", text) } else { text }
}

/// Display implementation producing text in the grammar the parser reads.
///
/// An operand is put in brackets when the splitter would otherwise cut the text
/// at a different place: sums inside products, a left-nested product, anything
/// starting with `-` that is not at the head of its term, non-atomic power parts.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Var(var) => write!(f, "{}", var),
            Expr::Opaque(text) => write!(f, "{}", text),
            Expr::Call(func, args) => {
                write!(f, "{}({})", func.name(), args.iter().join(","))
            }
            Expr::Negate(inner) => {
                let text = inner.to_string();
                let needed = matches!(**inner, Expr::Sum(_)) || text.starts_with('-');
                write!(f, "-{}", bracketed(text, needed))
            }
            Expr::Product(lhs, rhs, op) => {
                let left = lhs.to_string();
                let left_needed = matches!(**lhs, Expr::Sum(_) | Expr::Product(..));
                let right = rhs.to_string();
                let right_needed = matches!(**rhs, Expr::Sum(_)) || right.starts_with('-');
                write!(
                    f,
                    "{}{}{}",
                    bracketed(left, left_needed),
                    op.as_char(),
                    bracketed(right, right_needed)
                )
            }
            Expr::Power(base, exponent) => write!(
                f,
                "{}^{}",
                bracketed(base.to_string(), !base.is_atomic()),
                bracketed(exponent.to_string(), !exponent.is_atomic())
            ),
            Expr::Sum(operands) => {
                for (i, (sign, operand)) in operands.iter().enumerate() {
                    let text = operand.to_string();
                    let nested_sum = matches!(operand, Expr::Sum(_));
                    if i == 0 && *sign == Sign::Plus {
                        write!(f, "{}", bracketed(text, nested_sum))?;
                    } else {
                        let needed = nested_sum || text.starts_with('-');
                        write!(f, "{}{}", sign.as_char(), bracketed(text, needed))?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_atoms() {
        assert_eq!(Expr::t().to_string(), "t");
        assert_eq!(Expr::x(0).to_string(), "x");
        assert_eq!(Expr::x(3).to_string(), "x'''");
        assert_eq!(Expr::Const(2.0).to_string(), "2");
        assert_eq!(Expr::Const(0.5).to_string(), "0.5");
        assert_eq!(Expr::number(-3.0).to_string(), "-3");
    }

    #[test]
    fn test_display_calls() {
        let expr = Expr::t().pow_call(Expr::Const(2.0));
        assert_eq!(expr.to_string(), "pow(t,2)");
        assert_eq!(Expr::x(1).sin().exp().to_string(), "exp(sin(x'))");
    }

    #[test]
    fn test_display_sum_and_products() {
        let expr = Expr::x(0) + Expr::x(0).pow_call(Expr::Const(2.0));
        assert_eq!(expr.to_string(), "x+pow(x,2)");
        let expr = (Expr::t() + Expr::Const(1.0)) * Expr::x(0);
        assert_eq!(expr.to_string(), "(t+1)*x");
        let expr = Expr::x(0) * (Expr::t() - Expr::Const(1.0));
        assert_eq!(expr.to_string(), "x*(t-1)");
    }

    #[test]
    fn test_display_left_nested_product() {
        // a/b*c would split as a/(b*c)
        let expr = (Expr::t() / Expr::x(0)) * Expr::Const(3.0);
        assert_eq!(expr.to_string(), "(t/x)*3");
        let expr = Expr::t() / (Expr::x(0) * Expr::Const(3.0));
        assert_eq!(expr.to_string(), "t/x*3");
    }

    #[test]
    fn test_display_negations() {
        assert_eq!((-Expr::t().sin()).to_string(), "-sin(t)");
        assert_eq!((Expr::t() * -Expr::x(0)).to_string(), "t*(-x)");
        assert_eq!((Expr::t() + -Expr::x(0)).to_string(), "t+(-x)");
        assert_eq!((-(Expr::t() + Expr::x(0))).to_string(), "-(t+x)");
        assert_eq!((-(-Expr::t())).to_string(), "-(-t)");
    }

    #[test]
    fn test_display_power() {
        let tan_form = (Expr::Const(1.0) / Expr::t().tan()).pow(Expr::Const(2.0));
        assert_eq!(tan_form.to_string(), "(1/tan(t))^2");
        let square = Expr::t().pow_call(Expr::Const(2.0)).pow(Expr::Const(2.0));
        assert_eq!(square.to_string(), "pow(t,2)^2");
    }

    #[test]
    fn test_is_zero() {
        assert!(Expr::Const(0.0).is_zero());
        assert!((-Expr::Const(0.0)).is_zero());
        assert!((Expr::Const(0.0) - Expr::Const(0.0)).is_zero());
        assert!(!(Expr::Const(0.0) * Expr::t()).is_zero());
        assert!(!Expr::t().is_zero());
    }

    #[test]
    fn test_literals_and_orders() {
        assert_eq!(Expr::number(-1.5).as_literal(), Some(-1.5));
        assert_eq!(Expr::t().as_literal(), None);
        let expr = Expr::x(2) * Expr::x(0) + Expr::t();
        assert_eq!(expr.max_state_order(), Some(2));
        assert_eq!(Expr::t().max_state_order(), None);
    }
}
