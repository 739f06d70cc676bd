#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use SymbTaylor::symbolic::symbolic_engine::Expr;
/// let input = "exp(t)*x+sin(t)/x";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) defines the expression tree of functions of `t` and `x`
/// 2) turns a symbolic expression into a string expression that parses back into the same tree
///# Example#
/// ```
/// use SymbTaylor::symbolic::symbolic_engine::Expr;
/// let f = Expr::x(0) + Expr::x(0).pow_call(Expr::Const(2.0));
/// assert_eq!(f.to_string(), "x+pow(x,2)");
/// ```
pub mod symbolic_engine;
/// # Derivatives
/// total derivative with respect to `t` and the table of derivatives `x', x'', ..., x^(N)`
///# Example#
/// ```
/// use SymbTaylor::symbolic::symbolic_engine::Expr;
/// use SymbTaylor::symbolic::symbolic_engine_derivatives::DerivativeTable;
/// let symbols = vec![Expr::x(0), Expr::x(1)];
/// let df = Expr::derivative_text("pow(t,3)", &symbols).unwrap();
/// assert_eq!(df, "3*pow(t,2)");
/// // x' = x+x^2: x'' = x'+2*x'*x
/// let table = DerivativeTable::from_text("x+pow(x,2)", 2).unwrap();
/// assert_eq!(table.rendered()[1], "x'+2*x'*x");
/// let values = table.evaluate_all(1.0, 0.0).unwrap();
/// assert_eq!(values, vec![2.0, 6.0]);
/// ```
pub mod symbolic_engine_derivatives;
pub mod symbolic_errors;
/// numerical evaluation of expressions and derivative tables
pub mod symbolic_eval;
/// normalization of differentiated expressions
pub mod symbolic_simplify;
/// bracket-aware term splitter and small numerical helpers
pub mod utils;
