use crate::symbolic::symbolic_engine::{Expr, Func, Sign, Variable};
use crate::symbolic::symbolic_errors::SymbolicError;
use crate::symbolic::utils::{
    check_brackets, find_char_position_outside_brackets, find_pair_to_this_bracket,
    find_top_level_commas, has_outer_brackets, max_bracket_depth, split_mult_divide,
    split_plus_minus,
};
use log::trace;
use std::str::FromStr;
/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use SymbTaylor::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x+pow(x,2)").unwrap();
/// assert_eq!(parsed_expression.to_string(), "x+pow(x,2)");
/// ```
//                  search recursion diagram
//                "exp(t)*x+sin(t)/x'-pow(x,2)"          |
//                |  outer brackets? no                  |
//                |______________________________________|
//                |  split by top-level + and -          |
//                |______________________________________|
//                | exp(t)*x  | sin(t)/x'   | pow(x,2)   |
//                |    +      |     +       |    -       |
//                |____|______|_____|_______|____|_______|
//                |   \|/     |    \|/      |   \|/      |
//                | split by first top-level * or /      |
//                | exp(t) | x| sin(t) | x' |  (none)    |
//                |____|___|__|____|___|____|____|_______|
//                |   \|/     |   \|/       |   \|/      |
//                | unary -, ^, constant, call, variable |
//                |_____________Ok_______________________|

/// deeper bracket nesting than this is rejected instead of risking the stack;
/// flat chains like `t*t*...*t` are not limited
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses text into an expression. Whitespace is ignored.
///
/// Unbalanced brackets, empty operands and malformed `pow` argument lists are errors;
/// an atom that is neither a number, `t`, `x'..'` nor a known function becomes
/// `Expr::Opaque` and is reported when the expression is differentiated or evaluated.
pub fn parse_expression_func(input: &str) -> Result<Expr, SymbolicError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    trace!("parsing expression {}", cleaned);
    if cleaned.is_empty() {
        return Err(SymbolicError::parse(input, "empty expression"));
    }
    check_brackets(&cleaned)?;
    if max_bracket_depth(&cleaned) > MAX_NESTING_DEPTH {
        return Err(SymbolicError::parse(input, "brackets are nested too deeply"));
    }
    parse_term(&cleaned)
}

fn parse_term(input: &str) -> Result<Expr, SymbolicError> {
    if input.is_empty() {
        return Err(SymbolicError::parse(input, "empty operand"));
    }
    // a redundant pair of outer brackets changes nothing
    if has_outer_brackets(input) {
        return parse_term(&input[1..input.len() - 1]);
    }

    let sum = split_plus_minus(input)?;
    if sum.is_sum() {
        let mut operands = Vec::with_capacity(sum.terms.len());
        let signs = std::iter::once(Sign::Plus).chain(sum.signs.iter().copied());
        for (sign, term) in signs.zip(sum.terms.iter()) {
            if term.is_empty() {
                return Err(SymbolicError::parse(input, "empty operand next to '+' or '-'"));
            }
            operands.push((sign, parse_term(term)?));
        }
        return Ok(Expr::Sum(operands));
    }

    let product = split_mult_divide(input)?;
    if let Some((op, right)) = product.right {
        if product.left.is_empty() || right.is_empty() {
            return Err(SymbolicError::parse(input, "empty operand next to '*' or '/'"));
        }
        return Ok(Expr::Product(
            parse_term(product.left)?.boxed(),
            parse_term(right)?.boxed(),
            op,
        ));
    }

    if let Some(rest) = input.strip_prefix('-') {
        return Ok(Expr::Negate(parse_term(rest)?.boxed()));
    }

    // the first top-level caret: a^b^c is a^(b^c)
    if let Some(pos) = find_char_position_outside_brackets(input, '^')? {
        let base = &input[..pos];
        let exponent = &input[pos + 1..];
        if base.is_empty() || exponent.is_empty() {
            return Err(SymbolicError::parse(input, "empty operand next to '^'"));
        }
        return Ok(Expr::Power(
            parse_term(base)?.boxed(),
            parse_term(exponent)?.boxed(),
        ));
    }

    parse_atom(input)
}

fn parse_atom(input: &str) -> Result<Expr, SymbolicError> {
    if input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        if let Ok(value) = input.parse::<f64>() {
            return Ok(Expr::Const(value));
        }
    }

    for func in Func::ALL {
        let name = func.name();
        if !(input.starts_with(name) && input[name.len()..].starts_with('(')) {
            continue;
        }
        // exp(t)*x was split before, so here the call bracket must close at the very end
        if find_pair_to_this_bracket(input, name.len()) != Some(input.len() - 1) {
            break;
        }
        let inner = &input[name.len() + 1..input.len() - 1];
        return parse_call(func, inner, input);
    }

    if input == "t" {
        return Ok(Expr::Var(Variable::Time));
    }
    if let Some(primes) = input.strip_prefix('x') {
        if primes.chars().all(|c| c == '\'') {
            return Ok(Expr::Var(Variable::State(primes.len())));
        }
    }

    Ok(Expr::Opaque(input.to_string()))
}

fn parse_call(func: Func, inner: &str, input: &str) -> Result<Expr, SymbolicError> {
    let commas = find_top_level_commas(inner)?;
    if commas.len() + 1 != func.arity() {
        let reason = match func {
            Func::pow => "pow expects two arguments separated by a top-level comma".to_string(),
            _ => format!("{} expects one argument", func.name()),
        };
        return Err(SymbolicError::parse(input, &reason));
    }
    let mut args = Vec::with_capacity(func.arity());
    let mut start = 0;
    for end in commas.into_iter().chain(std::iter::once(inner.len())) {
        let arg = &inner[start..end];
        if arg.is_empty() {
            return Err(SymbolicError::parse(input, "empty function argument"));
        }
        args.push(parse_term(arg)?);
        start = end + 1;
    }
    Ok(Expr::Call(func, args))
}

impl Expr {
    /// parse a string into a symbolic expression
    pub fn parse_expression(input: &str) -> Result<Expr, SymbolicError> {
        parse_expression_func(input)
    }
}

impl FromStr for Expr {
    type Err = SymbolicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expression_func(s)
    }
}
