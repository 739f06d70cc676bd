// the collection of utility functions for bracket parsing and proceeding: the term splitter
use crate::symbolic::symbolic_engine::{ProductOp, Sign};
use crate::symbolic::symbolic_errors::SymbolicError;

/// operands of a top-level sum/difference
#[derive(Debug, Clone, PartialEq)]
pub struct SumTerms<'a> {
    /// `signs.len() + 1` operands
    pub terms: Vec<&'a str>,
    /// byte positions of the `+`/`-` split points
    pub indices: Vec<usize>,
    /// sign found at each split point
    pub signs: Vec<Sign>,
}

impl<'a> SumTerms<'a> {
    /// true if at least one top-level `+` or `-` was found
    pub fn is_sum(&self) -> bool {
        !self.indices.is_empty()
    }
}

/// operands of a top-level product/quotient: at most two
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTerms<'a> {
    pub left: &'a str,
    /// operator and right operand, `None` when the text has no top-level `*` or `/`
    pub right: Option<(ProductOp, &'a str)>,
    pub index: Option<usize>,
}

/// Returns an error if brackets are not balanced: a `)` without its `(`, or an unclosed `(`.
pub fn check_brackets(input: &str) -> Result<(), SymbolicError> {
    let mut depth: i64 = 0;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(SymbolicError::parse(input, "closing bracket without opening one"));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SymbolicError::parse(input, "unclosed bracket"));
    }
    Ok(())
}

/// deepest bracket nesting of the text, `(a+(b))` gives 2
pub fn max_bracket_depth(input: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// characters at bracket depth 0 (brackets themselves excluded), with their byte positions
fn positions_at_depth_zero(input: &str) -> Result<Vec<(usize, char)>, SymbolicError> {
    check_brackets(input)?;
    let mut depth = 0usize;
    let mut top_level = Vec::new();
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 => top_level.push((i, c)),
            _ => {}
        }
    }
    Ok(top_level)
}

/// Splits a sum/difference into its terms.
///
/// A `+` or `-` is a split point only at bracket depth 0. A `-` at position 0 is the
/// unary minus of the first term and is not a split point; every other top-level sign
/// is, whatever precedes it (`a*-b` gives the terms `a*` and `b`).
///
/// # Examples
/// ```rust, ignore
/// let terms = split_plus_minus("(a+b)*c+d-e/(f-g)").unwrap();
/// assert_eq!(terms.terms, vec!["(a+b)*c", "d", "e/(f-g)"]);
/// ```
pub fn split_plus_minus(input: &str) -> Result<SumTerms<'_>, SymbolicError> {
    let mut terms = Vec::new();
    let mut indices = Vec::new();
    let mut signs = Vec::new();
    let mut term_start = 0;
    for (i, c) in positions_at_depth_zero(input)? {
        let Some(sign) = Sign::from_char(c) else {
            continue;
        };
        if sign == Sign::Minus && i == 0 {
            continue;
        }
        terms.push(&input[term_start..i]);
        indices.push(i);
        signs.push(sign);
        term_start = i + 1;
    }
    terms.push(&input[term_start..]);
    Ok(SumTerms {
        terms,
        indices,
        signs,
    })
}

/// Splits a product/quotient at the FIRST top-level `*` or `/` into exactly two operands.
/// `a*b*c` gives `a` and `b*c`; `a/b*c` gives `a` and `b*c`.
pub fn split_mult_divide(input: &str) -> Result<ProductTerms<'_>, SymbolicError> {
    for (i, c) in positions_at_depth_zero(input)? {
        if let Some(op) = ProductOp::from_char(c) {
            return Ok(ProductTerms {
                left: &input[..i],
                right: Some((op, &input[i + 1..])),
                index: Some(i),
            });
        }
    }
    Ok(ProductTerms {
        left: input,
        right: None,
        index: None,
    })
}

/// position of the first top-level occurrence of `c`
pub fn find_char_position_outside_brackets(input: &str, c: char) -> Result<Option<usize>, SymbolicError> {
    Ok(positions_at_depth_zero(input)?
        .into_iter()
        .find(|(_, ch)| *ch == c)
        .map(|(i, _)| i))
}

/// positions of all top-level commas, used to split function argument lists
pub fn find_top_level_commas(input: &str) -> Result<Vec<usize>, SymbolicError> {
    Ok(positions_at_depth_zero(input)?
        .into_iter()
        .filter(|(_, ch)| *ch == ',')
        .map(|(i, _)| i)
        .collect())
}

/// True if the whole string is enclosed by ONE pair of brackets: `(a+b)` yes, `(a)+(b)` no.
pub fn has_outer_brackets(input: &str) -> bool {
    if !input.starts_with('(') {
        return false;
    }
    match find_pair_to_this_bracket(input, 0) {
        Some(end) => end == input.len() - 1,
        None => false,
    }
}

/// position of the bracket closing the one opened at `bracket_start`
pub fn find_pair_to_this_bracket(input: &str, bracket_start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in input[bracket_start..].char_indices() {
        if c == '(' {
            depth += 1;
        } else if c == ')' {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(bracket_start + i);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plus_minus_respects_brackets() {
        let terms = split_plus_minus("(a+b)*c+d*h*l-e/(f-g)").unwrap();
        assert_eq!(terms.terms, vec!["(a+b)*c", "d*h*l", "e/(f-g)"]);
        assert_eq!(terms.signs, vec![Sign::Plus, Sign::Minus]);
        assert_eq!(terms.indices, vec![7, 13]);
    }

    #[test]
    fn test_leading_minus_is_not_a_split_point() {
        let terms = split_plus_minus("-x").unwrap();
        assert!(!terms.is_sum());
        assert_eq!(terms.terms, vec!["-x"]);
        let terms = split_plus_minus("-x+t").unwrap();
        assert_eq!(terms.terms, vec!["-x", "t"]);
    }

    #[test]
    fn test_split_after_operator() {
        let terms = split_plus_minus("a*-b").unwrap();
        assert_eq!(terms.terms, vec!["a*", "b"]);
        let terms = split_plus_minus("+x").unwrap();
        assert_eq!(terms.terms, vec!["", "x"]);
    }

    #[test]
    fn test_split_mult_divide_first_operator() {
        let terms = split_mult_divide("a*b/c").unwrap();
        assert_eq!(terms.left, "a");
        assert_eq!(terms.right, Some((ProductOp::Mul, "b/c")));
        let terms = split_mult_divide("(a*b)/c").unwrap();
        assert_eq!(terms.left, "(a*b)");
        assert_eq!(terms.right, Some((ProductOp::Div, "c")));
        assert_eq!(terms.index, Some(5));
        let terms = split_mult_divide("sin(a*b)").unwrap();
        assert_eq!(terms.right, None);
    }

    #[test]
    fn test_unbalanced_brackets_fail() {
        assert!(split_plus_minus("(x+t").is_err());
        assert!(split_plus_minus("x+t)").is_err());
        assert!(split_mult_divide(")x*t(").is_err());
        assert!(check_brackets("((x))").is_ok());
    }

    #[test]
    fn test_outer_brackets() {
        assert!(has_outer_brackets("(a+b)"));
        assert!(has_outer_brackets("((a)+(b))"));
        assert!(!has_outer_brackets("(a)+(b)"));
        assert!(!has_outer_brackets("a+b"));
        assert!(!has_outer_brackets("(a+b"));
    }

    #[test]
    fn test_top_level_commas() {
        assert_eq!(find_top_level_commas("t,2").unwrap(), vec![1]);
        assert_eq!(find_top_level_commas("pow(t,2),3").unwrap(), vec![8]);
        assert_eq!(find_char_position_outside_brackets("(a^b)^c", '^').unwrap(), Some(5));
    }

    #[test]
    fn test_max_bracket_depth() {
        assert_eq!(max_bracket_depth("t*t*t"), 0);
        assert_eq!(max_bracket_depth("(a+(b))*(c)"), 2);
        assert_eq!(max_bracket_depth("sin(cos(exp(t)))"), 3);
    }
}
