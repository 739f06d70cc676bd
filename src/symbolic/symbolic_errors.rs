//! Error types of the expression engine.
//!
//! Every structural failure names the piece of text that caused it, so that a
//! failed differentiation can be traced back to the sub-expression the user typed.
//! Non-finite arithmetic is not an error here: it travels as an `f64` value.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolicError {
    /// unbalanced brackets, empty operand, malformed `pow` argument list, too deep nesting
    #[error("parse error in '{text}': {reason}")]
    Parse { text: String, reason: String },
    /// atomic term is not a constant, a variable or a known function
    #[error("unrecognized term: '{0}'")]
    UnrecognizedTerm(String),
    /// `symbol` needs a derivative of the state variable beyond the populated table
    #[error("'{symbol}' needs the derivative of order {order}, out of the derivative table (max order {max_order})")]
    DerivativeTableBounds {
        symbol: String,
        order: usize,
        max_order: usize,
    },
    #[error("evaluation budget exceeded: recursion deeper than {limit}")]
    EvaluationBudgetExceeded { limit: usize },
}

impl SymbolicError {
    pub fn parse(text: &str, reason: &str) -> Self {
        SymbolicError::Parse {
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}
