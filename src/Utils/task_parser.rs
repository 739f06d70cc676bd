/// parse document with structure like
/// ```text
/// title1
///   key1: value1, value2
///   key2: pow(x,2)
/// title2
///   key3: value3
/// ```
/// which has titles and one `key: values` pair per line into
/// HashMap<String, HashMap<String, Option<Vec<Value>>>>. Values are separated by commas
/// at bracket depth 0, so `pow(x,2)` stays one value. If some field i.e. field_x is
/// expected by the template but not found, it will be field_x: None.
///
/// `TaylorTask` reads one Taylor problem from such a document.
use crate::numerical::Taylor::{Direction, TaylorError, TaylorProblem};
use log::{LevelFilter, warn};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, map_res, recognize},
    error::{Error, ErrorKind},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

pub type DocumentMap = HashMap<String, SectionMap>;
pub type SectionMap = HashMap<String, Option<Vec<Value>>>;
/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    /// floats and integers both read as numbers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    // Try to convert to string representation
    pub fn to_string_value(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(f) => f.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

/// Parses a title (word characters without spaces)
pub(crate) fn parse_title(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    let mut parser = map(parser, String::from);
    let (input, result) = parser.parse(input)?;
    // Ignore trailing whitespace and newline characters
    Ok((input.trim(), result))
}

/// Parses a key (word characters without spaces)
pub(crate) fn parse_key(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    let mut parser = map(parser, String::from);
    parser.parse(input)
}

/// Takes the text of one value: up to a comma outside brackets, a line end or `;`.
fn take_value(input: &str) -> IResult<&str, &str> {
    let mut depth = 0usize;
    let mut end = input.len();
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                end = i;
                break;
            }
            '\n' | '\r' | ';' => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    if input[..end].trim().is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
    }
    Ok((&input[end..], &input[..end]))
}

pub(crate) fn parse_value(input: &str) -> IResult<&str, Value> {
    let mut value_parser = map_res(take_value, |s: &str| -> Result<Value, String> {
        let s = s.trim();
        // Try parsing as different types in order
        if let Ok(val) = s.parse::<i64>() {
            Ok(Value::Integer(val))
        } else if let Ok(val) = s.parse::<f64>() {
            Ok(Value::Float(val))
        } else if let Ok(val) = s.parse::<bool>() {
            Ok(Value::Boolean(val))
        } else {
            Ok(Value::String(s.to_string()))
        }
    });
    value_parser.parse(input)
}

pub(crate) fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    let (input, _) = space0(input)?;
    let separator_coma = delimited(space0, tag(","), space0);
    let mut value_parser = separated_list0(separator_coma, parse_value);
    value_parser.parse(input)
}

/// Parses a key-value pair where value is a list
pub(crate) fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon_separator = delimited(space0, tag(":"), space0);
    let mut parser = separated_pair(parse_key, colon_separator, parse_value_list);
    let (input, result) = parser.parse(input)?;
    Ok((input.trim(), result))
}

/// Parses a section with a title and multiple key-value pairs
pub(crate) fn parse_section(input: &str) -> IResult<&str, (String, HashMap<String, Vec<Value>>)> {
    let (input, _) = space0(input)?;
    let (input, title) = parse_title(input)?;
    let (input, _) = multispace0(input)?;
    let mut parser = many1(terminated(parse_key_value_pair, space0));
    let (input, pairs) = parser.parse(input)?;

    let mut section_map = HashMap::new();
    for (key, values) in pairs {
        section_map.insert(key, values);
    }
    Ok((input, (title, section_map)))
}

/// Filters out comment lines (starting with //, #, %, or ;) and empty lines
pub fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.starts_with(';')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parses the entire document into a HashMap
pub fn parse_document(input: &str) -> IResult<&str, DocumentMap> {
    let mut parser = many1(delimited(space0, parse_section, multispace0));
    let (input, sections) = parser.parse(input)?;

    let mut result = HashMap::new();
    for (title, section_map) in sections.into_iter() {
        let title_map: SectionMap = section_map
            .into_iter()
            .map(|(key, values)| (key, Some(values)))
            .collect();
        result.insert(title, title_map);
    }
    Ok((input, result))
}

/// Parses a document and merges with a template HashMap, ensuring all expected keys exist
pub fn parse_document_with_template(
    input: &str,
    template: &DocumentMap,
) -> Result<DocumentMap, String> {
    let mut parsed = parse_whole_document(input)?;
    for (title, keys_map) in template {
        let section_map = parsed.entry(title.clone()).or_default();
        for key in keys_map.keys() {
            section_map.entry(key.clone()).or_insert(None);
        }
    }
    Ok(parsed)
}

fn parse_whole_document(input: &str) -> Result<DocumentMap, String> {
    match parse_document(input) {
        Ok((remaining, parsed)) => {
            if !remaining.trim().is_empty() {
                return Err(format!(
                    "Failed to parse entire document. Remaining: '{}'",
                    remaining
                ));
            }
            Ok(parsed)
        }
        Err(e) => Err(format!("Parsing error: {:?}", e)),
    }
}

/// Helper function to parse a document, comment lines are skipped
pub fn parse_document_as(input: &str, template: Option<DocumentMap>) -> Result<DocumentMap, String> {
    let filtered = filter_comments(input);
    match template {
        Some(template) => parse_document_with_template(&filtered, &template),
        None => parse_whole_document(&filtered),
    }
}

const TEMPLATE: [(&str, &[&str]); 3] = [
    ("function", &["rhs", "order"]),
    ("taylor", &["a", "b", "h", "initial", "direction", "exact"]),
    ("output", &["csv", "report_every", "log_level", "log_file"]),
];

/// One Taylor problem with its output settings, read from a task document:
/// ```text
/// function
///   rhs: x+pow(x,2)
///   order: 4
/// taylor
///   a: 1.0
///   b: 2.77
///   h: 0.01
///   initial: exp(1)/(16-exp(1))
///   direction: forward
///   exact: exp(t)/(16-exp(t))
/// output
///   csv: taylor_result.csv
///   report_every: 50
///   log_level: info
///   log_file: taylor.log
/// ```
/// `rhs`, `order`, `a`, `b`, `h` and `initial` are required; `direction` defaults to
/// forward (`1`/`2` are accepted too), `report_every` to 50 and `log_level` to info.
#[derive(Debug, Clone, PartialEq)]
pub struct TaylorTask {
    pub problem: TaylorProblem,
    pub csv: Option<String>,
    pub report_every: usize,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
}

impl Default for TaylorTask {
    /// `x' = x+x^2` on `[1, 2.77]` with the exact solution `exp(t)/(16-exp(t))`
    fn default() -> Self {
        TaylorTask {
            problem: TaylorProblem::new(
                "x+pow(x,2)",
                4,
                1.0,
                2.77,
                0.01,
                "exp(1)/(16-exp(1))",
                Direction::Forward,
            )
            .with_exact("exp(t)/(16-exp(t))"),
            csv: Some("taylor_result.csv".to_string()),
            report_every: 50,
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

impl TaylorTask {
    /// every section and key the task understands, all set to None
    pub fn template() -> DocumentMap {
        TEMPLATE
            .iter()
            .map(|(title, keys)| {
                let section: SectionMap = keys.iter().map(|key| (key.to_string(), None)).collect();
                (title.to_string(), section)
            })
            .collect()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TaylorError> {
        let text = std::fs::read_to_string(path)?;
        text.parse()
    }

    pub fn from_document(document: &DocumentMap) -> Result<Self, TaylorError> {
        warn_unknown_keys(document);

        let rhs = required(document, "function", "rhs")?.to_string_value();
        let order = required(document, "function", "order")?;
        let order = order
            .as_integer()
            .and_then(|order| usize::try_from(order).ok())
            .ok_or_else(|| task_error(format!("order must be a non-negative integer, got '{}'", order)))?;

        let a = number(document, "taylor", "a")?;
        let b = number(document, "taylor", "b")?;
        let h = number(document, "taylor", "h")?;
        let initial = required(document, "taylor", "initial")?.to_string_value();
        let direction = match single(document, "taylor", "direction")? {
            Some(value) => Direction::from_str(&value.to_string_value())
                .map_err(|_| task_error(format!("unknown direction '{}'", value)))?,
            None => Direction::Forward,
        };

        let mut problem = TaylorProblem::new(&rhs, order, a, b, h, &initial, direction);
        if let Some(exact) = single(document, "taylor", "exact")? {
            problem = problem.with_exact(&exact.to_string_value());
        }
        problem.validate()?;

        let report_every = match single(document, "output", "report_every")? {
            Some(value) => value
                .as_integer()
                .filter(|every| *every >= 1)
                .map(|every| every as usize)
                .ok_or_else(|| task_error(format!("report_every must be a positive integer, got '{}'", value)))?,
            None => 50,
        };
        let log_level = match single(document, "output", "log_level")? {
            Some(value) => LevelFilter::from_str(&value.to_string_value())
                .map_err(|_| task_error(format!("unknown log level '{}'", value)))?,
            None => LevelFilter::Info,
        };
        let csv = single(document, "output", "csv")?.map(Value::to_string_value);
        let log_file = single(document, "output", "log_file")?.map(Value::to_string_value);

        Ok(TaylorTask {
            problem,
            csv,
            report_every,
            log_level,
            log_file,
        })
    }
}

impl FromStr for TaylorTask {
    type Err = TaylorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let document = parse_document_as(s, Some(TaylorTask::template())).map_err(TaylorError::Task)?;
        TaylorTask::from_document(&document)
    }
}

fn task_error(message: String) -> TaylorError {
    TaylorError::Task(message)
}

fn warn_unknown_keys(document: &DocumentMap) {
    let template = TaylorTask::template();
    for (title, section) in document {
        match template.get(title) {
            None => warn!("unknown section '{}' is ignored", title),
            Some(known) => section
                .keys()
                .filter(|key| !known.contains_key(*key))
                .for_each(|key| warn!("unknown key '{}' in section '{}' is ignored", key, title)),
        }
    }
}

/// the value of a one-value key, `None` when the key is absent or empty
fn single<'a>(document: &'a DocumentMap, section: &str, key: &str) -> Result<Option<&'a Value>, TaylorError> {
    match document.get(section).and_then(|fields| fields.get(key)) {
        Some(Some(values)) => match values.as_slice() {
            [] => Ok(None),
            [value] => Ok(Some(value)),
            _ => Err(task_error(format!(
                "key '{}' in section '{}' takes one value, got {}",
                key,
                section,
                values.len()
            ))),
        },
        _ => Ok(None),
    }
}

fn required<'a>(document: &'a DocumentMap, section: &str, key: &str) -> Result<&'a Value, TaylorError> {
    single(document, section, key)?
        .ok_or_else(|| task_error(format!("missing key '{}' in section '{}'", key, section)))
}

fn number(document: &DocumentMap, section: &str, key: &str) -> Result<f64, TaylorError> {
    let value = required(document, section, key)?;
    value
        .as_float()
        .ok_or_else(|| task_error(format!("key '{}' expects a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests1 {
    use super::*;

    #[test]
    fn test_parse_title() {
        let (remaining, title) = parse_title("function\n rhs: x").unwrap();
        assert_eq!(title, "function");
        assert_eq!(remaining, "rhs: x");
    }

    #[test]
    fn test_parse_value_keeps_brackets_together() {
        let (remaining, value) = parse_value("pow(x,2), next").unwrap();
        assert_eq!(value, Value::String("pow(x,2)".to_string()));
        assert_eq!(remaining, ", next");
        let (remaining, value) = parse_value("exp(1)/(16-exp(1))\n b: 2").unwrap();
        assert_eq!(value, Value::String("exp(1)/(16-exp(1))".to_string()));
        assert_eq!(remaining, "\n b: 2");
        let (_, value) = parse_value("0.01").unwrap();
        assert_eq!(value, Value::Float(0.01));
        let (_, value) = parse_value("4").unwrap();
        assert_eq!(value, Value::Integer(4));
        assert!(parse_value("\nnext").is_err());
    }

    #[test]
    fn test_parse_value_list() {
        let (remaining, values) = parse_value_list("x + t, pow(x, 2) ,true").unwrap();
        assert_eq!(
            values,
            vec![
                Value::String("x + t".to_string()),
                Value::String("pow(x, 2)".to_string()),
                Value::Boolean(true)
            ]
        );
        assert_eq!(remaining, "");
        let (_, values) = parse_value_list("").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_parse_key_value_pair() {
        let (remaining, (key, values)) = parse_key_value_pair("rhs : x+pow(x,2)\n order: 4").unwrap();
        assert_eq!(key, "rhs");
        assert_eq!(values, vec![Value::String("x+pow(x,2)".to_string())]);
        assert_eq!(remaining, "order: 4");
        let (remaining, (key, values)) = parse_key_value_pair("exact:\nnext: 1").unwrap();
        assert_eq!(key, "exact");
        assert!(values.is_empty());
        assert_eq!(remaining, "next: 1");
    }
}
