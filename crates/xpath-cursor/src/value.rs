use crate::plan::ResultType;

/// Result of [`Query::evaluate`](crate::Query::evaluate).
///
/// For node sets the query itself is the handle: drain it with `advance`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<C> {
    NodeSet,
    Number(f64),
    String(String),
    Boolean(bool),
    Fragment(C),
}

impl<C> Value<C> {
    pub fn result_type(&self) -> ResultType {
        match self {
            Value::NodeSet => ResultType::NodeSet,
            Value::Number(_) => ResultType::Number,
            Value::String(_) => ResultType::String,
            Value::Boolean(_) => ResultType::Boolean,
            Value::Fragment(_) => ResultType::Fragment,
        }
    }
}

const fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// XPath 1.0 `number()` of a string: optional `-`, digits with an optional
/// fraction, surrounded by XML whitespace. Anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim_matches(is_xml_whitespace);
    let digits = t.strip_prefix('-').unwrap_or(t);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn number_to_boolean(n: f64) -> bool {
    n != 0.0 && !n.is_nan()
}

pub fn boolean_to_number(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
