//! Literal leaf values.
//!
//! A [`Value`] is a concrete scalar that can appear in a graph and on the
//! wire: nothing, a boolean, a number, a string, or a link. Sequences and
//! mappings are composite forms of [`State`](crate::state::State), not
//! values, so each wire shape has exactly one in-memory representation.

use crate::uri::Uri;
use crate::vocab;

/// A concrete scalar leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// A link to a symbolic address.
    Link(Uri),
}

impl Value {
    /// Returns the canonical class of this value.
    #[must_use]
    pub fn class(&self) -> Uri {
        let path = match self {
            Value::Nil => vocab::VALUE_NONE,
            Value::Bool(_) => vocab::NUMBER_BOOL,
            Value::Int(_) => vocab::NUMBER_INT,
            Value::Float(_) => vocab::NUMBER_FLOAT,
            Value::Str(_) => vocab::VALUE_STRING,
            Value::Link(_) => vocab::VALUE_LINK,
        };
        Uri::new(path)
    }

    /// Returns true for numeric values (booleans included).
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Uri> for Value {
    fn from(uri: Uri) -> Self {
        Value::Link(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_stable() {
        assert_eq!(Value::Nil.class().as_str(), vocab::VALUE_NONE);
        assert_eq!(Value::Int(1).class().as_str(), vocab::NUMBER_INT);
        assert_eq!(Value::Bool(true).class().as_str(), vocab::NUMBER_BOOL);
        assert_eq!(Value::Float(0.5).class().as_str(), vocab::NUMBER_FLOAT);
        assert_eq!(Value::Str("a".into()).class().as_str(), vocab::VALUE_STRING);
    }

    #[test]
    fn numbers_include_booleans() {
        assert!(Value::Bool(false).is_number());
        assert!(Value::Int(0).is_number());
        assert!(Value::Float(0.0).is_number());
        assert!(!Value::Str(String::new()).is_number());
        assert!(!Value::Nil.is_number());
    }
}
