//! Domain errors for parsing and validating API values.

use std::fmt;
use thiserror::Error;

/// What was wrong with a field of an object-form value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldProblem {
    /// The field is absent.
    Missing,
    /// The field is present but `null`.
    Null,
    /// The field is present but not a string.
    Invalid,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "is missing"),
            Self::Null => write!(f, "has a null value"),
            Self::Invalid => write!(f, "has an invalid value"),
        }
    }
}

/// Coarse classification of a [`TypesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Compact string form is missing its separator.
    Grammar,
    /// Object form has a missing, null or wrong-typed field.
    Shape,
    /// A system key carries a value it does not accept.
    Constraint,
    /// A reserved key was used where a user key is required.
    Policy,
    /// Image reference does not follow the docker tag grammar.
    Image,
    /// Resource quantity does not follow the quantity grammar.
    Quantity,
}

/// Errors produced while parsing or validating API values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Compact string form without its separator.
    #[error("{what} parse error: {input:?} has no '{separator}' separator")]
    Grammar {
        what: &'static str,
        input: String,
        separator: char,
    },

    /// Object form with a bad `key`/`value` field.
    #[error("tag parse error: field \"{field}\" {problem}")]
    Shape {
        field: &'static str,
        problem: FieldProblem,
    },

    /// System key with a value it does not accept.
    #[error("tag parse error: {key:?} {reason} (got {value:?})")]
    Constraint {
        key: String,
        value: String,
        reason: String,
    },

    /// Reserved key in a user-owned position.
    #[error("tag key {key:?} is reserved: keys starting with \"knit#\" belong to system tags")]
    Policy { key: String },

    /// Malformed image reference.
    #[error("invalid image reference {input:?}: {reason}")]
    Image { input: String, reason: String },

    /// Malformed resource quantity.
    #[error("invalid quantity {input:?}: {reason}")]
    Quantity { input: String, reason: String },
}

impl TypesError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Grammar { .. } => ErrorKind::Grammar,
            Self::Shape { .. } => ErrorKind::Shape,
            Self::Constraint { .. } => ErrorKind::Constraint,
            Self::Policy { .. } => ErrorKind::Policy,
            Self::Image { .. } => ErrorKind::Image,
            Self::Quantity { .. } => ErrorKind::Quantity,
        }
    }

    pub(crate) fn grammar(what: &'static str, input: &str, separator: char) -> Self {
        Self::Grammar {
            what,
            input: input.to_owned(),
            separator,
        }
    }

    pub(crate) fn image(input: &str, reason: impl Into<String>) -> Self {
        Self::Image {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn quantity(input: &str, reason: impl Into<String>) -> Self {
        Self::Quantity {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}
