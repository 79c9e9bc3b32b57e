//! Interpretation of raw engine result text.
//!
//! The engine reports a value, the absence of a value, and a fault all through
//! a single text channel. They are told apart by the [`NO_VALUE`] sentinel and
//! by whether the text is well-formed JSON, checked in that order.

use serde_json::Value;

use crate::{
    codec,
    error::{Error, Result},
};

/// Result text meaning "the script produced no value".
pub const NO_VALUE: &str = "undefined";

/// Classified result of an evaluation or call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The script produced no value.
    Null,
    /// The script produced a JSON-representable value.
    Value(Value),
    /// The engine reported a fault; carries its diagnostic text verbatim.
    Fault(String),
}

impl Outcome {
    /// Convert into a host result, mapping [`Outcome::Null`] to JSON null.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Null => Ok(Value::Null),
            Self::Value(value) => Ok(value),
            Self::Fault(text) => Err(Error::ScriptFault(text)),
        }
    }
}

/// Classify raw result text.
pub fn classify(text: &str) -> Outcome {
    if text == NO_VALUE {
        return Outcome::Null;
    }
    match codec::decode(text) {
        Some(value) => Outcome::Value(value),
        None => Outcome::Fault(text.to_string()),
    }
}
