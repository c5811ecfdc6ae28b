pub mod stdin;

use serde_json::{Map, Value};

use crate::error::StatuslineError;

/// Parse the stdin payload into a JSON object.
///
/// Blank input is an empty object. Anything that is not a JSON object is an
/// input error.
pub fn parse_input(raw: &str) -> Result<Map<String, Value>, StatuslineError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(StatuslineError::NotAnObject("an array")),
        Value::String(_) => Err(StatuslineError::NotAnObject("a string")),
        Value::Number(_) => Err(StatuslineError::NotAnObject("a number")),
        Value::Bool(_) => Err(StatuslineError::NotAnObject("a boolean")),
        Value::Null => Err(StatuslineError::NotAnObject("null")),
    }
}
