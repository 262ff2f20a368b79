//! Typed values for text cells

use serde_json::{Number, Value};

/// Infer a JSON value from raw cell text
///
/// Integers, floats and booleans are typed; an empty cell becomes null and
/// anything else stays a string.
pub fn infer(text: &str) -> Value {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Value::Null;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }

    if let Ok(float) = trimmed.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}
