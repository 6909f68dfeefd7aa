//! Precision-preserving JSON decoding
//!
//! Numbers are parsed with their exact textual form kept
//! (`arbitrary_precision`); integers longer than a double can hold exactly
//! are then turned into strings so callers never see a rounded id.

use serde_json::Value;

/// Integers with more digits than this become strings
pub const MAX_SAFE_DIGITS: usize = 15;

/// Decode a JSON document, turning long integers into strings
pub fn decode(bytes: &[u8]) -> serde_json::Result<Value> {
    let mut value: Value = serde_json::from_slice(bytes)?;
    stringify_big_integers(&mut value);
    Ok(value)
}

/// Replace every integer literal longer than [`MAX_SAFE_DIGITS`] digits with its string form
pub fn stringify_big_integers(value: &mut Value) {
    match value {
        Value::Number(number) => {
            let text = number.to_string();
            if is_big_integer(&text) {
                *value = Value::String(text);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(stringify_big_integers),
        Value::Object(map) => map.values_mut().for_each(stringify_big_integers),
        _ => {}
    }
}

fn is_big_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    digits.len() > MAX_SAFE_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
}
