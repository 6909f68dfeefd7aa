//! Custom serde deserializers for flexible type handling
//!
//! The vendor sends numeric identifiers either as JSON numbers or as strings,
//! and large ids are turned into strings by the precision-preserving decoder.

use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Deserialize an identifier that can be:
/// - JSON number: `1234567890`
/// - String: `"1234567890"`
/// - `null` or missing: `None`
///
/// Numbers are kept in their exact textual form, so ids longer than
/// `f64` can represent are never rounded.
pub fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(other) => Err(de::Error::custom(format!("invalid identifier: {}", other))),
    }
}

/// Deserialize a flag sent as a JSON bool, `"true"`/`"false"`, or `0`/`1`
///
/// `null`, a missing field and anything unrecognized become `None`.
pub fn deserialize_flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestStruct {
        #[serde(default, deserialize_with = "deserialize_flexible_id")]
        id: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct FlagStruct {
        #[serde(default, deserialize_with = "deserialize_flexible_bool")]
        flag: Option<bool>,
    }

    #[test]
    fn test_deserialize_flexible_bool() {
        let flag = |value: Value| {
            serde_json::from_value::<FlagStruct>(json!({ "flag": value }))
                .unwrap()
                .flag
        };
        assert_eq!(flag(json!(true)), Some(true));
        assert_eq!(flag(json!("true")), Some(true));
        assert_eq!(flag(json!("False")), Some(false));
        assert_eq!(flag(json!(1)), Some(true));
        assert_eq!(flag(json!(0)), Some(false));
        assert_eq!(flag(json!("maybe")), None);
        assert_eq!(flag(json!(null)), None);
        assert_eq!(serde_json::from_value::<FlagStruct>(json!({})).unwrap().flag, None);
    }

    #[test]
    fn test_deserialize_number() {
        let result: TestStruct = serde_json::from_value(json!({"id": 42})).unwrap();
        assert_eq!(result.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_deserialize_large_number_from_text() {
        let result: TestStruct =
            serde_json::from_str(r#"{"id": 123456789012345678901}"#).unwrap();
        assert_eq!(result.id.as_deref(), Some("123456789012345678901"));
    }

    #[test]
    fn test_deserialize_string() {
        let result: TestStruct = serde_json::from_value(json!({"id": " 8675309 "})).unwrap();
        assert_eq!(result.id.as_deref(), Some("8675309"));
    }

    #[test]
    fn test_deserialize_empty_string() {
        let result: TestStruct = serde_json::from_value(json!({"id": ""})).unwrap();
        assert_eq!(result.id, None);
    }

    #[test]
    fn test_deserialize_null() {
        let result: TestStruct = serde_json::from_value(json!({"id": null})).unwrap();
        assert_eq!(result.id, None);
    }

    #[test]
    fn test_deserialize_missing_field() {
        let result: TestStruct = serde_json::from_value(json!({})).unwrap();
        assert_eq!(result.id, None);
    }

    #[test]
    fn test_deserialize_invalid_type() {
        let result: Result<TestStruct, _> = serde_json::from_value(json!({"id": [1, 2]}));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid identifier"));
    }
}
