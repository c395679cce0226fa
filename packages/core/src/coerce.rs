// ABOUTME: Lenient scalar coercion for request bodies
// ABOUTME: Accepts the loose boolean and integer encodings browser clients send

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as an integer identifier.
///
/// Integers, integral floats and strings holding an integer are accepted;
/// everything else yields `None`.
pub fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Boolean that also accepts `1`/`0` and `"true"`/`"1"` style strings.
///
/// Anything that is not a recognized truthy value is `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let truthy = match &value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_i64() == Some(1),
            Value::String(s) => matches!(s.as_str(), "1" | "true" | "True"),
            _ => false,
        };
        Ok(Flag(truthy))
    }
}

/// Integer that also accepts numeric strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LenientInt(pub i64);

impl<'de> Deserialize<'de> for LenientInt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        coerce_id(&value)
            .map(LenientInt)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", value)))
    }
}
