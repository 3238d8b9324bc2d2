//! Scalar value kinds and their text / mapping conversions.
//!
//! Every scalar has one text form used by the binding tree (element text or
//! attribute value) and one JSON form used by the mapping representation.
//! Numbers and booleans map to native JSON values; everything else maps to a
//! string, except list-valued [`TextValue`]s which map to a JSON array.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValueError;
use crate::escape::{self, TextValue};

/// Declared kind of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    UnsignedLong,
    Double,
    Boolean,
    DateTime,
    HexBinary,
    /// Scalar-or-list text, flattened through [`escape::normalize`].
    Text,
    /// A closed set of tokens such as a composition operator.
    Token,
    /// A nested entity with its own field table.
    Entity,
    /// An Object Properties payload resolved through the type registry.
    Polymorphic,
}

impl ValueKind {
    /// Schema type name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::UnsignedLong => "unsignedLong",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::HexBinary => "hexBinary",
            Self::Text => "text",
            Self::Token => "token",
            Self::Entity => "entity",
            Self::Polymorphic => "object properties",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that fits in one text node or attribute.
pub trait ScalarValue: Sized + 'static {
    const KIND: ValueKind;

    fn to_text(&self) -> String;

    /// # Errors
    ///
    /// Returns a [`ValueError`] when `text` is not a valid lexical form.
    fn from_text(text: &str) -> Result<Self, ValueError>;

    fn to_value(&self) -> Value {
        Value::String(self.to_text())
    }

    /// # Errors
    ///
    /// Returns a [`ValueError`] when `value` has the wrong JSON type or an
    /// invalid lexical form.
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::String(text) => Self::from_text(text),
            other => Err(ValueError::new(Self::KIND.as_str(), other.to_string())),
        }
    }
}

impl ScalarValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        Ok(text.to_owned())
    }
}

impl ScalarValue for TextValue {
    const KIND: ValueKind = ValueKind::Text;

    fn to_text(&self) -> String {
        escape::normalize(self)
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        Ok(escape::denormalize(text))
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Single(value) => Value::String(value.clone()),
            Self::List(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        }
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::String(text) => Ok(Self::Single(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Ok(text.clone()),
                    other => Err(ValueError::new("string list", other.to_string())),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => Err(ValueError::new("string or string list", other.to_string())),
        }
    }
}

/// Parse a JSON number or a numeric string.
fn number_from_value<T: ScalarValue>(
    value: &Value,
    from_number: impl FnOnce(&serde_json::Number) -> Option<T>,
) -> Result<T, ValueError> {
    match value {
        Value::Number(n) => {
            from_number(n).ok_or_else(|| ValueError::new(T::KIND.as_str(), n.to_string()))
        }
        Value::String(text) => T::from_text(text),
        other => Err(ValueError::new(T::KIND.as_str(), other.to_string())),
    }
}

impl ScalarValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        text.trim()
            .parse()
            .map_err(|_| ValueError::new(Self::KIND.as_str(), text))
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        number_from_value(value, serde_json::Number::as_i64)
    }
}

impl ScalarValue for u64 {
    const KIND: ValueKind = ValueKind::UnsignedLong;

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        text.trim()
            .parse()
            .map_err(|_| ValueError::new(Self::KIND.as_str(), text))
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        number_from_value(value, serde_json::Number::as_u64)
    }
}

impl ScalarValue for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        text.trim()
            .parse()
            .map_err(|_| ValueError::new(Self::KIND.as_str(), text))
    }

    fn to_value(&self) -> Value {
        serde_json::Number::from_f64(*self).map_or_else(|| Value::String(self.to_text()), Value::Number)
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        number_from_value(value, serde_json::Number::as_f64)
    }
}

impl ScalarValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn to_text(&self) -> String {
        self.to_string()
    }

    /// Accepts the four XML Schema lexical forms.
    fn from_text(text: &str) -> Result<Self, ValueError> {
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ValueError::new(Self::KIND.as_str(), text)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(text) => Self::from_text(text),
            other => Err(ValueError::new(Self::KIND.as_str(), other.to_string())),
        }
    }
}

impl ScalarValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::DateTime;

    fn to_text(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ValueError::new(Self::KIND.as_str(), text))
    }
}

/// Raw bytes written as upper-case hex, e.g. a magic number or hash digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexBinary(pub Vec<u8>);

impl HexBinary {
    /// # Errors
    ///
    /// Returns a [`ValueError`] when `text` is not an even-length hex string.
    pub fn from_hex(text: &str) -> Result<Self, ValueError> {
        hex::decode(text.trim())
            .map(Self)
            .map_err(|_| ValueError::new(ValueKind::HexBinary.as_str(), text))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBinary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for HexBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl ScalarValue for HexBinary {
    const KIND: ValueKind = ValueKind::HexBinary;

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        Self::from_hex(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("true", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("0", false)]
    fn bool_accepts_schema_lexical_forms(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(bool::from_text(text).unwrap(), expected);
    }

    #[test]
    fn bool_rejects_other_text() {
        let err = bool::from_text("yes").unwrap_err();
        assert_eq!(err.expected, "boolean");
    }

    #[test]
    fn unsigned_long_rejects_negative() {
        assert!(u64::from_text("-1").is_err());
        assert!(u64::from_value(&json!(-1)).is_err());
        assert_eq!(u64::from_value(&json!("42")).unwrap(), 42);
    }

    #[test]
    fn double_uses_native_json_number() {
        assert_eq!(7.25_f64.to_value(), json!(7.25));
        assert!((f64::from_text("7.25").unwrap() - 7.25).abs() < f64::EPSILON);
    }

    #[test]
    fn datetime_text_is_rfc3339_utc() {
        let dt = Utc.with_ymd_and_hms(2013, 8, 1, 12, 30, 0).unwrap();
        assert_eq!(dt.to_text(), "2013-08-01T12:30:00Z");
        assert_eq!(DateTime::<Utc>::from_text("2013-08-01T14:30:00+02:00").unwrap(), dt);
    }

    #[test]
    fn hex_binary_is_upper_case() {
        let magic = HexBinary(vec![0x4d, 0x5a]);
        assert_eq!(magic.to_text(), "4D5A");
        assert_eq!(HexBinary::from_text("4d5a").unwrap(), magic);
        assert!(HexBinary::from_text("4D5").is_err());
    }

    #[test]
    fn text_value_list_maps_to_json_array() {
        let value = TextValue::from(vec!["a,b", "c"]);
        assert_eq!(value.to_value(), json!(["a,b", "c"]));
        assert_eq!(TextValue::from_value(&json!(["a,b", "c"])).unwrap(), value);
        assert_eq!(value.to_text(), "<![CDATA[a&comma;b,c]]>");
    }
}
