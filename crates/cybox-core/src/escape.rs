//! Normalization of list-capable text values into one binding-tree text node.
//!
//! A list is joined with `,` after each element's own commas are escaped to
//! `&comma;`. When the escaped text contains that token it is wrapped in a
//! CDATA marker so a downstream XML writer emits it verbatim. Markup
//! characters are escaped alongside, so escaped text can never start with a
//! CDATA marker of its own.
//!
//! ```
//! use cybox_core::escape::{denormalize, normalize, TextValue};
//!
//! let value = TextValue::List(vec!["a,b".into(), "c".into()]);
//! let text = normalize(&value);
//! assert_eq!(text, "<![CDATA[a&comma;b,c]]>");
//! assert_eq!(denormalize(&text), value);
//! ```
//!
//! A one-element list normalizes to the same text as the bare scalar and
//! therefore decodes as [`TextValue::Single`]. The `From` conversions and
//! [`TextValue::list`] build the scalar form for a single element, so values
//! made through them survive the binding tree unchanged.

use serde::{Deserialize, Serialize};

const COMMA_TOKEN: &str = "&comma;";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// A scalar string or a list of scalar strings held by one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Single(String),
    List(Vec<String>),
}

impl TextValue {
    /// The scalar, or the first list element.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::List(values) => values.first().map(String::as_str),
        }
    }

    /// A list value; one element gives [`TextValue::Single`].
    #[must_use]
    pub fn list(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() == 1 {
            if let Some(only) = values.pop() {
                return Self::Single(only);
            }
        }
        Self::List(values)
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl From<&str> for TextValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for TextValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for TextValue {
    fn from(values: Vec<String>) -> Self {
        Self::list(values)
    }
}

impl From<Vec<&str>> for TextValue {
    fn from(values: Vec<&str>) -> Self {
        Self::list(values)
    }
}

/// Flatten a value into one text node.
#[must_use]
pub fn normalize(value: &TextValue) -> String {
    let text = match value {
        TextValue::Single(value) => escape(value),
        TextValue::List(values) => values
            .iter()
            .map(|v| escape(v))
            .collect::<Vec<_>>()
            .join(","),
    };

    if text.contains(COMMA_TOKEN) {
        wrap_cdata(&text)
    } else {
        text
    }
}

/// Inverse of [`normalize`].
#[must_use]
pub fn denormalize(text: &str) -> TextValue {
    let text = unwrap_cdata(text);

    if text.contains(',') {
        TextValue::List(text.split(',').map(unescape).collect())
    } else {
        TextValue::Single(unescape(text))
    }
}

/// Escape markup characters and literal commas.
#[must_use]
pub fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('>', "&gt;")
        .replace('<', "&lt;")
        .replace(',', COMMA_TOKEN)
}

/// Inverse of [`escape`]. `&amp;` is resolved last.
#[must_use]
pub fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace(COMMA_TOKEN, ",")
        .replace("&amp;", "&")
}

#[must_use]
pub fn wrap_cdata(value: &str) -> String {
    format!("{CDATA_OPEN}{value}{CDATA_CLOSE}")
}

/// Remove CDATA wrapping from `value` if present.
#[must_use]
pub fn unwrap_cdata(value: &str) -> &str {
    value
        .strip_prefix(CDATA_OPEN)
        .and_then(|inner| inner.strip_suffix(CDATA_CLOSE))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn list_with_embedded_comma_round_trips() {
        let value = TextValue::from(vec!["a,b", "c"]);
        assert_eq!(denormalize(&normalize(&value)), value);
    }

    #[test]
    fn plain_list_is_not_wrapped() {
        let value = TextValue::from(vec!["a", "b", "c"]);
        assert_eq!(normalize(&value), "a,b,c");
    }

    #[test]
    fn scalar_with_comma_is_wrapped() {
        let value = TextValue::from("x,y");
        assert_eq!(normalize(&value), "<![CDATA[x&comma;y]]>");
        assert_eq!(denormalize("<![CDATA[x&comma;y]]>"), value);
    }

    #[rstest]
    #[case("plain")]
    #[case("")]
    #[case("a & b")]
    #[case("<tag>")]
    #[case("&comma;")]
    #[case("&amp;comma;")]
    #[case("<![CDATA[inner]]>")]
    fn scalar_round_trips(#[case] input: &str) {
        let value = TextValue::from(input);
        assert_eq!(denormalize(&normalize(&value)), value);
    }

    #[test]
    fn single_element_list_collapses_to_scalar() {
        let raw = TextValue::List(vec!["only".into()]);
        assert_eq!(denormalize(&normalize(&raw)), TextValue::from("only"));
    }

    #[test]
    fn one_element_conversion_builds_the_scalar_form() {
        let value = TextValue::from(vec!["only"]);
        assert_eq!(value, TextValue::Single("only".into()));
        assert_eq!(denormalize(&normalize(&value)), value);
        assert_eq!(TextValue::list(["a", "b"]), TextValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn unwrap_cdata_leaves_unwrapped_text_alone() {
        assert_eq!(unwrap_cdata("no markers"), "no markers");
        assert_eq!(unwrap_cdata("<![CDATA[half"), "<![CDATA[half");
    }

    #[test]
    fn denormalize_does_not_trim_list_elements() {
        assert_eq!(
            denormalize("a, b"),
            TextValue::List(vec!["a".into(), " b".into()])
        );
    }
}
