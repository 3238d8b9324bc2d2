//! Schema-shaped binding tree.
//!
//! A `BindingNode` stands in for one element of the externally defined
//! schema: a tag, optional text content, an "any attributes" map and ordered
//! child elements. The framework reads and writes it only through the named
//! accessors below and never validates it against the schema. Rendering it as
//! XML (namespace declarations, root element) is left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Clark-notation name of the attribute carrying a payload's discriminator.
pub const XSI_TYPE: &str = "{http://www.w3.org/2001/XMLSchema-instance}type";

/// One element of the binding tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BindingNode>,
}

impl BindingNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// An element holding only text content.
    #[must_use]
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// First child element named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.tag == name)
    }

    /// All child elements named `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.tag == name)
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// The raw `xsi:type` value, e.g. `"FileObj:FileObjectType"`.
    #[must_use]
    pub fn xsi_type(&self) -> Option<&str> {
        self.attr(XSI_TYPE)
    }

    pub fn set_xsi_type(&mut self, value: impl Into<String>) {
        self.set_attr(XSI_TYPE, value);
    }
}
