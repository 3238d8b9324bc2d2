//! The versioned document root.
//!
//! The version triple is fixed; it is written on encode and checked on
//! decode. A different major version is rejected. Minor and update
//! differences are logged and otherwise ignored.

use std::sync::LazyLock;

use cybox_core::fields::{
    decode_binding_fields, decode_mapping_fields, encode_binding_fields, encode_mapping_fields,
};
use cybox_core::{BindingNode, DecodeContext, DecodeError, Entity, Field, MeasureSource};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::observable::{Observable, Payload};

pub const MAJOR_VERSION: u32 = 2;
pub const MINOR_VERSION: u32 = 1;
pub const UPDATE_VERSION: u32 = 0;

const BINDING_VERSION_ATTRS: [&str; 3] = [
    "cybox_major_version",
    "cybox_minor_version",
    "cybox_update_version",
];
const MAPPING_VERSION_KEYS: [&str; 3] = ["major_version", "minor_version", "update_version"];

/// Root container of Observables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observables {
    pub observable_package_source: Option<MeasureSource>,
    pub observables: Vec<Observable>,
}

impl Observables {
    #[must_use]
    pub fn new(observables: impl IntoIterator<Item = Observable>) -> Self {
        Self {
            observable_package_source: None,
            observables: observables.into_iter().collect(),
        }
    }

    pub fn add(&mut self, observable: Observable) {
        self.observables.push(observable);
    }

    /// Wrap `item` in a new Observable and append it.
    pub fn add_item(&mut self, item: impl Into<Payload>) {
        self.add(Observable::new(item));
    }

    #[must_use]
    pub const fn version() -> (u32, u32, u32) {
        (MAJOR_VERSION, MINOR_VERSION, UPDATE_VERSION)
    }
}

impl Entity for Observables {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Observables>>> = LazyLock::new(|| {
            vec![
                Field::entity(
                    "Observable_Package_Source",
                    "observable_package_source",
                    |o: &Observables| &o.observable_package_source,
                    |o: &mut Observables| &mut o.observable_package_source,
                ),
                Field::entities(
                    "Observable",
                    "observables",
                    |o: &Observables| &o.observables,
                    |o: &mut Observables| &mut o.observables,
                ),
            ]
        });
        &FIELDS
    }

    fn to_binding(&self, tag: &str) -> BindingNode {
        let mut node = BindingNode::new(tag);
        let (major, minor, update) = Self::version();
        for (name, value) in BINDING_VERSION_ATTRS.into_iter().zip([major, minor, update]) {
            node.set_attr(name, value.to_string());
        }
        encode_binding_fields(self, &mut node);
        node
    }

    fn from_binding(node: &BindingNode, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let found = BINDING_VERSION_ATTRS.map(|name| node.attr(name).map(str::to_owned));
        check_version(&found)?;
        decode_binding_fields(node, cx)
    }

    fn to_mapping(&self) -> Value {
        let mut map = Map::new();
        let (major, minor, update) = Self::version();
        for (key, value) in MAPPING_VERSION_KEYS.into_iter().zip([major, minor, update]) {
            map.insert(key.to_owned(), Value::from(value));
        }
        encode_mapping_fields(self, &mut map);
        map.entry("observables").or_insert_with(|| Value::Array(Vec::new()));
        Value::Object(map)
    }

    fn from_mapping(value: &Value, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let Value::Object(map) = value else {
            return Err(DecodeError::UnexpectedShape {
                field: "observables",
                expected: "mapping",
            });
        };
        let found = MAPPING_VERSION_KEYS.map(|key| map.get(key).and_then(version_text));
        check_version(&found)?;
        decode_mapping_fields(map, cx)
    }
}

fn version_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Compare a document's `[major, minor, update]` against ours. Absent parts
/// are accepted.
fn check_version(found: &[Option<String>; 3]) -> Result<(), DecodeError> {
    let [major, minor, update] = found;

    if let Some(major) = major {
        if parse_part(major) != Some(MAJOR_VERSION) {
            return Err(DecodeError::UnsupportedVersion {
                expected: MAJOR_VERSION,
                found: major.clone(),
            });
        }
    }

    for (part, value, expected) in [("minor", minor, MINOR_VERSION), ("update", update, UPDATE_VERSION)] {
        let Some(value) = value else { continue };
        if parse_part(value) != Some(expected) {
            warn!(part, found = %value, expected, "document version differs; decoding anyway");
        }
    }

    debug!(?major, "document version accepted");
    Ok(())
}

fn parse_part(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}
