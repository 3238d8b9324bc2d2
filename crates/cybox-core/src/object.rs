//! The Object wrapper around a payload, and its relations.

use std::sync::LazyLock;

use serde_json::Value;

use crate::binding::BindingNode;
use crate::error::DecodeError;
use crate::fields::{Entity, Field, decode_binding_fields, decode_mapping_fields};
use crate::ids;
use crate::properties::ObjectProperties;
use crate::registry::DecodeContext;

/// An identified wrapper holding at most one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub id: Option<String>,
    pub idref: Option<String>,
    pub properties: Option<Box<dyn ObjectProperties>>,
    pub related_objects: Vec<RelatedObject>,
}

impl Object {
    /// An empty Object with a freshly generated id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(ids::create_id("Object"))
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// A reference to another Object.
    #[must_use]
    pub fn reference(idref: impl Into<String>) -> Self {
        Self {
            idref: Some(idref.into()),
            ..Self::default()
        }
    }

    /// Wrap a payload, reusing the wrapper it already built for itself.
    #[must_use]
    pub fn wrap(mut properties: Box<dyn ObjectProperties>) -> Self {
        let parent = properties.base_mut().take_parent();
        let mut object =
            parent.unwrap_or_else(|| Self::with_id(ids::create_id(properties.id_prefix())));
        object.properties = Some(properties);
        object.adopt_properties();
        object
    }

    #[must_use]
    pub fn properties(&self) -> Option<&dyn ObjectProperties> {
        self.properties.as_deref()
    }

    /// Place `properties` in this Object, replacing any previous payload.
    pub fn set_properties(&mut self, properties: Box<dyn ObjectProperties>) {
        self.properties = Some(properties);
        self.adopt_properties();
    }

    /// Relate `related` to this Object by embedding it.
    pub fn add_related_inline(&mut self, related: Box<dyn ObjectProperties>, relationship: &str) {
        self.related_objects.push(RelatedObject::inline(related, relationship));
    }

    /// Relate `related` to this Object by reference to its wrapper's id.
    pub fn add_related_ref(&mut self, related: &mut dyn ObjectProperties, relationship: &str) {
        self.related_objects.push(RelatedObject::reference(related.wrapper_id(), relationship));
    }

    fn adopt_properties(&mut self) {
        if let Some(properties) = self.properties.as_mut() {
            properties.base_mut().adopt(self.id.clone());
        }
    }
}

impl Entity for Object {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Object>>> = LazyLock::new(|| {
            vec![
                Field::attribute("id", "id", |o: &Object| &o.id, |o: &mut Object| &mut o.id),
                Field::attribute("idref", "idref", |o: &Object| &o.idref, |o: &mut Object| {
                    &mut o.idref
                }),
                Field::properties(
                    "Properties",
                    "properties",
                    |o: &Object| &o.properties,
                    |o: &mut Object| &mut o.properties,
                ),
                Field::entities(
                    "Related_Object",
                    "related_objects",
                    |o: &Object| &o.related_objects,
                    |o: &mut Object| &mut o.related_objects,
                )
                .within("Related_Objects"),
            ]
        });
        &FIELDS
    }

    fn from_binding(node: &BindingNode, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let mut object: Self = decode_binding_fields(node, cx)?;
        object.adopt_properties();
        Ok(object)
    }

    fn from_mapping(value: &Value, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let Value::Object(map) = value else {
            return Err(DecodeError::UnexpectedShape {
                field: "object",
                expected: "mapping",
            });
        };
        let mut object: Self = decode_mapping_fields(map, cx)?;
        object.adopt_properties();
        Ok(object)
    }
}

/// An Object related to another by a named relationship.
///
/// Carries its own relations, so chains of embedded Objects keep every link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedObject {
    pub id: Option<String>,
    pub idref: Option<String>,
    pub properties: Option<Box<dyn ObjectProperties>>,
    pub related_objects: Vec<RelatedObject>,
    pub relationship: Option<String>,
}

impl RelatedObject {
    /// Embed `properties` under the identifier of its wrapper, keeping the
    /// wrapper's own relations.
    #[must_use]
    pub fn inline(properties: Box<dyn ObjectProperties>, relationship: impl Into<String>) -> Self {
        Self::from_object(Object::wrap(properties), relationship)
    }

    /// Relate a whole Object, keeping its id, idref and relations.
    #[must_use]
    pub fn from_object(object: Object, relationship: impl Into<String>) -> Self {
        Self {
            id: object.id,
            idref: object.idref,
            properties: object.properties,
            related_objects: object.related_objects,
            relationship: Some(relationship.into()),
        }
    }

    /// Point at another Object by id.
    #[must_use]
    pub fn reference(idref: Option<String>, relationship: impl Into<String>) -> Self {
        Self {
            idref,
            relationship: Some(relationship.into()),
            ..Self::default()
        }
    }

    pub fn add_related_inline(&mut self, related: Box<dyn ObjectProperties>, relationship: &str) {
        self.related_objects.push(Self::inline(related, relationship));
    }

    pub fn add_related_ref(&mut self, related: &mut dyn ObjectProperties, relationship: &str) {
        self.related_objects.push(Self::reference(related.wrapper_id(), relationship));
    }

    fn adopt_properties(&mut self) {
        if let Some(properties) = self.properties.as_mut() {
            properties.base_mut().adopt(self.id.clone());
        }
    }
}

impl Entity for RelatedObject {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<RelatedObject>>> = LazyLock::new(|| {
            vec![
                Field::attribute("id", "id", |o: &RelatedObject| &o.id, |o: &mut RelatedObject| {
                    &mut o.id
                }),
                Field::attribute(
                    "idref",
                    "idref",
                    |o: &RelatedObject| &o.idref,
                    |o: &mut RelatedObject| &mut o.idref,
                ),
                Field::properties(
                    "Properties",
                    "properties",
                    |o: &RelatedObject| &o.properties,
                    |o: &mut RelatedObject| &mut o.properties,
                ),
                Field::entities(
                    "Related_Object",
                    "related_objects",
                    |o: &RelatedObject| &o.related_objects,
                    |o: &mut RelatedObject| &mut o.related_objects,
                )
                .within("Related_Objects"),
                Field::scalar(
                    "Relationship",
                    "relationship",
                    |o: &RelatedObject| &o.relationship,
                    |o: &mut RelatedObject| &mut o.relationship,
                ),
            ]
        });
        &FIELDS
    }

    fn from_binding(node: &BindingNode, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let mut related: Self = decode_binding_fields(node, cx)?;
        related.adopt_properties();
        Ok(related)
    }

    fn from_mapping(value: &Value, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let Value::Object(map) = value else {
            return Err(DecodeError::UnexpectedShape {
                field: "related_object",
                expected: "mapping",
            });
        };
        let mut related: Self = decode_mapping_fields(map, cx)?;
        related.adopt_properties();
        Ok(related)
    }
}
