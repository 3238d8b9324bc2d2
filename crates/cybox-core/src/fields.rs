//! Table-driven encode/decode shared by every entity.
//!
//! Each entity type declares an ordered, static table of [`Field`]s. A field
//! couples its descriptor ([`FieldMeta`]: binding name, mapping key, value
//! kind, placement, cardinality) with typed accessors into the entity. The
//! generic walkers below visit the table in order, so one implementation
//! serves every entity shape.
//!
//! ```
//! use std::sync::LazyLock;
//! use cybox_core::{Entity, Field};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Packer {
//!     name: Option<String>,
//!     version: Option<String>,
//! }
//!
//! impl Entity for Packer {
//!     fn fields() -> &'static [Field<Self>] {
//!         static FIELDS: LazyLock<Vec<Field<Packer>>> = LazyLock::new(|| {
//!             vec![
//!                 Field::scalar("Name", "name", |p: &Packer| &p.name, |p: &mut Packer| &mut p.name),
//!                 Field::scalar("Version", "version", |p: &Packer| &p.version, |p: &mut Packer| &mut p.version),
//!             ]
//!         });
//!         &FIELDS
//!     }
//! }
//!
//! let packer = Packer { name: Some("UPX".into()), version: None };
//! let node = packer.to_binding("Packer");
//! assert_eq!(node.child("Name").and_then(|n| n.text()), Some("UPX"));
//! assert!(node.child("Version").is_none());
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::binding::BindingNode;
use crate::error::{ContractError, DecodeError};
use crate::properties::{ObjectProperties, PropertiesCodec};
use crate::registry::DecodeContext;
use crate::scalar::{ScalarValue, ValueKind};

/// Where a field lives inside its owner's binding node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// One child element per value.
    Element,
    /// An entry in the owner's attribute map.
    Attribute,
    /// The owner's own text content.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

/// Static description of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Element or attribute name in the binding tree.
    pub name: &'static str,
    /// Key in the mapping representation.
    pub key: &'static str,
    pub kind: ValueKind,
    pub placement: Placement,
    pub cardinality: Cardinality,
    /// Container element for repeated fields, e.g. `Packer_List`.
    pub wrapper: Option<&'static str>,
}

impl FieldMeta {
    #[must_use]
    pub const fn new(
        name: &'static str,
        key: &'static str,
        kind: ValueKind,
        placement: Placement,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name,
            key,
            kind,
            placement,
            cardinality,
            wrapper: None,
        }
    }

    /// Name used in error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.placement {
            Placement::Text => self.key,
            Placement::Element | Placement::Attribute => self.name,
        }
    }

    const fn missing(&self) -> Result<(), DecodeError> {
        match self.cardinality {
            Cardinality::Required => Err(DecodeError::MissingField {
                field: self.label(),
            }),
            Cardinality::Optional | Cardinality::Repeated => Ok(()),
        }
    }
}

/// Encode/decode behaviour of one field against its owning entity.
///
/// The built-in slots cover optional, required, guarded and repeated fields;
/// entities with an unusual shape can supply their own via [`Field::custom`].
pub trait Slot<E> {
    fn encode_binding(&self, entity: &E, meta: &FieldMeta, node: &mut BindingNode);

    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the field's slot is malformed.
    fn decode_binding(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        node: &BindingNode,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>;

    fn encode_mapping(&self, entity: &E, meta: &FieldMeta, map: &mut Map<String, Value>);

    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the field's value is malformed.
    fn decode_mapping(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        map: &Map<String, Value>,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>;
}

/// One entry of an entity's field table.
pub struct Field<E> {
    meta: FieldMeta,
    slot: Box<dyn Slot<E> + Send + Sync>,
}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("meta", &self.meta).finish_non_exhaustive()
    }
}

impl<E> Field<E> {
    #[must_use]
    pub const fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    /// Nest the repeated elements inside a container element.
    #[must_use]
    pub const fn within(mut self, wrapper: &'static str) -> Self {
        self.meta.wrapper = Some(wrapper);
        self
    }
}

impl<E: 'static> Field<E> {
    pub fn custom(meta: FieldMeta, slot: impl Slot<E> + Send + Sync + 'static) -> Self {
        Self {
            meta,
            slot: Box::new(slot),
        }
    }

    /// Optional scalar held in the owner's attribute map.
    pub fn attribute<T: ScalarValue>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, T::KIND, Placement::Attribute, Cardinality::Optional),
            Inline {
                access: Access::Optional { get, get_mut },
            },
        )
    }

    pub fn required_attribute<T: ScalarValue>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, T::KIND, Placement::Attribute, Cardinality::Required),
            Inline {
                access: Access::Required { get, get_mut },
            },
        )
    }

    /// Optional scalar held as the owner's own text content.
    pub fn text<T: ScalarValue>(
        key: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self {
        Self::custom(
            FieldMeta::new("", key, T::KIND, Placement::Text, Cardinality::Optional),
            Inline {
                access: Access::Optional { get, get_mut },
            },
        )
    }

    /// Optional scalar held in a child element.
    pub fn scalar<T: ScalarValue>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, T::KIND, Placement::Element, Cardinality::Optional),
            Element::<E, T, ScalarCodec> {
                access: Access::Optional { get, get_mut },
                codec: PhantomData,
            },
        )
    }

    /// Zero or more scalar child elements.
    pub fn scalars<T: ScalarValue>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &Vec<T>,
        get_mut: fn(&mut E) -> &mut Vec<T>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, T::KIND, Placement::Element, Cardinality::Repeated),
            Repeated::<E, T, ScalarCodec> {
                get,
                get_mut,
                codec: PhantomData,
            },
        )
    }

    /// Optional nested entity.
    pub fn entity<T: Entity>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, ValueKind::Entity, Placement::Element, Cardinality::Optional),
            Element::<E, T, EntityCodec> {
                access: Access::Optional { get, get_mut },
                codec: PhantomData,
            },
        )
    }

    /// Optional nested entity whose setter enforces an invariant.
    ///
    /// A rejected assignment during decode surfaces as
    /// [`DecodeError::Contract`].
    pub fn guarded_entity<T: Entity>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> Option<&T>,
        set: fn(&mut E, T) -> Result<(), ContractError>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, ValueKind::Entity, Placement::Element, Cardinality::Optional),
            Element::<E, T, EntityCodec> {
                access: Access::Guarded { get, set },
                codec: PhantomData,
            },
        )
    }

    /// Zero or more nested entities, order preserved.
    pub fn entities<T: Entity>(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &Vec<T>,
        get_mut: fn(&mut E) -> &mut Vec<T>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, ValueKind::Entity, Placement::Element, Cardinality::Repeated),
            Repeated::<E, T, EntityCodec> {
                get,
                get_mut,
                codec: PhantomData,
            },
        )
    }

    /// Optional polymorphic payload resolved through the type registry.
    pub fn properties(
        name: &'static str,
        key: &'static str,
        get: fn(&E) -> &Option<Box<dyn ObjectProperties>>,
        get_mut: fn(&mut E) -> &mut Option<Box<dyn ObjectProperties>>,
    ) -> Self {
        Self::custom(
            FieldMeta::new(name, key, ValueKind::Polymorphic, Placement::Element, Cardinality::Optional),
            Element::<E, Box<dyn ObjectProperties>, PropertiesCodec> {
                access: Access::Optional { get, get_mut },
                codec: PhantomData,
            },
        )
    }
}

/// An entity with a fixed field table.
///
/// The provided methods run the generic walkers over [`Entity::fields`].
/// Entities with a simple-content shape override the mapping methods.
pub trait Entity: Default + Sized + 'static {
    fn fields() -> &'static [Field<Self>];

    fn to_binding(&self, tag: &str) -> BindingNode {
        let mut node = BindingNode::new(tag);
        encode_binding_fields(self, &mut node);
        node
    }

    /// # Errors
    ///
    /// Returns a [`DecodeError`] when any field is malformed.
    fn from_binding(node: &BindingNode, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        decode_binding_fields(node, cx)
    }

    fn to_mapping(&self) -> Value {
        let mut map = Map::new();
        encode_mapping_fields(self, &mut map);
        Value::Object(map)
    }

    /// # Errors
    ///
    /// Returns a [`DecodeError`] when `value` is not a mapping or any field is
    /// malformed.
    fn from_mapping(value: &Value, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        match value {
            Value::Object(map) => decode_mapping_fields(map, cx),
            _ => Err(DecodeError::UnexpectedShape {
                field: std::any::type_name::<Self>(),
                expected: "mapping",
            }),
        }
    }
}

/// Append every present field of `entity` to `node`, in table order.
pub fn encode_binding_fields<E: Entity>(entity: &E, node: &mut BindingNode) {
    for field in E::fields() {
        field.slot.encode_binding(entity, &field.meta, node);
    }
}

/// Build an entity from `node`, leaving absent optional fields unset.
///
/// # Errors
///
/// Returns the first [`DecodeError`] raised by a field.
pub fn decode_binding_fields<E: Entity>(
    node: &BindingNode,
    cx: &DecodeContext<'_>,
) -> Result<E, DecodeError> {
    let mut entity = E::default();
    for field in E::fields() {
        field.slot.decode_binding(&mut entity, &field.meta, node, cx)?;
    }
    Ok(entity)
}

pub fn encode_mapping_fields<E: Entity>(entity: &E, map: &mut Map<String, Value>) {
    for field in E::fields() {
        field.slot.encode_mapping(entity, &field.meta, map);
    }
}

/// # Errors
///
/// Returns the first [`DecodeError`] raised by a field.
pub fn decode_mapping_fields<E: Entity>(
    map: &Map<String, Value>,
    cx: &DecodeContext<'_>,
) -> Result<E, DecodeError> {
    let mut entity = E::default();
    for field in E::fields() {
        field.slot.decode_mapping(&mut entity, &field.meta, map, cx)?;
    }
    Ok(entity)
}

/// Decode an entity that may be absent. An absent node is not an error.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the node is present but malformed.
pub fn decode_optional<E: Entity>(
    node: Option<&BindingNode>,
    cx: &DecodeContext<'_>,
) -> Result<Option<E>, DecodeError> {
    node.map(|node| E::from_binding(node, cx)).transpose()
}

/// Decode an entity from a mapping value that may be absent or `null`.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the value is present but malformed.
pub fn decode_optional_mapping<E: Entity>(
    value: Option<&Value>,
    cx: &DecodeContext<'_>,
) -> Result<Option<E>, DecodeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => E::from_mapping(value, cx).map(Some),
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

enum Access<E, T> {
    Optional {
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    },
    Required {
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    },
    Guarded {
        get: fn(&E) -> Option<&T>,
        set: fn(&mut E, T) -> Result<(), ContractError>,
    },
}

impl<E, T> Access<E, T> {
    fn get<'a>(&self, entity: &'a E) -> Option<&'a T> {
        match self {
            Self::Optional { get, .. } => get(entity).as_ref(),
            Self::Required { get, .. } => Some(get(entity)),
            Self::Guarded { get, .. } => get(entity),
        }
    }

    fn set(&self, entity: &mut E, value: T) -> Result<(), DecodeError> {
        match self {
            Self::Optional { get_mut, .. } => {
                *get_mut(entity) = Some(value);
                Ok(())
            }
            Self::Required { get_mut, .. } => {
                *get_mut(entity) = value;
                Ok(())
            }
            Self::Guarded { set, .. } => set(entity, value).map_err(DecodeError::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Value codecs
// ---------------------------------------------------------------------------

/// Element-level conversion for one value type.
pub trait Codec<T>: 'static {
    fn to_node(value: &T, tag: &str) -> BindingNode;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] when `node` cannot be read as `T`.
    fn from_node(node: &BindingNode, field: &'static str, cx: &DecodeContext<'_>)
    -> Result<T, DecodeError>;

    fn to_value(value: &T) -> Value;

    /// # Errors
    ///
    /// Returns a [`DecodeError`] when `value` cannot be read as `T`.
    fn from_value(value: &Value, field: &'static str, cx: &DecodeContext<'_>)
    -> Result<T, DecodeError>;

    /// An encoded node that carries nothing and decodes as unset.
    fn is_vacant_node(_node: &BindingNode) -> bool {
        false
    }

    /// An encoded value that carries nothing and decodes as unset.
    fn is_vacant_value(_value: &Value) -> bool {
        false
    }
}

/// Scalars held as element text.
pub struct ScalarCodec;

impl<T: ScalarValue> Codec<T> for ScalarCodec {
    fn to_node(value: &T, tag: &str) -> BindingNode {
        BindingNode::with_text(tag, value.to_text())
    }

    fn from_node(
        node: &BindingNode,
        field: &'static str,
        _cx: &DecodeContext<'_>,
    ) -> Result<T, DecodeError> {
        T::from_text(node.text().unwrap_or_default()).map_err(|e| e.in_field(field))
    }

    fn to_value(value: &T) -> Value {
        value.to_value()
    }

    fn from_value(
        value: &Value,
        field: &'static str,
        _cx: &DecodeContext<'_>,
    ) -> Result<T, DecodeError> {
        T::from_value(value).map_err(|e| e.in_field(field))
    }
}

/// Nested entities, recursing into their own field tables.
pub struct EntityCodec;

impl<T: Entity> Codec<T> for EntityCodec {
    fn to_node(value: &T, tag: &str) -> BindingNode {
        value.to_binding(tag)
    }

    fn from_node(
        node: &BindingNode,
        _field: &'static str,
        cx: &DecodeContext<'_>,
    ) -> Result<T, DecodeError> {
        T::from_binding(node, cx)
    }

    fn to_value(value: &T) -> Value {
        value.to_mapping()
    }

    fn from_value(
        value: &Value,
        _field: &'static str,
        cx: &DecodeContext<'_>,
    ) -> Result<T, DecodeError> {
        T::from_mapping(value, cx)
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// A single scalar stored as an attribute or as text content.
struct Inline<E, T> {
    access: Access<E, T>,
}

impl<E, T: ScalarValue> Slot<E> for Inline<E, T> {
    fn encode_binding(&self, entity: &E, meta: &FieldMeta, node: &mut BindingNode) {
        let Some(value) = self.access.get(entity) else {
            return;
        };
        match meta.placement {
            Placement::Text => node.set_text(value.to_text()),
            Placement::Attribute | Placement::Element => node.set_attr(meta.name, value.to_text()),
        }
    }

    fn decode_binding(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        node: &BindingNode,
        _cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        let text = match meta.placement {
            Placement::Text => node.text(),
            Placement::Attribute | Placement::Element => node.attr(meta.name),
        };
        match text {
            Some(text) => {
                let value = T::from_text(text).map_err(|e| e.in_field(meta.label()))?;
                self.access.set(entity, value)
            }
            None => meta.missing(),
        }
    }

    fn encode_mapping(&self, entity: &E, meta: &FieldMeta, map: &mut Map<String, Value>) {
        if let Some(value) = self.access.get(entity) {
            map.insert(meta.key.to_owned(), value.to_value());
        }
    }

    fn decode_mapping(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        map: &Map<String, Value>,
        _cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match map.get(meta.key) {
            None | Some(Value::Null) => meta.missing(),
            Some(value) => {
                let value = T::from_value(value).map_err(|e| e.in_field(meta.key))?;
                self.access.set(entity, value)
            }
        }
    }
}

/// A single value stored as one child element.
struct Element<E, T, C> {
    access: Access<E, T>,
    codec: PhantomData<fn() -> C>,
}

impl<E, T, C: Codec<T>> Slot<E> for Element<E, T, C> {
    fn encode_binding(&self, entity: &E, meta: &FieldMeta, node: &mut BindingNode) {
        if let Some(value) = self.access.get(entity) {
            node.push(C::to_node(value, meta.name));
        }
    }

    fn decode_binding(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        node: &BindingNode,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match node.child(meta.name) {
            Some(child) if !C::is_vacant_node(child) => {
                let value = C::from_node(child, meta.name, cx)?;
                self.access.set(entity, value)
            }
            _ => meta.missing(),
        }
    }

    fn encode_mapping(&self, entity: &E, meta: &FieldMeta, map: &mut Map<String, Value>) {
        if let Some(value) = self.access.get(entity) {
            map.insert(meta.key.to_owned(), C::to_value(value));
        }
    }

    fn decode_mapping(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        map: &Map<String, Value>,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match map.get(meta.key) {
            Some(value) if !value.is_null() && !C::is_vacant_value(value) => {
                let value = C::from_value(value, meta.key, cx)?;
                self.access.set(entity, value)
            }
            _ => meta.missing(),
        }
    }
}

/// Zero or more values, one child element each, optionally wrapped.
struct Repeated<E, T, C> {
    get: fn(&E) -> &Vec<T>,
    get_mut: fn(&mut E) -> &mut Vec<T>,
    codec: PhantomData<fn() -> C>,
}

impl<E, T, C: Codec<T>> Slot<E> for Repeated<E, T, C> {
    fn encode_binding(&self, entity: &E, meta: &FieldMeta, node: &mut BindingNode) {
        let items = (self.get)(entity);
        if items.is_empty() {
            return;
        }
        let encoded = items.iter().map(|item| C::to_node(item, meta.name));
        match meta.wrapper {
            Some(wrapper) => {
                let mut list = BindingNode::new(wrapper);
                list.children.extend(encoded);
                node.push(list);
            }
            None => node.children.extend(encoded),
        }
    }

    fn decode_binding(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        node: &BindingNode,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        let container = match meta.wrapper {
            Some(wrapper) => match node.child(wrapper) {
                Some(list) => list,
                None => return Ok(()),
            },
            None => node,
        };
        let items = container
            .children_named(meta.name)
            .map(|child| C::from_node(child, meta.name, cx))
            .collect::<Result<Vec<_>, _>>()?;
        *(self.get_mut)(entity) = items;
        Ok(())
    }

    fn encode_mapping(&self, entity: &E, meta: &FieldMeta, map: &mut Map<String, Value>) {
        let items = (self.get)(entity);
        if !items.is_empty() {
            let values = items.iter().map(|item| C::to_value(item)).collect();
            map.insert(meta.key.to_owned(), Value::Array(values));
        }
    }

    fn decode_mapping(
        &self,
        entity: &mut E,
        meta: &FieldMeta,
        map: &Map<String, Value>,
        cx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        match map.get(meta.key) {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Array(values)) => {
                let items = values
                    .iter()
                    .map(|value| C::from_value(value, meta.key, cx))
                    .collect::<Result<Vec<_>, _>>()?;
                *(self.get_mut)(entity) = items;
                Ok(())
            }
            Some(_) => Err(DecodeError::UnexpectedShape {
                field: meta.key,
                expected: "list",
            }),
        }
    }
}
