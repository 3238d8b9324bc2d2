//! Object Properties: the polymorphic payload of an [`Object`].
//!
//! Concrete payload types implement [`PropertiesType`] (static discriminator
//! plus field table). Everything else works against the object-safe
//! [`ObjectProperties`] view, which a blanket impl provides for every
//! `PropertiesType`.
//!
//! A payload created standalone has no wrapping [`Object`]. The first call to
//! [`ObjectProperties::parent`] builds one with a fresh identifier; later
//! calls return the same wrapper. [`Object::wrap`] adopts that wrapper when
//! the payload is attached. From then on the payload only records its
//! owner's id: `parent` and the payload-level relation helpers refuse with
//! [`ContractError::AlreadyWrapped`], and relations go through the owning
//! [`Object`] instead.

use std::any::Any;
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::binding::BindingNode;
use crate::error::{ContractError, DecodeError};
use crate::fields::{Codec, Entity};
use crate::ids;
use crate::object::Object;
use crate::registry::DecodeContext;

/// Attribute and mapping key carrying a payload's object reference.
pub const OBJECT_REFERENCE: &str = "object_reference";

/// Mapping key carrying the bare discriminator.
pub const XSI_TYPE_KEY: &str = "xsi:type";

/// State shared by every payload type.
#[derive(Debug, Clone, Default)]
pub struct PropertiesBase {
    pub object_reference: Option<String>,
    parent: Option<Object>,
    owner: Option<Owner>,
}

/// The Object a payload has been placed in.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Owner {
    id: Option<String>,
}

impl PropertiesBase {
    /// The wrapper built by [`ObjectProperties::parent`], if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&Object> {
        self.parent.as_ref()
    }

    pub fn take_parent(&mut self) -> Option<Object> {
        self.parent.take()
    }

    /// Whether the payload sits inside an Object.
    #[must_use]
    pub const fn is_wrapped(&self) -> bool {
        self.owner.is_some()
    }

    /// Id of the Object holding the payload.
    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner.as_ref().and_then(|owner| owner.id.as_deref())
    }

    /// Record that the payload now lives in the Object identified by `id`.
    pub fn adopt(&mut self, id: Option<String>) {
        self.parent = None;
        self.owner = Some(Owner { id });
    }
}

// Ownership is placement bookkeeping and does not take part in equality.
impl PartialEq for PropertiesBase {
    fn eq(&self, other: &Self) -> bool {
        self.object_reference == other.object_reference && self.parent == other.parent
    }
}

/// A concrete payload type.
pub trait PropertiesType: Entity + Clone + PartialEq + fmt::Debug + Send + Sync {
    /// Namespace prefix of the discriminator, e.g. `FileObj`.
    const XSI_NS: &'static str;
    /// Bare discriminator, e.g. `FileObjectType`.
    const XSI_TYPE: &'static str;
    /// Schema namespace URI.
    const NAMESPACE: &'static str;

    fn properties_base(&self) -> &PropertiesBase;
    fn properties_base_mut(&mut self) -> &mut PropertiesBase;
}

/// Object-safe view of a payload.
pub trait ObjectProperties: fmt::Debug + Send + Sync + Any {
    fn xsi_ns(&self) -> &'static str;
    fn xsi_type(&self) -> &'static str;
    fn namespace(&self) -> &'static str;
    fn base(&self) -> &PropertiesBase;
    fn base_mut(&mut self) -> &mut PropertiesBase;

    /// Encode the payload's own fields under `tag`.
    fn encode_binding(&self, tag: &str) -> BindingNode;
    fn encode_mapping(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_box(&self) -> Box<dyn ObjectProperties>;
    fn eq_dyn(&self, other: &dyn ObjectProperties) -> bool;

    fn discriminator(&self) -> String {
        format!("{}:{}", self.xsi_ns(), self.xsi_type())
    }

    /// Identifier prefix for a generated wrapper: `FileObjectType` gives
    /// `File`.
    fn id_prefix(&self) -> &'static str {
        let name = self.xsi_type();
        name.strip_suffix("ObjectType").unwrap_or(name)
    }

    fn object_reference(&self) -> Option<&str> {
        self.base().object_reference.as_deref()
    }

    fn set_object_reference(&mut self, reference: Option<String>) {
        self.base_mut().object_reference = reference;
    }

    fn has_parent(&self) -> bool {
        self.base().parent.is_some()
    }

    fn is_wrapped(&self) -> bool {
        self.base().is_wrapped()
    }

    /// The wrapping Object, created on first access.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::AlreadyWrapped`] once the payload has been
    /// placed in an Object; use that Object directly.
    fn parent(&mut self) -> Result<&mut Object, ContractError> {
        if let Some(owner) = &self.base().owner {
            return Err(ContractError::AlreadyWrapped {
                owner: owner.id.clone(),
            });
        }
        let prefix = self.id_prefix();
        Ok(self
            .base_mut()
            .parent
            .get_or_insert_with(|| Object::with_id(ids::create_id(prefix))))
    }

    /// Replace the lazily built wrapper of a standalone payload.
    ///
    /// # Errors
    ///
    /// As [`ObjectProperties::parent`].
    fn set_parent(&mut self, parent: Object) -> Result<(), ContractError> {
        *self.parent()? = parent;
        Ok(())
    }

    /// Id of the Object this payload belongs to, building the lazy wrapper
    /// for a standalone payload.
    fn wrapper_id(&mut self) -> Option<String> {
        if let Some(owner) = &self.base().owner {
            return owner.id.clone();
        }
        self.parent().ok().and_then(|parent| parent.id.clone())
    }

    /// Relate `related` to this payload by embedding it.
    ///
    /// # Errors
    ///
    /// As [`ObjectProperties::parent`].
    fn add_related_inline(
        &mut self,
        related: Box<dyn ObjectProperties>,
        relationship: &str,
    ) -> Result<(), ContractError> {
        self.parent()?.add_related_inline(related, relationship);
        Ok(())
    }

    /// Relate `related` to this payload by reference to its wrapper's id.
    ///
    /// # Errors
    ///
    /// As [`ObjectProperties::parent`].
    fn add_related_ref(
        &mut self,
        related: &mut dyn ObjectProperties,
        relationship: &str,
    ) -> Result<(), ContractError> {
        self.parent()?.add_related_ref(related, relationship);
        Ok(())
    }
}

impl<T: PropertiesType> ObjectProperties for T {
    fn xsi_ns(&self) -> &'static str {
        T::XSI_NS
    }

    fn xsi_type(&self) -> &'static str {
        T::XSI_TYPE
    }

    fn namespace(&self) -> &'static str {
        T::NAMESPACE
    }

    fn base(&self) -> &PropertiesBase {
        self.properties_base()
    }

    fn base_mut(&mut self) -> &mut PropertiesBase {
        self.properties_base_mut()
    }

    fn encode_binding(&self, tag: &str) -> BindingNode {
        self.to_binding(tag)
    }

    fn encode_mapping(&self) -> Value {
        self.to_mapping()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ObjectProperties> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn ObjectProperties) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|other| other == self)
    }
}

impl dyn ObjectProperties {
    #[must_use]
    pub fn downcast_ref<T: PropertiesType>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: PropertiesType>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    #[must_use]
    pub fn is<T: PropertiesType>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl PartialEq for dyn ObjectProperties {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

impl Clone for Box<dyn ObjectProperties> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Encode a payload with its discriminator and object reference attached.
#[must_use]
pub fn encode_properties(props: &dyn ObjectProperties, tag: &str) -> BindingNode {
    let mut node = props.encode_binding(tag);
    node.set_xsi_type(props.discriminator());
    if let Some(reference) = props.object_reference() {
        node.set_attr(OBJECT_REFERENCE, reference);
    }
    node
}

/// Mapping form of a payload. The discriminator is stored bare.
#[must_use]
pub fn encode_properties_mapping(props: &dyn ObjectProperties) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(XSI_TYPE_KEY.to_owned(), Value::String(props.xsi_type().to_owned()));
    if let Some(reference) = props.object_reference() {
        map.insert(OBJECT_REFERENCE.to_owned(), Value::String(reference.to_owned()));
    }
    if let Value::Object(fields) = props.encode_mapping() {
        map.extend(fields);
    }
    map
}

/// Decode a payload, choosing its type from the `xsi:type` attribute.
///
/// # Errors
///
/// Returns [`DecodeError::MissingType`] when the attribute is absent,
/// [`DecodeError::UnknownType`] when the registry does not know it, and the
/// payload type's own errors otherwise.
pub fn decode_properties(
    node: &BindingNode,
    cx: &DecodeContext<'_>,
) -> Result<Box<dyn ObjectProperties>, DecodeError> {
    let discriminator = node.xsi_type().ok_or(DecodeError::MissingType)?;
    let entry = cx
        .registry()
        .resolve(discriminator)
        .map_err(|_| DecodeError::UnknownType(discriminator.to_owned()))?;
    debug!(discriminator, type_name = entry.type_name(), "decoding payload");

    let mut props = entry.decode_binding(node, cx)?;
    props.set_object_reference(node.attr(OBJECT_REFERENCE).map(str::to_owned));
    Ok(props)
}

/// # Errors
///
/// As [`decode_properties`]; additionally [`DecodeError::UnexpectedShape`]
/// when `value` is not a mapping.
pub fn decode_properties_mapping(
    value: &Value,
    cx: &DecodeContext<'_>,
) -> Result<Box<dyn ObjectProperties>, DecodeError> {
    let Value::Object(map) = value else {
        return Err(DecodeError::UnexpectedShape {
            field: "properties",
            expected: "mapping",
        });
    };
    let discriminator = map
        .get(XSI_TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;
    let entry = cx
        .registry()
        .resolve(discriminator)
        .map_err(|_| DecodeError::UnknownType(discriminator.to_owned()))?;
    debug!(discriminator, type_name = entry.type_name(), "decoding payload");

    let mut props = entry.decode_mapping(value, cx)?;
    let reference = map.get(OBJECT_REFERENCE).and_then(Value::as_str).map(str::to_owned);
    props.set_object_reference(reference);
    Ok(props)
}

/// Field codec routing through the dispatch functions above.
pub struct PropertiesCodec;

impl Codec<Box<dyn ObjectProperties>> for PropertiesCodec {
    fn to_node(value: &Box<dyn ObjectProperties>, tag: &str) -> BindingNode {
        encode_properties(value.as_ref(), tag)
    }

    fn from_node(
        node: &BindingNode,
        _field: &'static str,
        cx: &DecodeContext<'_>,
    ) -> Result<Box<dyn ObjectProperties>, DecodeError> {
        decode_properties(node, cx)
    }

    fn to_value(value: &Box<dyn ObjectProperties>) -> Value {
        Value::Object(encode_properties_mapping(value.as_ref()))
    }

    fn from_value(
        value: &Value,
        _field: &'static str,
        cx: &DecodeContext<'_>,
    ) -> Result<Box<dyn ObjectProperties>, DecodeError> {
        decode_properties_mapping(value, cx)
    }

    fn is_vacant_node(node: &BindingNode) -> bool {
        node.attributes.is_empty() && node.children.is_empty() && node.text.is_none()
    }

    fn is_vacant_value(value: &Value) -> bool {
        value.as_object().is_some_and(Map::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::binding::XSI_TYPE;
    use crate::fields::Field;
    use crate::registry::TypeRegistry;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Gadget {
        base: PropertiesBase,
        serial: Option<String>,
    }

    impl Entity for Gadget {
        fn fields() -> &'static [Field<Self>] {
            static FIELDS: LazyLock<Vec<Field<Gadget>>> = LazyLock::new(|| {
                vec![Field::scalar("Serial", "serial", |g: &Gadget| &g.serial, |g: &mut Gadget| {
                    &mut g.serial
                })]
            });
            &FIELDS
        }
    }

    impl PropertiesType for Gadget {
        const XSI_NS: &'static str = "GadgetObj";
        const XSI_TYPE: &'static str = "GadgetObjectType";
        const NAMESPACE: &'static str = "urn:test:gadget";

        fn properties_base(&self) -> &PropertiesBase {
            &self.base
        }

        fn properties_base_mut(&mut self) -> &mut PropertiesBase {
            &mut self.base
        }
    }

    fn gadget(serial: &str) -> Gadget {
        Gadget {
            serial: Some(serial.into()),
            ..Gadget::default()
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register::<Gadget>().unwrap();
        registry
    }

    #[test]
    fn binding_carries_qualified_type_and_reference() {
        let mut props = gadget("X1");
        props.base.object_reference = Some("example:Object-1".into());
        let node = encode_properties(&props, "Properties");
        assert_eq!(node.attr(XSI_TYPE), Some("GadgetObj:GadgetObjectType"));
        assert_eq!(node.attr(OBJECT_REFERENCE), Some("example:Object-1"));

        let registry = registry();
        let decoded = decode_properties(&node, &DecodeContext::new(&registry)).unwrap();
        assert_eq!(decoded.downcast_ref::<Gadget>(), Some(&props));
    }

    #[test]
    fn mapping_carries_bare_type() {
        let props = gadget("X2");
        let map = encode_properties_mapping(&props);
        assert_eq!(Value::Object(map.clone()), json!({"xsi:type": "GadgetObjectType", "serial": "X2"}));

        let registry = registry();
        let decoded = decode_properties_mapping(&Value::Object(map), &DecodeContext::new(&registry)).unwrap();
        assert!(decoded.is::<Gadget>());
        assert_eq!(decoded.downcast_ref::<Gadget>(), Some(&props));
    }

    #[test]
    fn missing_and_unknown_types_are_reported() {
        let registry = registry();
        let cx = DecodeContext::new(&registry);
        assert_eq!(
            decode_properties(&BindingNode::new("Properties"), &cx).unwrap_err(),
            DecodeError::MissingType
        );

        let mut node = BindingNode::new("Properties");
        node.set_xsi_type("Bogus:Type");
        assert_eq!(
            decode_properties(&node, &cx).unwrap_err(),
            DecodeError::UnknownType("Bogus:Type".into())
        );
        assert_eq!(
            decode_properties_mapping(&json!({"serial": "x"}), &cx).unwrap_err(),
            DecodeError::MissingType
        );
    }

    #[test]
    fn parent_is_created_once() {
        let mut props = gadget("X3");
        assert!(!props.has_parent());
        let first = props.parent().unwrap().id.clone();
        let second = props.parent().unwrap().id.clone();
        assert_eq!(first, second);
        assert!(first.unwrap().contains(":Gadget-"));
    }

    #[test]
    fn related_objects_attach_to_parent() {
        let mut source = gadget("S");
        let mut target = gadget("T");
        source.add_related_ref(&mut target, "Connected_To").unwrap();
        source
            .add_related_inline(Box::new(gadget("I")), "Contains")
            .unwrap();

        let target_id = target.parent().unwrap().id.clone();
        let related = &source.parent().unwrap().related_objects;
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].idref, target_id);
        assert_eq!(related[0].relationship.as_deref(), Some("Connected_To"));
        assert!(related[1].properties.is_some());
    }

    #[test]
    fn wrapped_payload_refuses_its_own_wrapper() {
        let object = Object::wrap(Box::new(gadget("W")));
        let mut props = object.properties.clone().unwrap();
        assert!(props.is_wrapped());
        assert_eq!(props.base().owner_id(), object.id.as_deref());
        assert_eq!(
            props.parent().unwrap_err(),
            ContractError::AlreadyWrapped {
                owner: object.id.clone()
            }
        );
        assert!(props.add_related_ref(&mut gadget("T"), "Connected_To").is_err());
        assert_eq!(props.wrapper_id(), object.id);
    }

    #[test]
    fn ownership_does_not_affect_equality() {
        let object = Object::wrap(Box::new(gadget("E")));
        let wrapped = object.properties().unwrap();
        let bare: Box<dyn ObjectProperties> = Box::new(gadget("E"));
        assert!(wrapped.eq_dyn(bare.as_ref()));
    }

    #[test]
    fn boxed_payloads_compare_by_value() {
        let a: Box<dyn ObjectProperties> = Box::new(gadget("same"));
        let b = a.clone();
        assert_eq!(&a, &b);
        let c: Box<dyn ObjectProperties> = Box::new(gadget("other"));
        assert!(a != c);
    }
}
