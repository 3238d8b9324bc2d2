//! Discriminator-to-type registry for Object Properties payloads.
//!
//! Each payload type is registered under its bare `xsi:type` name. Lookups
//! accept either the bare name or the namespace-qualified form
//! (`FileObj:FileObjectType`), which is how the binding tree carries it.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::binding::BindingNode;
use crate::error::{DecodeError, RegistryError};
use crate::properties::{ObjectProperties, PropertiesType};

pub type BindingDecoder =
    fn(&BindingNode, &DecodeContext<'_>) -> Result<Box<dyn ObjectProperties>, DecodeError>;

pub type MappingDecoder =
    fn(&Value, &DecodeContext<'_>) -> Result<Box<dyn ObjectProperties>, DecodeError>;

/// What to do when a second type claims a registered discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail with [`RegistryError::Collision`].
    #[default]
    Reject,
    /// Replace the earlier registration and log a warning.
    Replace,
    /// Keep the earlier registration silently.
    KeepExisting,
}

/// One registered payload type.
#[derive(Clone, Copy)]
pub struct TypeEntry {
    pub xsi_ns: &'static str,
    pub xsi_type: &'static str,
    pub namespace: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    decode_binding: BindingDecoder,
    decode_mapping: MappingDecoder,
}

impl TypeEntry {
    #[must_use]
    pub fn of<T: PropertiesType>() -> Self {
        Self {
            xsi_ns: T::XSI_NS,
            xsi_type: T::XSI_TYPE,
            namespace: T::NAMESPACE,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            decode_binding: |node, cx| Ok(Box::new(T::from_binding(node, cx)?)),
            decode_mapping: |value, cx| Ok(Box::new(T::from_mapping(value, cx)?)),
        }
    }

    /// Namespace-qualified discriminator, e.g. `FileObj:FileObjectType`.
    #[must_use]
    pub fn discriminator(&self) -> String {
        format!("{}:{}", self.xsi_ns, self.xsi_type)
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// # Errors
    ///
    /// Propagates the payload type's own decode errors.
    pub fn decode_binding(
        &self,
        node: &BindingNode,
        cx: &DecodeContext<'_>,
    ) -> Result<Box<dyn ObjectProperties>, DecodeError> {
        (self.decode_binding)(node, cx)
    }

    /// # Errors
    ///
    /// Propagates the payload type's own decode errors.
    pub fn decode_mapping(
        &self,
        value: &Value,
        cx: &DecodeContext<'_>,
    ) -> Result<Box<dyn ObjectProperties>, DecodeError> {
        (self.decode_mapping)(value, cx)
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("xsi_ns", &self.xsi_ns)
            .field("xsi_type", &self.xsi_type)
            .field("namespace", &self.namespace)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Registry of payload types keyed by bare discriminator.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: HashMap<&'static str, TypeEntry>,
    policy: CollisionPolicy,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Register `T` under its discriminator.
    ///
    /// Registering the same type twice is a no-op. A different type claiming
    /// the same discriminator is handled according to the registry's
    /// [`CollisionPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Collision`] under [`CollisionPolicy::Reject`].
    pub fn register<T: PropertiesType>(&mut self) -> Result<(), RegistryError> {
        self.insert(TypeEntry::of::<T>())
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::Collision`] under [`CollisionPolicy::Reject`].
    pub fn insert(&mut self, entry: TypeEntry) -> Result<(), RegistryError> {
        if let Some(existing) = self.entries.get(entry.xsi_type) {
            if existing.type_id == entry.type_id {
                return Ok(());
            }
            match self.policy {
                CollisionPolicy::Reject => {
                    return Err(RegistryError::Collision {
                        discriminator: entry.discriminator(),
                    });
                }
                CollisionPolicy::KeepExisting => return Ok(()),
                CollisionPolicy::Replace => {
                    warn!(
                        discriminator = %entry.discriminator(),
                        previous = existing.type_name,
                        replacement = entry.type_name,
                        "replacing registered payload type"
                    );
                }
            }
        }

        debug!(discriminator = %entry.discriminator(), type_name = entry.type_name, "registered payload type");
        self.entries.insert(entry.xsi_type, entry);
        Ok(())
    }

    /// Look up a type by bare or namespace-qualified discriminator.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownType`] when nothing is registered
    /// under the discriminator.
    pub fn resolve(&self, discriminator: &str) -> Result<&TypeEntry, RegistryError> {
        self.entries
            .get(bare_type(discriminator))
            .ok_or_else(|| RegistryError::UnknownType(discriminator.to_owned()))
    }

    #[must_use]
    pub fn contains(&self, discriminator: &str) -> bool {
        self.entries.contains_key(bare_type(discriminator))
    }

    /// Registered discriminators, sorted.
    #[must_use]
    pub fn discriminators(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.values().map(TypeEntry::discriminator).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip a namespace prefix: `FileObj:FileObjectType` becomes
/// `FileObjectType`.
#[must_use]
pub fn bare_type(discriminator: &str) -> &str {
    discriminator
        .rsplit_once(':')
        .map_or(discriminator, |(_, name)| name)
}

/// Decoding state threaded through every decoder.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> DecodeContext<'r> {
    #[must_use]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::fields::{Entity, Field};
    use crate::properties::PropertiesBase;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Widget {
        base: PropertiesBase,
        label: Option<String>,
    }

    impl Entity for Widget {
        fn fields() -> &'static [Field<Self>] {
            static FIELDS: LazyLock<Vec<Field<Widget>>> = LazyLock::new(|| {
                vec![Field::scalar("Label", "label", |w: &Widget| &w.label, |w: &mut Widget| {
                    &mut w.label
                })]
            });
            &FIELDS
        }
    }

    impl PropertiesType for Widget {
        const XSI_NS: &'static str = "WidgetObj";
        const XSI_TYPE: &'static str = "WidgetObjectType";
        const NAMESPACE: &'static str = "urn:test:widget";

        fn properties_base(&self) -> &PropertiesBase {
            &self.base
        }

        fn properties_base_mut(&mut self) -> &mut PropertiesBase {
            &mut self.base
        }
    }

    /// Same discriminator, different Rust type.
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Impostor {
        base: PropertiesBase,
    }

    impl Entity for Impostor {
        fn fields() -> &'static [Field<Self>] {
            &[]
        }
    }

    impl PropertiesType for Impostor {
        const XSI_NS: &'static str = "WidgetObj";
        const XSI_TYPE: &'static str = "WidgetObjectType";
        const NAMESPACE: &'static str = "urn:test:impostor";

        fn properties_base(&self) -> &PropertiesBase {
            &self.base
        }

        fn properties_base_mut(&mut self) -> &mut PropertiesBase {
            &mut self.base
        }
    }

    #[rstest]
    #[case("WidgetObj:WidgetObjectType")]
    #[case("WidgetObjectType")]
    fn resolves_bare_and_qualified_names(#[case] discriminator: &str) {
        let mut registry = TypeRegistry::new();
        registry.register::<Widget>().unwrap();
        let entry = registry.resolve(discriminator).unwrap();
        assert_eq!(entry.namespace, "urn:test:widget");
    }

    #[test]
    fn unknown_discriminator_is_an_error() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.resolve("Bogus:Type").unwrap_err(),
            RegistryError::UnknownType("Bogus:Type".into())
        );
    }

    #[test]
    fn registering_same_type_twice_is_idempotent() {
        let mut registry = TypeRegistry::new();
        registry.register::<Widget>().unwrap();
        registry.register::<Widget>().unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn collision_is_rejected_by_default() {
        let mut registry = TypeRegistry::new();
        registry.register::<Widget>().unwrap();
        let err = registry.register::<Impostor>().unwrap_err();
        assert_eq!(
            err,
            RegistryError::Collision {
                discriminator: "WidgetObj:WidgetObjectType".into()
            }
        );
    }

    #[rstest]
    #[case(CollisionPolicy::Replace, "urn:test:impostor")]
    #[case(CollisionPolicy::KeepExisting, "urn:test:widget")]
    fn collision_policy_decides_winner(#[case] policy: CollisionPolicy, #[case] namespace: &str) {
        let mut registry = TypeRegistry::with_policy(policy);
        registry.register::<Widget>().unwrap();
        registry.register::<Impostor>().unwrap();
        assert_eq!(registry.resolve("WidgetObjectType").unwrap().namespace, namespace);
    }

    #[test]
    fn discriminators_are_sorted_and_qualified() {
        let mut registry = TypeRegistry::new();
        registry.register::<Widget>().unwrap();
        assert_eq!(registry.discriminators(), vec!["WidgetObj:WidgetObjectType"]);
        assert!(registry.contains("WidgetObj:WidgetObjectType"));
        assert!(!registry.is_empty());
    }
}
