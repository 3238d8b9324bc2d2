//! Hostname Object (`HostnameObj:HostnameObjectType`).

use std::sync::LazyLock;

use cybox_core::{Entity, Field, PropertiesBase, PropertiesType, TextValue};

pub const NAMESPACE: &str = "http://cybox.mitre.org/objects#HostnameObject-1";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hostname {
    pub base: PropertiesBase,
    pub is_domain_name: Option<bool>,
    pub hostname_value: Option<TextValue>,
    pub naming_system: Vec<String>,
}

impl Hostname {
    #[must_use]
    pub fn new(value: impl Into<TextValue>) -> Self {
        Self {
            hostname_value: Some(value.into()),
            ..Self::default()
        }
    }
}

impl Entity for Hostname {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Hostname>>> = LazyLock::new(|| {
            vec![
                Field::attribute(
                    "is_domain_name",
                    "is_domain_name",
                    |h: &Hostname| &h.is_domain_name,
                    |h: &mut Hostname| &mut h.is_domain_name,
                ),
                Field::scalar(
                    "Hostname_Value",
                    "hostname_value",
                    |h: &Hostname| &h.hostname_value,
                    |h: &mut Hostname| &mut h.hostname_value,
                ),
                Field::scalars(
                    "Naming_System",
                    "naming_system",
                    |h: &Hostname| &h.naming_system,
                    |h: &mut Hostname| &mut h.naming_system,
                ),
            ]
        });
        &FIELDS
    }
}

impl PropertiesType for Hostname {
    const XSI_NS: &'static str = "HostnameObj";
    const XSI_TYPE: &'static str = "HostnameObjectType";
    const NAMESPACE: &'static str = NAMESPACE;

    fn properties_base(&self) -> &PropertiesBase {
        &self.base
    }

    fn properties_base_mut(&mut self) -> &mut PropertiesBase {
        &mut self.base
    }
}
