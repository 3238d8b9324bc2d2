use std::sync::LazyLock;

use cybox_core::{Entity, Field, StructuredText};

/// Something that happened, possibly made of further events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub id: Option<String>,
    pub idref: Option<String>,
    pub type_: Option<String>,
    pub description: Option<StructuredText>,
    pub events: Vec<Event>,
}

impl Event {
    #[must_use]
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            id: Some(cybox_core::ids::create_id("Event")),
            type_: Some(type_.into()),
            ..Self::default()
        }
    }
}

impl Entity for Event {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Event>>> = LazyLock::new(|| {
            vec![
                Field::attribute("id", "id", |e: &Event| &e.id, |e: &mut Event| &mut e.id),
                Field::attribute("idref", "idref", |e: &Event| &e.idref, |e: &mut Event| &mut e.idref),
                Field::scalar("Type", "type", |e: &Event| &e.type_, |e: &mut Event| &mut e.type_),
                Field::entity("Description", "description", |e: &Event| &e.description, |e: &mut Event| {
                    &mut e.description
                }),
                Field::entities("Event", "events", |e: &Event| &e.events, |e: &mut Event| &mut e.events),
            ]
        });
        &FIELDS
    }
}
