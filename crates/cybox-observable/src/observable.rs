use std::mem;
use std::sync::LazyLock;

use cybox_core::ids;
use cybox_core::{
    ContractError, Entity, Field, MeasureSource, Object, ObjectProperties, StructuredText,
};

use crate::composition::ObservableComposition;
use crate::event::Event;

/// The single payload slot of an [`Observable`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    #[default]
    None,
    Object(Object),
    Event(Event),
    Composition(ObservableComposition),
}

impl Payload {
    /// Article-qualified name used in contract errors.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::None => "no payload",
            Self::Object(_) => "an Object",
            Self::Event(_) => "an Event",
            Self::Composition(_) => "an ObservableComposition",
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Object> for Payload {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Event> for Payload {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

impl From<ObservableComposition> for Payload {
    fn from(composition: ObservableComposition) -> Self {
        Self::Composition(composition)
    }
}

/// A bare payload is wrapped in an Object, reusing the wrapper it may
/// already have built.
impl From<Box<dyn ObjectProperties>> for Payload {
    fn from(properties: Box<dyn ObjectProperties>) -> Self {
        Self::Object(Object::wrap(properties))
    }
}

/// One observed fact.
///
/// An Observable carries at most one payload. Assigning a different kind of
/// payload while one is present fails with
/// [`ContractError::PayloadOccupied`]; replacing a payload with another of
/// the same kind is allowed. An Observable that only points elsewhere sets
/// `idref` and leaves the payload empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observable {
    pub id: Option<String>,
    pub idref: Option<String>,
    pub title: Option<String>,
    pub description: Option<StructuredText>,
    pub sighting_count: Option<u64>,
    pub observable_source: Vec<MeasureSource>,
    payload: Payload,
}

impl Observable {
    /// A new Observable with a generated id holding `item`.
    #[must_use]
    pub fn new(item: impl Into<Payload>) -> Self {
        Self {
            id: Some(ids::create_id("Observable")),
            payload: item.into(),
            ..Self::default()
        }
    }

    /// An Observable defined elsewhere.
    #[must_use]
    pub fn reference(idref: impl Into<String>) -> Self {
        Self {
            idref: Some(idref.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    #[must_use]
    pub const fn object(&self) -> Option<&Object> {
        match &self.payload {
            Payload::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The held Object, for adding relations after construction.
    pub const fn object_mut(&mut self) -> Option<&mut Object> {
        match &mut self.payload {
            Payload::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub const fn event(&self) -> Option<&Event> {
        match &self.payload {
            Payload::Event(event) => Some(event),
            _ => None,
        }
    }

    #[must_use]
    pub const fn composition(&self) -> Option<&ObservableComposition> {
        match &self.payload {
            Payload::Composition(composition) => Some(composition),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns [`ContractError::PayloadOccupied`] when an Event or a
    /// composition is already set.
    pub fn set_object(&mut self, object: Object) -> Result<(), ContractError> {
        self.set_payload(Payload::Object(object))
    }

    /// # Errors
    ///
    /// Returns [`ContractError::PayloadOccupied`] when an Object or a
    /// composition is already set.
    pub fn set_event(&mut self, event: Event) -> Result<(), ContractError> {
        self.set_payload(Payload::Event(event))
    }

    /// # Errors
    ///
    /// Returns [`ContractError::PayloadOccupied`] when an Object or an Event
    /// is already set.
    pub fn set_composition(
        &mut self,
        composition: ObservableComposition,
    ) -> Result<(), ContractError> {
        self.set_payload(Payload::Composition(composition))
    }

    /// Set the payload slot. Setting [`Payload::None`] always succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::PayloadOccupied`] when a payload of a
    /// different kind is already set.
    pub fn set_payload(&mut self, payload: Payload) -> Result<(), ContractError> {
        let compatible = self.payload.is_none()
            || payload.is_none()
            || mem::discriminant(&self.payload) == mem::discriminant(&payload);
        if !compatible {
            return Err(ContractError::PayloadOccupied {
                existing: self.payload.describe(),
                attempted: payload.describe(),
            });
        }
        self.payload = payload;
        Ok(())
    }

    /// Remove and return the payload, leaving the slot empty.
    pub fn take_payload(&mut self) -> Payload {
        mem::take(&mut self.payload)
    }
}

impl Entity for Observable {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Observable>>> = LazyLock::new(|| {
            vec![
                Field::attribute("id", "id", |o: &Observable| &o.id, |o: &mut Observable| &mut o.id),
                Field::attribute("idref", "idref", |o: &Observable| &o.idref, |o: &mut Observable| {
                    &mut o.idref
                }),
                Field::attribute(
                    "sighting_count",
                    "sighting_count",
                    |o: &Observable| &o.sighting_count,
                    |o: &mut Observable| &mut o.sighting_count,
                ),
                Field::scalar("Title", "title", |o: &Observable| &o.title, |o: &mut Observable| {
                    &mut o.title
                }),
                Field::entity(
                    "Description",
                    "description",
                    |o: &Observable| &o.description,
                    |o: &mut Observable| &mut o.description,
                ),
                Field::entities(
                    "Observable_Source",
                    "observable_source",
                    |o: &Observable| &o.observable_source,
                    |o: &mut Observable| &mut o.observable_source,
                ),
                Field::guarded_entity("Object", "object", Observable::object, Observable::set_object),
                Field::guarded_entity("Event", "event", Observable::event, Observable::set_event),
                Field::guarded_entity(
                    "Observable_Composition",
                    "observable_composition",
                    Observable::composition,
                    Observable::set_composition,
                ),
            ]
        });
        &FIELDS
    }
}
