//! Shared building blocks used across payloads and observables.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::DecodeError;
use crate::fields::{Entity, Field};
use crate::registry::DecodeContext;

// ---------------------------------------------------------------------------
// StructuredText
// ---------------------------------------------------------------------------

/// Free text with an optional structuring format (e.g. `HTML`).
///
/// Without a format its mapping form is the bare string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredText {
    pub value: Option<String>,
    pub structuring_format: Option<String>,
}

impl StructuredText {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            structuring_format: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.structuring_format = Some(format.into());
        self
    }
}

impl From<&str> for StructuredText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Entity for StructuredText {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<StructuredText>>> = LazyLock::new(|| {
            vec![
                Field::text("value", |s: &StructuredText| &s.value, |s: &mut StructuredText| {
                    &mut s.value
                }),
                Field::attribute(
                    "structuring_format",
                    "structuring_format",
                    |s: &StructuredText| &s.structuring_format,
                    |s: &mut StructuredText| &mut s.structuring_format,
                ),
            ]
        });
        &FIELDS
    }

    fn to_mapping(&self) -> Value {
        match (&self.value, &self.structuring_format) {
            (Some(value), None) => Value::String(value.clone()),
            _ => {
                let mut map = serde_json::Map::new();
                crate::fields::encode_mapping_fields(self, &mut map);
                Value::Object(map)
            }
        }
    }

    fn from_mapping(value: &Value, cx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        match value {
            Value::String(text) => Ok(Self::new(text.clone())),
            Value::Object(map) => crate::fields::decode_mapping_fields(map, cx),
            _ => Err(DecodeError::UnexpectedShape {
                field: "structured text",
                expected: "string or mapping",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Time {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub produced_time: Option<DateTime<Utc>>,
    pub received_time: Option<DateTime<Utc>>,
}

impl Entity for Time {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<Time>>> = LazyLock::new(|| {
            vec![
                Field::scalar("Start_Time", "start_time", |t: &Time| &t.start_time, |t: &mut Time| {
                    &mut t.start_time
                }),
                Field::scalar("End_Time", "end_time", |t: &Time| &t.end_time, |t: &mut Time| {
                    &mut t.end_time
                }),
                Field::scalar(
                    "Produced_Time",
                    "produced_time",
                    |t: &Time| &t.produced_time,
                    |t: &mut Time| &mut t.produced_time,
                ),
                Field::scalar(
                    "Received_Time",
                    "received_time",
                    |t: &Time| &t.received_time,
                    |t: &mut Time| &mut t.received_time,
                ),
            ]
        });
        &FIELDS
    }
}

// ---------------------------------------------------------------------------
// MeasureSource
// ---------------------------------------------------------------------------

/// Where an observation came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasureSource {
    pub class: Option<String>,
    pub source_type: Option<String>,
    pub name: Option<String>,
    pub sighting_count: Option<u64>,
    pub information_source_type: Option<String>,
    pub tool_type: Option<String>,
    pub description: Option<StructuredText>,
    pub time: Option<Time>,
}

impl Entity for MeasureSource {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<MeasureSource>>> = LazyLock::new(|| {
            vec![
                Field::attribute("class", "class", |m: &MeasureSource| &m.class, |m: &mut MeasureSource| {
                    &mut m.class
                }),
                Field::attribute(
                    "source_type",
                    "source_type",
                    |m: &MeasureSource| &m.source_type,
                    |m: &mut MeasureSource| &mut m.source_type,
                ),
                Field::attribute("name", "name", |m: &MeasureSource| &m.name, |m: &mut MeasureSource| {
                    &mut m.name
                }),
                Field::attribute(
                    "sighting_count",
                    "sighting_count",
                    |m: &MeasureSource| &m.sighting_count,
                    |m: &mut MeasureSource| &mut m.sighting_count,
                ),
                Field::scalar(
                    "Information_Source_Type",
                    "information_source_type",
                    |m: &MeasureSource| &m.information_source_type,
                    |m: &mut MeasureSource| &mut m.information_source_type,
                ),
                Field::scalar(
                    "Tool_Type",
                    "tool_type",
                    |m: &MeasureSource| &m.tool_type,
                    |m: &mut MeasureSource| &mut m.tool_type,
                ),
                Field::entity(
                    "Description",
                    "description",
                    |m: &MeasureSource| &m.description,
                    |m: &mut MeasureSource| &mut m.description,
                ),
                Field::entity("Time", "time", |m: &MeasureSource| &m.time, |m: &mut MeasureSource| {
                    &mut m.time
                }),
            ]
        });
        &FIELDS
    }
}
