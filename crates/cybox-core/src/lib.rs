//! # cybox-core
//!
//! Entity framework for the cyber-observable object model.
//!
//! This crate provides the pieces every observable and object type builds on:
//! - A schema-shaped binding tree and a JSON-style mapping representation
//! - Table-driven field descriptors with generic encode/decode walkers
//! - Scalar value kinds and list-value escaping
//! - The polymorphic Object Properties payload and its type registry
//! - Object and Related Object wrappers
//! - Shared types: structured text, measure source, time
//! - Identifier generation and the error taxonomy

pub mod binding;
pub mod common;
pub mod error;
pub mod escape;
pub mod fields;
pub mod ids;
pub mod object;
pub mod properties;
pub mod registry;
pub mod scalar;

pub use binding::BindingNode;
pub use common::{MeasureSource, StructuredText, Time};
pub use error::{ContractError, DecodeError, RegistryError, ValueError};
pub use escape::TextValue;
pub use fields::{Cardinality, Entity, Field, FieldMeta, Placement};
pub use object::{Object, RelatedObject};
pub use properties::{ObjectProperties, PropertiesBase, PropertiesType};
pub use registry::{CollisionPolicy, DecodeContext, TypeEntry, TypeRegistry};
pub use scalar::{HexBinary, ScalarValue, ValueKind};
