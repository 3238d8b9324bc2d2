//! Error taxonomy for the object model.
//!
//! Contract violations are raised eagerly by setters. Decode errors are raised
//! while rebuilding entities from either representation. An absent node is
//! never an error: decoders return `None` for it.

use thiserror::Error;

/// A caller broke an entity invariant at the point of assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// An Observable payload slot was set while a different slot is occupied.
    #[error("Observable already has {existing}; cannot also set {attempted}")]
    PayloadOccupied {
        existing: &'static str,
        attempted: &'static str,
    },

    /// A payload already placed in an Object was asked for its own wrapper.
    #[error("Payload is already wrapped by Object {owner:?}; relate through that Object")]
    AlreadyWrapped { owner: Option<String> },

    /// A composition operator outside the permitted set.
    #[error("Invalid composition operator '{0}': must be one of AND, OR")]
    InvalidOperator(String),
}

/// Errors from the type registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No class is registered under the discriminator.
    #[error("No such type: {0}")]
    UnknownType(String),

    /// A different class is already registered under the discriminator.
    #[error("Discriminator '{discriminator}' is already registered to another type")]
    Collision { discriminator: String },
}

/// Errors raised while decoding an entity from an encoded representation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// A polymorphic payload carries no discriminator.
    #[error("Object has no xsi:type")]
    MissingType,

    /// The discriminator is not known to the registry.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A required slot is absent.
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A scalar could not be converted to its declared kind.
    #[error("Invalid value for '{field}': expected {expected}, found '{found}'")]
    InvalidValue {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    /// The encoded node does not have the shape the field expects.
    #[error("Unexpected shape for '{field}': expected {expected}")]
    UnexpectedShape {
        field: &'static str,
        expected: &'static str,
    },

    /// The encoded document states a version this model cannot read.
    #[error("Unsupported document version {found} (expected major version {expected})")]
    UnsupportedVersion { expected: u32, found: String },

    /// Decoded content breaks an entity invariant.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// A scalar text failed to parse as its declared kind.
///
/// Carries no field name; slots attach it when converting into
/// [`DecodeError::InvalidValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found '{found}'")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: String,
}

impl ValueError {
    pub fn new(expected: &'static str, found: impl Into<String>) -> Self {
        Self {
            expected,
            found: found.into(),
        }
    }

    /// Attach the field name the value was read for.
    #[must_use]
    pub fn in_field(self, field: &'static str) -> DecodeError {
        DecodeError::InvalidValue {
            field,
            expected: self.expected,
            found: self.found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_gains_field_name() {
        let err = ValueError::new("unsignedLong", "-3").in_field("Size_In_Bytes");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'Size_In_Bytes': expected unsignedLong, found '-3'"
        );
    }

    #[test]
    fn contract_error_converts_into_decode_error() {
        let err: DecodeError = ContractError::InvalidOperator("XOR".into()).into();
        assert!(matches!(err, DecodeError::Contract(_)));
        assert_eq!(
            err.to_string(),
            "Invalid composition operator 'XOR': must be one of AND, OR"
        );
    }
}
