use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use cybox_core::{ContractError, Entity, Field, ScalarValue, ValueError, ValueKind};

use crate::observable::{Observable, Payload};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Boolean operator of a composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            other => Err(ContractError::InvalidOperator(other.to_owned())),
        }
    }
}

impl ScalarValue for Operator {
    const KIND: ValueKind = ValueKind::Token;

    fn to_text(&self) -> String {
        self.as_str().to_owned()
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        text.parse().map_err(|_| ValueError::new("AND or OR", text))
    }
}

// ---------------------------------------------------------------------------
// ObservableComposition
// ---------------------------------------------------------------------------

/// A boolean combination of Observables. Children may hold further
/// compositions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservableComposition {
    pub operator: Operator,
    pub observables: Vec<Observable>,
}

impl ObservableComposition {
    #[must_use]
    pub const fn new(operator: Operator) -> Self {
        Self {
            operator,
            observables: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(operator: Operator, observables: impl IntoIterator<Item = Observable>) -> Self {
        Self {
            operator,
            observables: observables.into_iter().collect(),
        }
    }

    pub fn add(&mut self, observable: Observable) {
        self.observables.push(observable);
    }

    /// Wrap `item` in a new Observable and append it.
    pub fn add_item(&mut self, item: impl Into<Payload>) {
        self.add(Observable::new(item));
    }
}

impl Entity for ObservableComposition {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: LazyLock<Vec<Field<ObservableComposition>>> = LazyLock::new(|| {
            vec![
                Field::required_attribute(
                    "operator",
                    "operator",
                    |c: &ObservableComposition| &c.operator,
                    |c: &mut ObservableComposition| &mut c.operator,
                ),
                Field::entities(
                    "Observable",
                    "observables",
                    |c: &ObservableComposition| &c.observables,
                    |c: &mut ObservableComposition| &mut c.observables,
                ),
            ]
        });
        &FIELDS
    }
}

#[cfg(test)]
mod tests {
    use cybox_core::{DecodeContext, DecodeError, TypeRegistry};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("AND", Operator::And)]
    #[case("OR", Operator::Or)]
    fn operator_parses_permitted_tokens(#[case] text: &str, #[case] expected: Operator) {
        assert_eq!(text.parse::<Operator>().unwrap(), expected);
        assert_eq!(expected.to_string(), text);
    }

    #[rstest]
    #[case("XOR")]
    #[case("and")]
    #[case("")]
    fn operator_rejects_everything_else(#[case] text: &str) {
        assert_eq!(
            text.parse::<Operator>().unwrap_err(),
            ContractError::InvalidOperator(text.to_owned())
        );
    }

    #[test]
    fn decode_rejects_invalid_operator() {
        let registry = TypeRegistry::new();
        let cx = DecodeContext::new(&registry);
        let err = ObservableComposition::from_mapping(&json!({"operator": "NOT"}), &cx).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { field: "operator", .. }));
    }

    #[test]
    fn decode_requires_operator() {
        let registry = TypeRegistry::new();
        let cx = DecodeContext::new(&registry);
        let err = ObservableComposition::from_mapping(&json!({"observables": []}), &cx).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "operator" });
    }
}
