//! Serialised host values and their classification

use super::types::SexpType;
use crate::ids::EnvironmentId;
use serde::{Deserialize, Serialize};

/// A host runtime value as the instrumentation reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawValue {
    /// Any ordinary host object, identified by its host type code
    Object { code: u32 },
    /// A deferred computation
    Promise(Box<RawPromise>),
    Unbound,
    Missing,
    Unassigned,
    Active,
    Jump,
}

/// The slots of a promise at the time it was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPromise {
    pub expression: RawValue,
    #[serde(default = "RawValue::unassigned")]
    pub value: RawValue,
    pub environment: EnvironmentId,
    /// Deparsed expression text, when the host provides it
    #[serde(default)]
    pub source: Option<String>,
}

impl RawValue {
    /// Ordinary object with the given host type
    pub fn object(kind: SexpType) -> Self {
        RawValue::Object { code: kind.code() }
    }

    /// Unforced promise over `expression`
    pub fn promise(expression: RawValue, environment: EnvironmentId) -> Self {
        RawValue::Promise(Box::new(RawPromise {
            expression,
            value: RawValue::Unassigned,
            environment,
            source: None,
        }))
    }

    pub fn unassigned() -> Self {
        RawValue::Unassigned
    }

    pub fn as_promise(&self) -> Option<&RawPromise> {
        match self {
            RawValue::Promise(promise) => Some(promise),
            _ => None,
        }
    }
}

/// Classify a raw value. Total: unrecognised host codes map to [`SexpType::Unknown`].
pub fn classify(value: &RawValue) -> SexpType {
    match value {
        RawValue::Object { code } => SexpType::from_code(*code),
        RawValue::Promise(_) => SexpType::Promise,
        RawValue::Unbound => SexpType::Unbound,
        RawValue::Missing => SexpType::Missing,
        RawValue::Unassigned => SexpType::Unassigned,
        RawValue::Active => SexpType::Active,
        RawValue::Jump => SexpType::Jump,
    }
}

/// Type chain of a value through nested promises.
///
/// A forced promise continues into its value; an unforced one continues into its
/// expression, so `f(g(x))` style promise chains report the innermost known type.
pub fn full_type(value: &RawValue) -> Vec<SexpType> {
    let mut chain = Vec::new();
    let mut current = value;
    while let RawValue::Promise(promise) = current {
        chain.push(SexpType::Promise);
        current = match promise.value {
            RawValue::Unassigned | RawValue::Unbound => &promise.expression,
            _ => &promise.value,
        };
    }
    chain.push(classify(current));
    chain
}

/// `Promise->Double`
pub fn full_type_to_string(chain: &[SexpType]) -> String {
    chain
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join("->")
}

/// `5->14`
pub fn full_type_to_number_string(chain: &[SexpType]) -> String {
    chain
        .iter()
        .map(|t| t.code().to_string())
        .collect::<Vec<_>>()
        .join("->")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_synthetic_values() {
        assert_eq!(classify(&RawValue::Unbound), SexpType::Unbound);
        assert_eq!(classify(&RawValue::Missing), SexpType::Missing);
        assert_eq!(classify(&RawValue::Jump), SexpType::Jump);
        assert_eq!(classify(&RawValue::Object { code: 77 }), SexpType::Unknown);
    }

    #[test]
    fn test_full_type_follows_forced_value() {
        let inner = RawValue::Promise(Box::new(RawPromise {
            expression: RawValue::object(SexpType::Language),
            value: RawValue::object(SexpType::Double),
            environment: EnvironmentId(2),
            source: None,
        }));
        let outer = RawValue::Promise(Box::new(RawPromise {
            expression: RawValue::object(SexpType::Symbol),
            value: inner,
            environment: EnvironmentId(1),
            source: None,
        }));

        let chain = full_type(&outer);
        assert_eq!(
            chain,
            vec![SexpType::Promise, SexpType::Promise, SexpType::Double]
        );
        assert_eq!(full_type_to_string(&chain), "Promise->Promise->Double");
        assert_eq!(full_type_to_number_string(&chain), "5->5->14");
    }

    #[test]
    fn test_full_type_of_unforced_promise_uses_expression() {
        let promise = RawValue::promise(RawValue::object(SexpType::Language), EnvironmentId(1));
        assert_eq!(
            full_type(&promise),
            vec![SexpType::Promise, SexpType::Language]
        );
    }

    #[test]
    fn test_promise_deserializes_with_default_value() {
        let json = r#"{"kind":"promise","expression":{"kind":"object","code":6},"environment":16}"#;
        let value: RawValue = serde_json::from_str(json).unwrap();
        let promise = value.as_promise().unwrap();
        assert_eq!(promise.value, RawValue::Unassigned);
        assert_eq!(promise.environment, EnvironmentId(16));
    }
}
