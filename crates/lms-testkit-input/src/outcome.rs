//! Result of reading a filtered input.

use serde_json::Value;

/// Outcome of [`filter_input`](crate::RequestData::filter_input).
///
/// The three cases are separate variants, so "not sent" can never be
/// confused with "sent but rejected" or with a falsy accepted value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The name is not present in the selected source.
    Absent,
    /// The value is present but failed the filter.
    Invalid,
    /// The value is present and passed, possibly transformed.
    Value(Value),
}

impl FilterOutcome {
    /// Returns true if the input was not sent.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true if the input was sent but rejected.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Returns the accepted value.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes the outcome and returns the accepted value.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the accepted value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(Value::as_str)
    }

    /// Returns the accepted value as an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.value().and_then(Value::as_i64)
    }

    /// Returns the accepted value as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.value().and_then(Value::as_f64)
    }

    /// Returns the accepted value as a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(Value::as_bool)
    }

    /// Collapses to the host's in-band encoding: `null` when absent,
    /// `false` when rejected, the value otherwise.
    #[must_use]
    pub fn into_legacy_value(self) -> Value {
        match self {
            Self::Absent => Value::Null,
            Self::Invalid => Value::Bool(false),
            Self::Value(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let outcome = FilterOutcome::Value(json!(42));
        assert_eq!(outcome.as_i64(), Some(42));
        assert_eq!(outcome.as_str(), None);
        assert!(!outcome.is_absent());
        assert!(!outcome.is_invalid());
    }

    #[test]
    fn test_falsy_value_is_not_invalid() {
        let outcome = FilterOutcome::Value(json!(false));
        assert_eq!(outcome.as_bool(), Some(false));
        assert_ne!(outcome, FilterOutcome::Invalid);
    }

    #[test]
    fn test_legacy_encoding() {
        assert_eq!(FilterOutcome::Absent.into_legacy_value(), Value::Null);
        assert_eq!(FilterOutcome::Invalid.into_legacy_value(), json!(false));
        assert_eq!(FilterOutcome::Value(json!("x")).into_legacy_value(), json!("x"));
    }
}
