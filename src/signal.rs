//! `SettingChanged` payload decoding
//!
//! The bus hands us the signal body as positional, loosely typed values.
//! Decoding only checks shape; deciding whether the key matters is left to
//! the dispatcher.

use thiserror::Error;
use zbus::zvariant::{OwnedValue, Value};

/// Untyped positional signal body as delivered by the subscription
pub type SignalPayload = Vec<OwnedValue>;

/// Which positional field of the payload failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalField {
    Namespace,
    Key,
    Value,
}

impl std::fmt::Display for SignalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Namespace => "namespace",
            Self::Key => "key",
            Self::Value => "value",
        })
    }
}

/// What was wrong with the field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// Payload ended before this position
    Missing { len: usize },
    /// Present, but of this signature
    Mistyped { signature: String },
}

impl std::fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { len } => write!(f, "missing (payload has {len} field(s))"),
            Self::Mistyped { signature } => write!(f, "has unexpected type '{signature}'"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("malformed SettingChanged signal: {field} {problem}")]
    MalformedSignal {
        field: SignalField,
        problem: FieldProblem,
    },
}

impl SignalError {
    pub fn field(&self) -> SignalField {
        match self {
            Self::MalformedSignal { field, .. } => *field,
        }
    }
}

/// One decoded notification, borrowed from the payload it came from
#[derive(Debug, PartialEq)]
pub struct SettingChanged<'a> {
    pub namespace: &'a str,
    pub key: &'a str,
    /// The value inside the variant wrapper
    pub value: &'a Value<'static>,
}

impl SettingChanged<'_> {
    /// The wrapped value as the portal's `uint32`, if that is what was sent
    pub fn value_u32(&self) -> Option<u32> {
        match self.value {
            Value::U32(raw) => Some(*raw),
            _ => None,
        }
    }
}

/// Decode `(namespace: s, key: s, value: v)` from a signal body
pub fn decode_setting_changed(payload: &[OwnedValue]) -> Result<SettingChanged<'_>, SignalError> {
    let field_at = |index: usize, field: SignalField| {
        payload
            .get(index)
            .map(|value| &**value)
            .ok_or(SignalError::MalformedSignal {
                field,
                problem: FieldProblem::Missing { len: payload.len() },
            })
    };

    let namespace = expect_str(field_at(0, SignalField::Namespace)?, SignalField::Namespace)?;
    let key = expect_str(field_at(1, SignalField::Key)?, SignalField::Key)?;
    let value = match field_at(2, SignalField::Value)? {
        Value::Value(inner) => &**inner,
        other => return Err(mistyped(other, SignalField::Value)),
    };

    Ok(SettingChanged {
        namespace,
        key,
        value,
    })
}

fn expect_str<'a>(value: &'a Value<'static>, field: SignalField) -> Result<&'a str, SignalError> {
    match value {
        Value::Str(s) => Ok(s.as_str()),
        other => Err(mistyped(other, field)),
    }
}

fn mistyped(value: &Value<'_>, field: SignalField) -> SignalError {
    SignalError::MalformedSignal {
        field,
        problem: FieldProblem::Mistyped {
            signature: value.value_signature().to_string(),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn owned(value: Value<'_>) -> OwnedValue {
        value.try_to_owned().unwrap()
    }

    pub(crate) fn wrapped(value: Value<'_>) -> OwnedValue {
        owned(Value::Value(Box::new(value)))
    }

    /// Body of a `SettingChanged` signal as the portal would send it
    pub(crate) fn setting_payload(namespace: &str, key: &str, value: Value<'_>) -> SignalPayload {
        vec![owned(Value::from(namespace)), owned(Value::from(key)), wrapped(value)]
    }

    #[test]
    fn test_decode_valid_payload() {
        let payload = setting_payload("org.freedesktop.appearance", "color-scheme", Value::U32(1));
        let setting = decode_setting_changed(&payload).unwrap();

        assert_eq!(setting.namespace, "org.freedesktop.appearance");
        assert_eq!(setting.key, "color-scheme");
        assert_eq!(setting.value_u32(), Some(1));
    }

    #[test]
    fn test_decode_does_not_filter_keys() {
        let payload = setting_payload("org.gnome.desktop.interface", "icon-theme", Value::from("Adwaita"));
        let setting = decode_setting_changed(&payload).unwrap();

        assert_eq!(setting.key, "icon-theme");
        assert_eq!(setting.value_u32(), None);
    }

    #[test]
    fn test_decode_rejects_short_payloads() {
        let full = setting_payload("ns", "key", Value::U32(0));

        let err = decode_setting_changed(&[]).unwrap_err();
        assert_eq!(err.field(), SignalField::Namespace);

        let err = decode_setting_changed(&full[..1]).unwrap_err();
        assert_eq!(
            err,
            SignalError::MalformedSignal {
                field: SignalField::Key,
                problem: FieldProblem::Missing { len: 1 },
            }
        );

        let err = decode_setting_changed(&full[..2]).unwrap_err();
        assert_eq!(err.field(), SignalField::Value);
    }

    #[test]
    fn test_decode_rejects_mistyped_fields() {
        let payload = vec![owned(Value::U32(7)), owned(Value::from("key")), wrapped(Value::U32(0))];
        let err = decode_setting_changed(&payload).unwrap_err();
        assert!(matches!(err, SignalError::MalformedSignal { field: SignalField::Namespace, problem: FieldProblem::Mistyped { .. } }));

        let payload = vec![owned(Value::from("ns")), owned(Value::Bool(true)), wrapped(Value::U32(0))];
        let err = decode_setting_changed(&payload).unwrap_err();
        assert!(matches!(err, SignalError::MalformedSignal { field: SignalField::Key, .. }));

        // Bare value without the variant wrapper
        let payload = vec![owned(Value::from("ns")), owned(Value::from("key")), owned(Value::U32(0))];
        let err = decode_setting_changed(&payload).unwrap_err();
        assert!(matches!(err, SignalError::MalformedSignal { field: SignalField::Value, .. }));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut payload = setting_payload("ns", "color-scheme", Value::U32(2));
        payload.push(owned(Value::from("trailing")));

        let setting = decode_setting_changed(&payload).unwrap();
        assert_eq!(setting.value_u32(), Some(2));
    }
}
