//! Values handed to the archiver by producers.

use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Stable index of a shareable value inside an object arena.
///
/// Identity tracking keys on handles, never on addresses, so two referrers
/// holding the same handle always archive to the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric payload, including the boolean flavor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

/// Anything that can be passed to an encode call.
///
/// `Text`, `List` and the compact variants are owned and anonymous: each
/// occurrence is a distinct object. Values that must be shared, or that
/// take part in cycles, live in an arena and are passed as [`Value::Ref`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Nil,
    /// Explicit null object, distinct from `Nil`.
    Null,
    Number(Number),
    Text(String),
    List(Vec<Value>),
    Data(Vec<u8>),
    Url(Url),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    Ref(Handle),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Number(Number::Bool(v))
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Number(Number::Int(v as i64))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Number(Number::UInt(v as u64))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Number(Number::Float(v as f64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Data(v)
    }
}

impl From<Url> for Value {
    fn from(v: Url) -> Self {
        Value::Url(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Handle> for Value {
    fn from(v: Handle) -> Self {
        Value::Ref(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(Value::from(true), Value::Number(Number::Bool(true)));
        assert_eq!(Value::from(-3i32), Value::Number(Number::Int(-3)));
        assert_eq!(Value::from(7usize), Value::Number(Number::UInt(7)));
        assert_eq!(Value::from(1.5f64), Value::Number(Number::Float(1.5)));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Nil);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn test_bytes_are_data() {
        assert_eq!(Value::from(vec![1u8, 2]), Value::Data(vec![1, 2]));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle::from_index(4).to_string(), "#4");
    }
}
