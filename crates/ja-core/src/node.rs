//! The tree the archiver produces.

use crate::value::Number;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Per-session token naming one logical object.
///
/// Assigned in increasing order starting at 1; never reused inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(u64);

impl Identity {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoded number. Non-finite floats get sentinel variants since JSON
/// cannot express them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberNode {
    Int(i64),
    UInt(u64),
    /// Always finite.
    Float(f64),
    NaN,
    Infinity,
    NegInfinity,
}

impl NumberNode {
    /// Numeric part of [`Number`]; booleans are not numbers here.
    pub fn from_number(number: Number) -> Option<Self> {
        match number {
            Number::Bool(_) => None,
            Number::Int(i) => Some(Self::Int(i)),
            Number::UInt(u) => Some(Self::UInt(u)),
            Number::Float(f) => Some(Self::from_f64(f)),
        }
    }

    pub fn from_f64(f: f64) -> Self {
        if f.is_nan() {
            Self::NaN
        } else if f == f64::INFINITY {
            Self::Infinity
        } else if f == f64::NEG_INFINITY {
            Self::NegInfinity
        } else {
            Self::Float(f)
        }
    }

    /// Text used inside the `{"$number": ...}` sentinel, if this needs one.
    pub fn sentinel(&self) -> Option<&'static str> {
        match self {
            Self::NaN => Some("NaN"),
            Self::Infinity => Some("Infinity"),
            Self::NegInfinity => Some("-Infinity"),
            _ => None,
        }
    }
}

/// Field name to node mapping that keeps insertion order.
///
/// Lookups go through a key index, so encoding an object with many fields
/// stays linear.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, EncodedNode)>,
    index: HashMap<String, usize>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its original position.
    /// Returns the previous node for that key.
    pub fn insert(&mut self, key: impl Into<String>, node: EncodedNode) -> Option<EncodedNode> {
        let key = key.into();
        if let Some(&pos) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[pos].1, node));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, node));
        None
    }

    /// Insert ahead of every existing field.
    pub fn insert_front(&mut self, key: impl Into<String>, node: EncodedNode) {
        let key = key.into();
        if let Some(pos) = self.index.get(&key).copied() {
            self.entries.remove(pos);
        }
        self.entries.insert(0, (key, node));
        self.reindex();
    }

    pub fn get(&self, key: &str) -> Option<&EncodedNode> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn remove(&mut self, key: &str) -> Option<EncodedNode> {
        let pos = self.index.remove(key)?;
        let (_, node) = self.entries.remove(pos);
        self.reindex();
        Some(node)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &EncodedNode) -> bool) {
        let before = self.entries.len();
        self.entries.retain(|(k, n)| keep(k, n));
        if self.entries.len() != before {
            self.reindex();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EncodedNode)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut EncodedNode> {
        self.entries.iter_mut().map(|(_, n)| n)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.clone(), pos);
        }
    }
}

/// Equal when the same keys map to equal nodes in the same order.
impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>> FromIterator<(K, EncodedNode)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, EncodedNode)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, n) in iter {
            fields.insert(k, n);
        }
        fields
    }
}

/// One node of the archive tree.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedNode {
    Null,
    Bool(bool),
    Number(NumberNode),
    String(String),
    Reference(Identity),
    Array(Vec<EncodedNode>),
    Object { type_tag: String, fields: Fields },
}

impl EncodedNode {
    pub fn object(type_tag: impl Into<String>, fields: Fields) -> Self {
        Self::Object {
            type_tag: type_tag.into(),
            fields,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_reference(&self) -> Option<Identity> {
        match self {
            Self::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Self::Object { type_tag, .. } => Some(type_tag),
            _ => None,
        }
    }

    /// Field of an object node.
    pub fn field(&self, key: &str) -> Option<&EncodedNode> {
        match self {
            Self::Object { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    /// Visit every reference in this subtree, outermost first.
    pub fn for_each_reference(&self, f: &mut impl FnMut(Identity)) {
        match self {
            Self::Reference(id) => f(*id),
            Self::Array(items) => {
                for item in items {
                    item.for_each_reference(f);
                }
            }
            Self::Object { fields, .. } => {
                for (_, node) in fields.iter() {
                    node.for_each_reference(f);
                }
            }
            _ => {}
        }
    }
}

impl Serialize for NumberNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Int(i) => serializer.serialize_i64(i),
            Self::UInt(u) => serializer.serialize_u64(u),
            Self::Float(f) => serializer.serialize_f64(f),
            Self::NaN | Self::Infinity | Self::NegInfinity => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$number", &self.sentinel())?;
                map.end()
            }
        }
    }
}

impl Serialize for EncodedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Reference(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", &id.get())?;
                map.end()
            }
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object { type_tag, fields } => {
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                map.serialize_entry("$class", type_tag)?;
                for (key, node) in fields.iter() {
                    map.serialize_entry(key, node)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_finite_sentinels() {
        assert_eq!(NumberNode::from_f64(f64::NAN), NumberNode::NaN);
        assert_eq!(NumberNode::from_f64(f64::INFINITY), NumberNode::Infinity);
        assert_eq!(NumberNode::from_f64(f64::NEG_INFINITY), NumberNode::NegInfinity);
        assert_eq!(NumberNode::from_f64(2.5), NumberNode::Float(2.5));
        let json = serde_json::to_value(EncodedNode::Number(NumberNode::NaN)).unwrap();
        assert_eq!(json, json!({"$number": "NaN"}));
        let json = serde_json::to_value(EncodedNode::Number(NumberNode::NegInfinity)).unwrap();
        assert_eq!(json, json!({"$number": "-Infinity"}));
    }

    #[test]
    fn test_bool_is_not_a_number() {
        assert_eq!(NumberNode::from_number(Number::Bool(true)), None);
        assert_eq!(NumberNode::from_number(Number::UInt(3)), Some(NumberNode::UInt(3)));
    }

    #[test]
    fn test_reference_json() {
        let json = serde_json::to_value(EncodedNode::Reference(Identity::new(7))).unwrap();
        assert_eq!(json, json!({"$ref": 7}));
    }

    #[test]
    fn test_object_json_keeps_field_order() {
        let fields: Fields = vec![
            ("zeta", EncodedNode::Bool(true)),
            ("alpha", EncodedNode::String("a".into())),
        ]
        .into_iter()
        .collect();
        let text = serde_json::to_string(&EncodedNode::object("Person", fields)).unwrap();
        assert_eq!(text, r#"{"$class":"Person","zeta":true,"alpha":"a"}"#);
    }

    #[test]
    fn test_fields_replace_keeps_position() {
        let mut fields = Fields::new();
        fields.insert("a", EncodedNode::Null);
        fields.insert("b", EncodedNode::Null);
        let previous = fields.insert("a", EncodedNode::Bool(false));
        assert_eq!(previous, Some(EncodedNode::Null));
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(fields.get("a"), Some(&EncodedNode::Bool(false)));
    }

    #[test]
    fn test_fields_front_and_remove() {
        let mut fields = Fields::new();
        fields.insert("x", EncodedNode::Null);
        fields.insert_front("$id", EncodedNode::Number(NumberNode::UInt(1)));
        assert_eq!(fields.keys().next(), Some("$id"));
        assert!(fields.remove("x").is_some());
        assert!(fields.remove("x").is_none());
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_fields_lookup_after_reordering() {
        let mut fields: Fields = (0..100).map(|i| (format!("f{i}"), EncodedNode::Bool(i % 2 == 0))).collect();
        fields.insert_front("$id", EncodedNode::Null);
        fields.retain(|k, _| k != "f10");
        assert!(fields.remove("f50").is_some());
        assert_eq!(fields.len(), 99);
        assert_eq!(fields.get("f99"), Some(&EncodedNode::Bool(false)));
        assert_eq!(fields.get("f98"), Some(&EncodedNode::Bool(true)));
        assert_eq!(fields.get("$id"), Some(&EncodedNode::Null));
        assert!(fields.get("f10").is_none());
        assert_eq!(fields.insert("f11", EncodedNode::Null), Some(EncodedNode::Bool(false)));
        assert_eq!(fields.keys().nth(2), Some("f1"));
    }

    #[test]
    fn test_for_each_reference() {
        let fields: Fields = vec![
            ("a", EncodedNode::Reference(Identity::new(1))),
            (
                "b",
                EncodedNode::Array(vec![
                    EncodedNode::Reference(Identity::new(2)),
                    EncodedNode::Null,
                ]),
            ),
        ]
        .into_iter()
        .collect();
        let mut seen = Vec::new();
        EncodedNode::object("T", fields).for_each_reference(&mut |id| seen.push(id.get()));
        assert_eq!(seen, vec![1, 2]);
    }
}
