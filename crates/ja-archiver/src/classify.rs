//! Type classification: decides how each value is represented.
//!
//! Categories are tried in order and the first match wins:
//! nil, null object, boolean, number, inline, compact, collection, object.

use crate::graph::{Encodable, Entry, ObjectGraph};
use crate::identity::{IdentityKey, Subject};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use ja_core::{ArchiveError, ArchiverConfig, EncodedNode, Fields, Handle, Number, NumberNode, Result, Value};
use url::Url;
use uuid::Uuid;

/// Short immutable value written in place at every occurrence.
#[derive(Debug, Clone, Copy)]
pub enum Inline<'v> {
    Text(&'v str),
    List(&'v [Value]),
}

/// Built-in value kind with a dense one-node representation.
#[derive(Debug, Clone, Copy)]
pub enum Compact<'v> {
    Text(&'v str),
    Data(&'v [u8]),
    Url(&'v Url),
    Date(&'v DateTime<Utc>),
    Uuid(&'v Uuid),
}

impl Compact<'_> {
    pub fn materialize(&self) -> EncodedNode {
        let (tag, key, text) = match *self {
            Compact::Text(text) => return EncodedNode::String(text.to_string()),
            Compact::Data(bytes) => ("Data", "base64", STANDARD.encode(bytes)),
            Compact::Url(url) => ("URL", "string", url.as_str().to_string()),
            Compact::Date(date) => ("Date", "iso8601", date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Compact::Uuid(uuid) => ("UUID", "string", uuid.to_string()),
        };
        let mut fields = Fields::new();
        fields.insert(key, EncodedNode::String(text));
        EncodedNode::object(tag, fields)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Collection<'v> {
    List(&'v [Value]),
    Set(&'v [Value]),
    Map(&'v [(Value, Value)]),
}

impl Collection<'_> {
    /// First element of the encoded array.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Collection::List(_) => "List",
            Collection::Set(_) => "Set",
            Collection::Map(_) => "Map",
        }
    }
}

pub enum Category<'v> {
    Nil,
    NullObject,
    Boolean(bool),
    Number(NumberNode),
    Inline(Inline<'v>),
    Compact(Compact<'v>, Subject),
    Collection(Collection<'v>, Subject),
    Object(&'v dyn Encodable, Subject),
}

/// Classify `value`, following `Value::Ref` into `graph`.
pub fn classify<'v>(value: &'v Value, graph: &'v ObjectGraph, config: &ArchiverConfig) -> Result<Category<'v>> {
    let anonymous = Subject::Anonymous;
    let category = match value {
        Value::Nil => Category::Nil,
        Value::Null => Category::NullObject,
        Value::Number(Number::Bool(b)) => Category::Boolean(*b),
        Value::Number(number) => match NumberNode::from_number(*number) {
            Some(node) => Category::Number(node),
            None => return Err(ArchiveError::invalid(format!("unclassifiable number {number:?}"))),
        },
        Value::Text(text) if text_fits(text, config) => Category::Inline(Inline::Text(text)),
        Value::Text(text) => Category::Compact(Compact::Text(text), anonymous),
        Value::List(items) if list_fits(items, graph, config) => Category::Inline(Inline::List(items)),
        Value::List(items) => Category::Collection(Collection::List(items), anonymous),
        Value::Data(bytes) => Category::Compact(Compact::Data(bytes), anonymous),
        Value::Url(url) => Category::Compact(Compact::Url(url), anonymous),
        Value::Date(date) => Category::Compact(Compact::Date(date), anonymous),
        Value::Uuid(uuid) => Category::Compact(Compact::Uuid(uuid), anonymous),
        Value::Ref(handle) => return classify_entry(*handle, graph, config),
    };
    Ok(category)
}

fn classify_entry<'v>(handle: Handle, graph: &'v ObjectGraph, config: &ArchiverConfig) -> Result<Category<'v>> {
    let Some(entry) = graph.get(handle) else {
        let reason = if graph.is_reserved(handle) {
            format!("handle {handle} was reserved but never filled")
        } else {
            format!("dangling handle {handle}")
        };
        return Err(ArchiveError::invalid(reason));
    };

    let subject = Subject::Keyed(IdentityKey::Handle(handle));
    let category = match entry {
        Entry::Text { text, mutable: false } if text_fits(text, config) => Category::Inline(Inline::Text(text)),
        Entry::Text { text, .. } => Category::Compact(Compact::Text(text), subject),
        Entry::List { items, mutable: false } if list_fits(items, graph, config) => {
            Category::Inline(Inline::List(items))
        }
        Entry::List { items, .. } => Category::Collection(Collection::List(items), subject),
        Entry::Set(items) => Category::Collection(Collection::Set(items), subject),
        Entry::Map(pairs) => Category::Collection(Collection::Map(pairs), subject),
        Entry::Data(bytes) => Category::Compact(Compact::Data(bytes), subject),
        Entry::Url(url) => Category::Compact(Compact::Url(url), subject),
        Entry::Date(date) => Category::Compact(Compact::Date(date), subject),
        Entry::Uuid(uuid) => Category::Compact(Compact::Uuid(uuid), subject),
        Entry::Object(object) => Category::Object(&**object, subject),
    };
    Ok(category)
}

fn text_fits(text: &str, config: &ArchiverConfig) -> bool {
    text.chars().count() <= config.inline_text_max_chars
}

fn list_fits(items: &[Value], graph: &ObjectGraph, config: &ArchiverConfig) -> bool {
    items.len() <= config.inline_list_max_items && items.iter().all(|item| is_inlineable(item, graph, config))
}

/// Whether `value` may appear inside an inlined list. Anything with an
/// identity (null object, compact values, handles) disqualifies the list.
fn is_inlineable(value: &Value, graph: &ObjectGraph, config: &ArchiverConfig) -> bool {
    match value {
        Value::Nil | Value::Number(_) => true,
        Value::Text(text) => text_fits(text, config),
        Value::List(items) => list_fits(items, graph, config),
        Value::Null | Value::Data(_) | Value::Url(_) | Value::Date(_) | Value::Uuid(_) | Value::Ref(_) => false,
    }
}
