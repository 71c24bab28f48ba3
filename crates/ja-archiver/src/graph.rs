//! Object arena holding every value that can be shared or take part in a cycle.

use crate::coder::ObjectCoder;
use chrono::{DateTime, Utc};
use ja_core::{ArchiveError, Handle, KeyPath, Result, Value};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Self-encoding capability of a generic object.
///
/// An implementation describes itself only through encode calls on the
/// coder it is handed; whatever it does not encode is not archived.
///
/// ```ignore
/// struct Node { name: String, next: Option<Handle> }
///
/// impl Encodable for Node {
///     fn type_tag(&self) -> &str { "Node" }
///     fn encode(&self, coder: &mut ObjectCoder<'_, '_>) -> Result<()> {
///         coder.encode_value("name", self.name.as_str())?;
///         coder.encode_value("next", self.next)
///     }
/// }
/// ```
pub trait Encodable {
    /// Type name recorded with the object.
    fn type_tag(&self) -> &str;

    fn encode(&self, coder: &mut ObjectCoder<'_, '_>) -> Result<()>;
}

/// A shareable value stored in the arena.
pub enum Entry {
    Text { text: String, mutable: bool },
    List { items: Vec<Value>, mutable: bool },
    Set(Vec<Value>),
    /// Key/value pairs in insertion order.
    Map(Vec<(Value, Value)>),
    Data(Vec<u8>),
    Url(Url),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    Object(Box<dyn Encodable>),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Text { text, mutable } => f
                .debug_struct("Text")
                .field("text", text)
                .field("mutable", mutable)
                .finish(),
            Entry::List { items, mutable } => f
                .debug_struct("List")
                .field("items", items)
                .field("mutable", mutable)
                .finish(),
            Entry::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Entry::Map(pairs) => f.debug_tuple("Map").field(pairs).finish(),
            Entry::Data(bytes) => write!(f, "Data({} bytes)", bytes.len()),
            Entry::Url(url) => f.debug_tuple("Url").field(&url.as_str()).finish(),
            Entry::Date(date) => f.debug_tuple("Date").field(date).finish(),
            Entry::Uuid(uuid) => f.debug_tuple("Uuid").field(uuid).finish(),
            Entry::Object(object) => f.debug_tuple("Object").field(&object.type_tag()).finish(),
        }
    }
}

/// Flat arena of shareable values addressed by [`Handle`].
///
/// Links between values are handles stored inside [`Value::Ref`], never
/// ownership, so cyclic graphs need no reference counting.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    entries: Vec<Option<Entry>>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry and return its handle.
    pub fn insert(&mut self, entry: Entry) -> Handle {
        let handle = Handle::from_index(self.entries.len());
        self.entries.push(Some(entry));
        handle
    }

    pub fn insert_object<T: Encodable + 'static>(&mut self, object: T) -> Handle {
        self.insert(Entry::Object(Box::new(object)))
    }

    /// Allocate a handle now and provide its entry later with [`fill`].
    ///
    /// This is how cycles are built: both ends can hold each other's handle
    /// before either is filled.
    ///
    /// [`fill`]: ObjectGraph::fill
    pub fn reserve(&mut self) -> Handle {
        let handle = Handle::from_index(self.entries.len());
        self.entries.push(None);
        handle
    }

    /// Provide the entry for a reserved handle.
    pub fn fill(&mut self, handle: Handle, entry: Entry) -> Result<()> {
        let Some(slot) = self.entries.get_mut(handle.index()) else {
            return Err(ArchiveError::misuse(
                KeyPath::new(),
                format!("handle {handle} does not belong to this graph"),
            ));
        };
        if slot.is_some() {
            return Err(ArchiveError::misuse(
                KeyPath::new(),
                format!("handle {handle} is already filled"),
            ));
        }
        *slot = Some(entry);
        Ok(())
    }

    pub fn fill_object<T: Encodable + 'static>(&mut self, handle: Handle, object: T) -> Result<()> {
        self.fill(handle, Entry::Object(Box::new(object)))
    }

    /// Immutable text; short text of this kind is written inline.
    pub fn text(&mut self, text: impl Into<String>) -> Handle {
        self.insert(Entry::Text {
            text: text.into(),
            mutable: false,
        })
    }

    /// Mutable text is always identity-tracked, whatever its length.
    pub fn mutable_text(&mut self, text: impl Into<String>) -> Handle {
        self.insert(Entry::Text {
            text: text.into(),
            mutable: true,
        })
    }

    pub fn list(&mut self, items: Vec<Value>) -> Handle {
        self.insert(Entry::List {
            items,
            mutable: false,
        })
    }

    pub fn mutable_list(&mut self, items: Vec<Value>) -> Handle {
        self.insert(Entry::List {
            items,
            mutable: true,
        })
    }

    pub fn set(&mut self, items: Vec<Value>) -> Handle {
        self.insert(Entry::Set(items))
    }

    pub fn map(&mut self, pairs: Vec<(Value, Value)>) -> Handle {
        self.insert(Entry::Map(pairs))
    }

    pub fn data(&mut self, bytes: Vec<u8>) -> Handle {
        self.insert(Entry::Data(bytes))
    }

    pub fn url(&mut self, url: Url) -> Handle {
        self.insert(Entry::Url(url))
    }

    pub fn date(&mut self, date: DateTime<Utc>) -> Handle {
        self.insert(Entry::Date(date))
    }

    pub fn uuid(&mut self, uuid: Uuid) -> Handle {
        self.insert(Entry::Uuid(uuid))
    }

    /// Entry behind `handle`; `None` when reserved but not filled, or unknown.
    pub fn get(&self, handle: Handle) -> Option<&Entry> {
        self.entries.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        handle.index() < self.entries.len()
    }

    pub fn is_reserved(&self, handle: Handle) -> bool {
        matches!(self.entries.get(handle.index()), Some(None))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
