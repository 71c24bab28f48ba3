//! Finished archive: root entries plus the flat table of materialized nodes.

use crate::node::{EncodedNode, Identity};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Name of a root entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootKey {
    /// Added with `encode_root`; rendered as `$0`, `$1`, ...
    Index(usize),
    /// Added with a keyed encode on the session.
    Key(String),
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootKey::Index(i) => write!(f, "${i}"),
            RootKey::Key(k) => write!(f, "{k}"),
        }
    }
}

/// Top-level shape of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// `{"$roots": {...}, "$objects": {...}}`
    #[default]
    Standard,
    /// The roots mapping alone. Only valid with an empty objects table.
    Flat,
    /// The sole root node alone. Only valid with one root and no objects.
    Bare,
}

/// Result of one archiving session.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    roots: Vec<(RootKey, EncodedNode)>,
    objects: BTreeMap<Identity, EncodedNode>,
    layout: Layout,
    pretty_print: bool,
}

impl Archive {
    pub fn new(
        roots: Vec<(RootKey, EncodedNode)>,
        objects: BTreeMap<Identity, EncodedNode>,
        pretty_print: bool,
    ) -> Self {
        Self {
            roots,
            objects,
            layout: Layout::Standard,
            pretty_print,
        }
    }

    /// Root entries in encode order.
    pub fn roots(&self) -> &[(RootKey, EncodedNode)] {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut [(RootKey, EncodedNode)] {
        &mut self.roots
    }

    /// Look up a root by its rendered key (`"$0"` for the first indexed root).
    pub fn root(&self, key: &str) -> Option<&EncodedNode> {
        self.roots
            .iter()
            .find(|(k, _)| k.to_string() == key)
            .map(|(_, n)| n)
    }

    /// Materialized nodes by identity.
    pub fn objects(&self) -> &BTreeMap<Identity, EncodedNode> {
        &self.objects
    }

    /// Nodes of the objects table, editable in place.
    pub fn objects_mut(&mut self) -> std::collections::btree_map::IterMut<'_, Identity, EncodedNode> {
        self.objects.iter_mut()
    }

    pub fn object(&self, id: Identity) -> Option<&EncodedNode> {
        self.objects.get(&id)
    }

    /// Remove a node from the objects table, e.g. to move it into a root.
    pub fn take_object(&mut self, id: Identity) -> Option<EncodedNode> {
        self.objects.remove(&id)
    }

    /// Follow `node` through one reference, if it is one.
    pub fn resolve<'a>(&'a self, node: &'a EncodedNode) -> Option<&'a EncodedNode> {
        match node {
            EncodedNode::Reference(id) => self.objects.get(id),
            other => Some(other),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    /// Formatter hint carried over from the session config.
    pub fn pretty_print(&self) -> bool {
        self.pretty_print
    }

    pub fn set_pretty_print(&mut self, pretty: bool) {
        self.pretty_print = pretty;
    }

    /// Number of materialized objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Render into a `serde_json::Value`.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

struct RootsMap<'a>(&'a [(RootKey, EncodedNode)]);

impl Serialize for RootsMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, node) in self.0 {
            map.serialize_entry(&key.to_string(), node)?;
        }
        map.end()
    }
}

struct ObjectsMap<'a>(&'a BTreeMap<Identity, EncodedNode>);

impl Serialize for ObjectsMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, node) in self.0 {
            map.serialize_entry(&id.to_string(), node)?;
        }
        map.end()
    }
}

impl Serialize for Archive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.layout, self.roots.as_slice()) {
            (Layout::Bare, [(_, node)]) if self.objects.is_empty() => node.serialize(serializer),
            (Layout::Flat, roots) if self.objects.is_empty() => RootsMap(roots).serialize(serializer),
            _ => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$roots", &RootsMap(&self.roots))?;
                map.serialize_entry("$objects", &ObjectsMap(&self.objects))?;
                map.end()
            }
        }
    }
}

impl<'a> IntoIterator for &'a Archive {
    type Item = (&'a Identity, &'a EncodedNode);
    type IntoIter = std::collections::btree_map::Iter<'a, Identity, EncodedNode>;
    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}
