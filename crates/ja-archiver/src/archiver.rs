//! The archiving session.

use crate::builder::{annotate, TreeBuilder};
use crate::classify::{classify, Category, Collection, Inline};
use crate::coder::{Coder, DecodingFailurePolicy, ObjectCoder};
use crate::graph::{Encodable, ObjectGraph};
use crate::identity::{IdentityKey, IdentityTracker, Mode, Resolution, Subject};
use crate::resolver::ConditionalResolver;
use ja_compactor::RootCompactor;
use ja_core::{
    is_reserved_key, Archive, ArchiveError, ArchiverConfig, EncodedNode, Fields, Identity, KeyPath, Result, RootKey,
    Value,
};

/// One encode operation over an [`ObjectGraph`].
///
/// Roots are added with [`encode_root`](Archiver::encode_root) or with a
/// keyed [`Coder::encode_value`]; [`finish`](Archiver::finish) resolves
/// conditional references and returns the [`Archive`]. The first failure
/// aborts the session: every later call returns [`ArchiveError::Aborted`].
pub struct Archiver<'g> {
    graph: &'g ObjectGraph,
    config: ArchiverConfig,
    tracker: IdentityTracker,
    resolver: ConditionalResolver,
    builder: TreeBuilder,
    path: KeyPath,
    /// Identities whose materialization is on the call stack.
    owners: Vec<Identity>,
    failure: Option<String>,
}

impl<'g> Archiver<'g> {
    pub fn new(graph: &'g ObjectGraph) -> Self {
        Self::with_config(graph, ArchiverConfig::default())
    }

    pub fn with_config(graph: &'g ObjectGraph, config: ArchiverConfig) -> Self {
        tracing::debug!(entries = graph.len(), ?config, "archiving session started");
        Self {
            graph,
            config,
            tracker: IdentityTracker::new(),
            resolver: ConditionalResolver::new(),
            builder: TreeBuilder::new(),
            path: KeyPath::new(),
            owners: Vec::new(),
            failure: None,
        }
    }

    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    /// Key path of the value being encoded.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Whether an earlier failure aborted this session.
    pub fn is_aborted(&self) -> bool {
        self.failure.is_some()
    }

    /// Append an indexed root (`$0`, `$1`, ...). Roots are always unconditional.
    pub fn encode_root(&mut self, value: impl Into<Value>) -> Result<()> {
        let key = RootKey::Index(self.builder.next_root_index());
        self.add_root(key, value.into())
    }

    /// Resolve conditional references, link the tree and, if enabled,
    /// compact the roots. Debug info is added last.
    pub fn finish(mut self) -> Result<Archive> {
        self.ensure_active()?;
        let resolved = self.resolver.resolve(&mut self.tracker);
        let archive = self.builder.build(&mut self.tracker, &self.config);

        let mut archive = if self.config.compact_root {
            RootCompactor::full().compact(archive).archive
        } else {
            archive
        };
        if self.config.include_debug_info {
            annotate(&mut archive);
        }

        tracing::debug!(
            roots = archive.roots().len(),
            objects = archive.len(),
            kept = resolved.kept,
            dropped = resolved.dropped,
            "archiving session finished"
        );
        Ok(archive)
    }

    fn add_root(&mut self, key: RootKey, value: Value) -> Result<()> {
        self.ensure_active()?;
        if self.builder.has_root_key(&key) {
            let err = ArchiveError::misuse(KeyPath::new(), format!("root key `{key}` is already in use"));
            return Err(self.fail(err));
        }
        let node = self.encode_at(&key.to_string(), &value, Mode::Unconditional)?;
        self.builder.add_root(key, node);
        Ok(())
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(ArchiveError::Aborted(reason.clone())),
            None => Ok(()),
        }
    }

    /// Record `err` as the reason this session aborted, keeping the first one.
    pub(crate) fn fail(&mut self, err: ArchiveError) -> ArchiveError {
        if self.failure.is_none() && !matches!(err, ArchiveError::Aborted(_)) {
            tracing::debug!(error = %err, "archiving session aborted");
            self.failure = Some(err.to_string());
        }
        err
    }

    /// Encode `value` one level below the current path.
    pub(crate) fn encode_at(&mut self, key: &str, value: &Value, mode: Mode) -> Result<EncodedNode> {
        self.path.push_key(key);
        let result = self.encode_node(value, mode);
        self.path.pop();
        result.map_err(|err| self.fail(err))
    }

    fn encode_node(&mut self, value: &Value, mode: Mode) -> Result<EncodedNode> {
        let graph = self.graph;
        let category = classify(value, graph, &self.config).map_err(|err| err.at(&self.path))?;
        match category {
            Category::Nil => Ok(EncodedNode::Null),
            Category::NullObject => self.encode_tracked(Subject::Keyed(IdentityKey::NullObject), mode, |_| {
                Ok(EncodedNode::object("Null", Fields::new()))
            }),
            Category::Boolean(b) => Ok(EncodedNode::Bool(b)),
            Category::Number(n) => Ok(EncodedNode::Number(n)),
            Category::Inline(Inline::Text(text)) => Ok(EncodedNode::String(text.to_string())),
            Category::Inline(Inline::List(items)) => self.encode_elements("List", items),
            Category::Compact(compact, subject) => self.encode_tracked(subject, mode, |_| Ok(compact.materialize())),
            Category::Collection(collection, subject) => {
                self.encode_tracked(subject, mode, |this| this.materialize_collection(collection))
            }
            Category::Object(object, subject) => {
                self.encode_tracked(subject, mode, |this| this.materialize_object(object))
            }
        }
    }

    /// Resolve an identity for `subject` and return a reference to it,
    /// materializing the node on the first unconditional visit.
    fn encode_tracked<F>(&mut self, subject: Subject, mode: Mode, materialize: F) -> Result<EncodedNode>
    where
        F: FnOnce(&mut Self) -> Result<EncodedNode>,
    {
        let (id, start) = match self.tracker.resolve(subject, mode) {
            Resolution::NullLiteral => return Ok(EncodedNode::Null),
            Resolution::NewSlot(id) => (id, mode == Mode::Unconditional),
            Resolution::ExistingReference(id) => (id, mode == Mode::Unconditional && self.tracker.begin(id)),
        };
        self.resolver.record(self.owners.last().copied(), id, mode);

        if start {
            self.owners.push(id);
            let node = materialize(self);
            self.owners.pop();
            self.tracker.materialize(id, node?);
        }
        Ok(EncodedNode::Reference(id))
    }

    fn materialize_collection(&mut self, collection: Collection<'_>) -> Result<EncodedNode> {
        match collection {
            Collection::List(items) | Collection::Set(items) => self.encode_elements(collection.type_tag(), items),
            Collection::Map(pairs) => {
                let mut nodes = Vec::with_capacity(pairs.len() * 2 + 1);
                nodes.push(EncodedNode::String(collection.type_tag().to_string()));
                for (index, (key, value)) in pairs.iter().enumerate() {
                    self.path.push_index(index);
                    let pair = self.encode_pair(key, value);
                    self.path.pop();
                    let (k, v) = pair?;
                    nodes.push(k);
                    nodes.push(v);
                }
                Ok(EncodedNode::Array(nodes))
            }
        }
    }

    fn encode_pair(&mut self, key: &Value, value: &Value) -> Result<(EncodedNode, EncodedNode)> {
        let key = self.encode_node(key, Mode::Unconditional)?;
        Ok((key, self.encode_node(value, Mode::Unconditional)?))
    }

    /// `[tag, e0, e1, ...]`; elements are always unconditional.
    fn encode_elements(&mut self, tag: &str, items: &[Value]) -> Result<EncodedNode> {
        let mut nodes = Vec::with_capacity(items.len() + 1);
        nodes.push(EncodedNode::String(tag.to_string()));
        for (index, item) in items.iter().enumerate() {
            self.path.push_index(index);
            let node = self.encode_node(item, Mode::Unconditional);
            self.path.pop();
            nodes.push(node?);
        }
        Ok(EncodedNode::Array(nodes))
    }

    fn materialize_object(&mut self, object: &dyn Encodable) -> Result<EncodedNode> {
        let mut coder = ObjectCoder::new(self);
        let outcome = object.encode(&mut coder);
        let fields = coder.into_fields();
        outcome.map_err(|err| err.at(&self.path))?;
        // a callback may swallow an error it received from the coder
        self.ensure_active()?;
        Ok(EncodedNode::object(object.type_tag(), fields))
    }

    fn misuse(&mut self, key: Option<&str>, reason: impl Into<String>) -> ArchiveError {
        let mut path = KeyPath::new();
        if let Some(key) = key {
            path.push_key(key);
        }
        self.fail(ArchiveError::misuse(path, reason))
    }
}

/// Keyed encodes on the session itself add named roots.
impl Coder for Archiver<'_> {
    fn encode_value<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()> {
        self.ensure_active()?;
        if is_reserved_key(key) {
            return Err(self.misuse(Some(key), format!("root key `{key}` uses the reserved `$` prefix")));
        }
        self.add_root(RootKey::Key(key.to_string()), value.into())
    }

    fn encode_conditional<V: Into<Value>>(&mut self, key: &str, _value: V) -> Result<()> {
        self.ensure_active()?;
        let reason = if self.builder.is_empty() {
            "conditional encode before any root was established"
        } else {
            "roots cannot be encoded conditionally"
        };
        Err(self.misuse(Some(key), reason))
    }

    fn decode_value(&mut self, key: &str) -> Result<Value> {
        let mut path = KeyPath::new();
        path.push_key(key);
        Err(self.fail(ArchiveError::unsupported("decode_value", path)))
    }

    fn contains_value(&mut self, key: &str) -> Result<bool> {
        let mut path = KeyPath::new();
        path.push_key(key);
        Err(self.fail(ArchiveError::unsupported("contains_value", path)))
    }

    fn set_decoding_failure_policy(&mut self, _policy: DecodingFailurePolicy) -> Result<()> {
        Err(self.fail(ArchiveError::unsupported("set_decoding_failure_policy", KeyPath::new())))
    }
}

impl std::fmt::Debug for Archiver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver")
            .field("config", &self.config)
            .field("identities", &self.tracker.len())
            .field("roots", &self.builder.len())
            .field("failure", &self.failure)
            .finish()
    }
}
