//! Identity tracker: one slot per logical object for the whole session.

use ja_core::{EncodedNode, Handle, Identity};
use std::collections::HashMap;

/// How a referrer holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unconditional,
    /// Kept only if some unconditional path reaches the same object.
    Conditional,
}

/// What identity is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Handle(Handle),
    /// The null-object sentinel; every occurrence is the same object.
    NullObject,
}

/// Value about to be resolved to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Nil,
    Keyed(IdentityKey),
    /// Owned value without a handle: a fresh object on every occurrence.
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    NullLiteral,
    ExistingReference(Identity),
    NewSlot(Identity),
}

/// `Pending → InProgress → Materialized → {Kept | Dropped}`; a pending slot
/// nobody materialized goes straight to `Dropped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    InProgress,
    Materialized,
    Kept,
    Dropped,
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub state: SlotState,
    pub node: Option<EncodedNode>,
    pub reached_unconditionally: bool,
    pub reached_conditionally: bool,
}

impl Slot {
    fn new(mode: Mode) -> Self {
        let mut slot = Self {
            state: SlotState::Pending,
            node: None,
            reached_unconditionally: false,
            reached_conditionally: false,
        };
        slot.mark(mode);
        slot
    }

    fn mark(&mut self, mode: Mode) {
        match mode {
            Mode::Unconditional => self.reached_unconditionally = true,
            Mode::Conditional => self.reached_conditionally = true,
        }
    }
}

#[derive(Debug, Default)]
pub struct IdentityTracker {
    slots: Vec<Slot>,
    keys: HashMap<IdentityKey, Identity>,
}

impl IdentityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create the slot for `subject` and record how it was reached.
    ///
    /// A new slot reached unconditionally is already `InProgress` on return,
    /// so self-references met while encoding its fields resolve to
    /// `ExistingReference`. A new slot reached conditionally stays `Pending`.
    pub fn resolve(&mut self, subject: Subject, mode: Mode) -> Resolution {
        let key = match subject {
            Subject::Nil => return Resolution::NullLiteral,
            Subject::Keyed(key) => Some(key),
            Subject::Anonymous => None,
        };

        if let Some(id) = key.and_then(|k| self.keys.get(&k).copied()) {
            if let Some(slot) = self.slot_mut(id) {
                slot.mark(mode);
            }
            return Resolution::ExistingReference(id);
        }

        let id = Identity::new(self.slots.len() as u64 + 1);
        let mut slot = Slot::new(mode);
        if mode == Mode::Unconditional {
            slot.state = SlotState::InProgress;
        }
        tracing::trace!(%id, ?mode, "slot created");
        self.slots.push(slot);
        if let Some(key) = key {
            self.keys.insert(key, id);
        }
        Resolution::NewSlot(id)
    }

    /// Promote a pending slot to `InProgress`. Returns `false` if the slot
    /// is already being (or has been) materialized.
    pub fn begin(&mut self, id: Identity) -> bool {
        match self.slot_mut(id) {
            Some(slot) if slot.state == SlotState::Pending => {
                slot.state = SlotState::InProgress;
                tracing::trace!(%id, "pending slot promoted");
                true
            }
            _ => false,
        }
    }

    /// Store the finished node of an `InProgress` slot.
    pub fn materialize(&mut self, id: Identity, node: EncodedNode) {
        if let Some(slot) = self.slot_mut(id) {
            debug_assert_eq!(slot.state, SlotState::InProgress, "slot {id} materialized twice");
            slot.node = Some(node);
            slot.state = SlotState::Materialized;
        }
    }

    /// Fix the final state of a slot. Only materialized slots can be kept.
    pub fn finalize(&mut self, id: Identity, keep: bool) -> SlotState {
        let Some(slot) = self.slot_mut(id) else {
            return SlotState::Dropped;
        };
        slot.state = if keep && slot.state == SlotState::Materialized {
            SlotState::Kept
        } else {
            slot.node = None;
            SlotState::Dropped
        };
        slot.state
    }

    pub fn slot(&self, id: Identity) -> Option<&Slot> {
        self.slots.get(Self::index(id)?)
    }

    fn slot_mut(&mut self, id: Identity) -> Option<&mut Slot> {
        self.slots.get_mut(Self::index(id)?)
    }

    pub fn state(&self, id: Identity) -> Option<SlotState> {
        self.slot(id).map(|s| s.state)
    }

    /// Move the node out of a kept slot.
    pub fn take_node(&mut self, id: Identity) -> Option<EncodedNode> {
        self.slot_mut(id)
            .filter(|s| s.state == SlotState::Kept)
            .and_then(|s| s.node.take())
    }

    pub fn identities(&self) -> impl Iterator<Item = Identity> + '_ {
        (1..=self.slots.len() as u64).map(Identity::new)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn index(id: Identity) -> Option<usize> {
        (id.get() as usize).checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: usize) -> Subject {
        Subject::Keyed(IdentityKey::Handle(Handle::from_index(n)))
    }

    fn id_of(resolution: Resolution) -> Identity {
        match resolution {
            Resolution::NewSlot(id) | Resolution::ExistingReference(id) => id,
            Resolution::NullLiteral => panic!("expected an identity"),
        }
    }

    #[test]
    fn test_nil_is_null_literal() {
        let mut tracker = IdentityTracker::new();
        assert_eq!(tracker.resolve(Subject::Nil, Mode::Unconditional), Resolution::NullLiteral);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_first_visit_is_in_progress() {
        let mut tracker = IdentityTracker::new();
        let r = tracker.resolve(key(0), Mode::Unconditional);
        assert_eq!(r, Resolution::NewSlot(Identity::new(1)));
        assert_eq!(tracker.state(Identity::new(1)), Some(SlotState::InProgress));
    }

    #[test]
    fn test_revisit_returns_same_identity() {
        let mut tracker = IdentityTracker::new();
        let first = id_of(tracker.resolve(key(7), Mode::Unconditional));
        let again = tracker.resolve(key(7), Mode::Unconditional);
        assert_eq!(again, Resolution::ExistingReference(first));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_identities_are_monotonic() {
        let mut tracker = IdentityTracker::new();
        let a = id_of(tracker.resolve(key(5), Mode::Unconditional));
        let b = id_of(tracker.resolve(Subject::Anonymous, Mode::Unconditional));
        let c = id_of(tracker.resolve(key(1), Mode::Unconditional));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_anonymous_never_shares() {
        let mut tracker = IdentityTracker::new();
        let a = tracker.resolve(Subject::Anonymous, Mode::Unconditional);
        let b = tracker.resolve(Subject::Anonymous, Mode::Unconditional);
        assert_ne!(id_of(a), id_of(b));
    }

    #[test]
    fn test_conditional_stays_pending_until_begin() {
        let mut tracker = IdentityTracker::new();
        let id = id_of(tracker.resolve(key(0), Mode::Conditional));
        let slot = tracker.slot(id).unwrap();
        assert_eq!(slot.state, SlotState::Pending);
        assert!(slot.reached_conditionally && !slot.reached_unconditionally);

        assert_eq!(tracker.resolve(key(0), Mode::Unconditional), Resolution::ExistingReference(id));
        assert!(tracker.slot(id).unwrap().reached_unconditionally);
        assert!(tracker.begin(id));
        assert!(!tracker.begin(id));
        assert_eq!(tracker.state(id), Some(SlotState::InProgress));
    }

    #[test]
    fn test_materialize_then_finalize() {
        let mut tracker = IdentityTracker::new();
        let id = id_of(tracker.resolve(key(0), Mode::Unconditional));
        tracker.materialize(id, EncodedNode::Bool(true));
        assert_eq!(tracker.state(id), Some(SlotState::Materialized));
        assert_eq!(tracker.finalize(id, true), SlotState::Kept);
        assert_eq!(tracker.take_node(id), Some(EncodedNode::Bool(true)));
        assert_eq!(tracker.take_node(id), None);
    }

    #[test]
    fn test_pending_cannot_be_kept() {
        let mut tracker = IdentityTracker::new();
        let id = id_of(tracker.resolve(key(0), Mode::Conditional));
        assert_eq!(tracker.finalize(id, true), SlotState::Dropped);
        assert_eq!(tracker.take_node(id), None);
    }

    #[test]
    fn test_null_object_key_is_shared() {
        let mut tracker = IdentityTracker::new();
        let null = Subject::Keyed(IdentityKey::NullObject);
        let a = id_of(tracker.resolve(null, Mode::Unconditional));
        let b = id_of(tracker.resolve(null, Mode::Unconditional));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_identity() {
        let tracker = IdentityTracker::new();
        assert!(tracker.state(Identity::new(0)).is_none());
        assert!(tracker.state(Identity::new(4)).is_none());
    }
}
