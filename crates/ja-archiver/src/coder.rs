//! Encode surface shared by the session and the per-object coder.

use crate::archiver::Archiver;
use crate::identity::Mode;
use ja_core::{is_reserved_key, ArchiveError, Fields, Result, Value};

/// Failure policies of a decoding archive. Accepted only so the call can be
/// rejected: archives are write-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodingFailurePolicy {
    RaiseException,
    SetErrorAndReturn,
}

/// Keyed encode calls.
///
/// The decode-side methods exist so that misuse fails loudly; each one
/// returns a Misuse error and aborts the session.
pub trait Coder {
    fn encode_value<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()>;

    /// Emit `value` only if some other referrer holds it unconditionally;
    /// otherwise the field ends up `null`.
    fn encode_conditional<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()>;

    fn encode_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.encode_value(key, value)
    }

    fn encode_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.encode_value(key, value)
    }

    fn encode_float(&mut self, key: &str, value: f64) -> Result<()> {
        self.encode_value(key, value)
    }

    fn decode_value(&mut self, key: &str) -> Result<Value>;

    fn contains_value(&mut self, key: &str) -> Result<bool>;

    fn set_decoding_failure_policy(&mut self, policy: DecodingFailurePolicy) -> Result<()>;
}

/// Handle given to [`Encodable::encode`](crate::Encodable::encode); collects
/// the fields of one object.
pub struct ObjectCoder<'a, 'g> {
    archiver: &'a mut Archiver<'g>,
    fields: Fields,
}

impl<'a, 'g> ObjectCoder<'a, 'g> {
    pub(crate) fn new(archiver: &'a mut Archiver<'g>) -> Self {
        Self {
            archiver,
            fields: Fields::new(),
        }
    }

    pub(crate) fn into_fields(self) -> Fields {
        self.fields
    }

    /// Fields encoded so far.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    fn encode_field(&mut self, key: &str, value: Value, mode: Mode) -> Result<()> {
        self.archiver.ensure_active()?;
        if is_reserved_key(key) {
            let mut path = self.archiver.path().clone();
            path.push_key(key);
            let err = ArchiveError::misuse(path, format!("field key `{key}` uses the reserved `$` prefix"));
            return Err(self.archiver.fail(err));
        }

        let node = self.archiver.encode_at(key, &value, mode)?;
        if node.is_null() && self.archiver.config().omit_nulls {
            self.fields.remove(key);
            return Ok(());
        }
        if self.fields.insert(key, node).is_some() {
            tracing::warn!(key, path = %self.archiver.path(), "field encoded twice, keeping the last value");
        }
        Ok(())
    }

    fn reject(&mut self, operation: &'static str, key: Option<&str>) -> ArchiveError {
        let mut path = self.archiver.path().clone();
        if let Some(key) = key {
            path.push_key(key);
        }
        self.archiver.fail(ArchiveError::unsupported(operation, path))
    }
}

impl Coder for ObjectCoder<'_, '_> {
    fn encode_value<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()> {
        self.encode_field(key, value.into(), Mode::Unconditional)
    }

    fn encode_conditional<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<()> {
        self.encode_field(key, value.into(), Mode::Conditional)
    }

    fn decode_value(&mut self, key: &str) -> Result<Value> {
        Err(self.reject("decode_value", Some(key)))
    }

    fn contains_value(&mut self, key: &str) -> Result<bool> {
        Err(self.reject("contains_value", Some(key)))
    }

    fn set_decoding_failure_policy(&mut self, _policy: DecodingFailurePolicy) -> Result<()> {
        Err(self.reject("set_decoding_failure_policy", None))
    }
}

impl std::fmt::Debug for ObjectCoder<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCoder")
            .field("path", self.archiver.path())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

