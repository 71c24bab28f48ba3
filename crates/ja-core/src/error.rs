use crate::path::KeyPath;
use thiserror::Error;

/// Failure classes reported by the archiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value could not be classified, or its self-encoding failed.
    InvalidValue,
    /// The archiver was driven in a way it does not support.
    Misuse,
    /// A sink refused the finished bytes.
    Resource,
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid value at {path}: {reason}")]
    InvalidValue { path: KeyPath, reason: String },
    #[error("Encoding failed at {path}: {source}")]
    Callback {
        path: KeyPath,
        #[source]
        source: anyhow::Error,
    },
    #[error("Misuse at {path}: {reason}")]
    Misuse { path: KeyPath, reason: String },
    #[error("Unsupported operation `{operation}` at {path}: archives are write-only")]
    Unsupported {
        operation: &'static str,
        path: KeyPath,
    },
    #[error("Session aborted by an earlier failure: {0}")]
    Aborted(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ArchiveError {
    /// Invalid value with no location yet; the session fills in the path.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: KeyPath::new(),
            reason: reason.into(),
        }
    }

    pub fn misuse(path: KeyPath, reason: impl Into<String>) -> Self {
        Self::Misuse {
            path,
            reason: reason.into(),
        }
    }

    pub fn unsupported(operation: &'static str, path: KeyPath) -> Self {
        Self::Unsupported { operation, path }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidValue { .. } | Self::Callback { .. } | Self::Other(_) => {
                ErrorKind::InvalidValue
            }
            Self::Misuse { .. } | Self::Unsupported { .. } | Self::Aborted(_) => ErrorKind::Misuse,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Resource,
        }
    }

    pub fn path(&self) -> Option<&KeyPath> {
        match self {
            Self::InvalidValue { path, .. }
            | Self::Callback { path, .. }
            | Self::Misuse { path, .. }
            | Self::Unsupported { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Attach `path` to an error raised without one.
    ///
    /// Errors that already carry a location keep it: the deepest failure
    /// point is the most useful one.
    pub fn at(self, path: &KeyPath) -> Self {
        match self {
            Self::InvalidValue { path: p, reason } if p.is_empty() => Self::InvalidValue {
                path: path.clone(),
                reason,
            },
            Self::Other(source) => Self::Callback {
                path: path.clone(),
                source,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(keys: &[&str]) -> KeyPath {
        let mut path = KeyPath::new();
        for k in keys {
            path.push_key(*k);
        }
        path
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ArchiveError::invalid("x").kind(), ErrorKind::InvalidValue);
        assert_eq!(
            ArchiveError::misuse(KeyPath::new(), "x").kind(),
            ErrorKind::Misuse
        );
        assert_eq!(
            ArchiveError::unsupported("decode_value", KeyPath::new()).kind(),
            ErrorKind::Misuse
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(ArchiveError::from(io).kind(), ErrorKind::Resource);
    }

    #[test]
    fn test_at_fills_empty_path() {
        let err = ArchiveError::invalid("bad").at(&path_of(&["root", "child"]));
        assert_eq!(err.path().map(|p| p.to_string()).as_deref(), Some("root.child"));
    }

    #[test]
    fn test_at_keeps_deeper_path() {
        let err = ArchiveError::InvalidValue {
            path: path_of(&["root", "child", "leaf"]),
            reason: "bad".into(),
        }
        .at(&path_of(&["root"]));
        assert_eq!(err.path().unwrap().to_string(), "root.child.leaf");
    }

    #[test]
    fn test_at_wraps_foreign_error() {
        let err = ArchiveError::from(anyhow::anyhow!("invariant broken")).at(&path_of(&["a"]));
        assert!(matches!(err, ArchiveError::Callback { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(err.to_string().contains("invariant broken"));
        assert!(err.to_string().contains("at a"));
    }
}
