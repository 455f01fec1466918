//! Errors raised by the sync engine

use thiserror::Error;

use crate::storage::NodeKind;

pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// Why a reconciliation was rejected
///
/// Every variant names the entity kind and the natural key involved so the
/// caller can tell which part of the submitted tree to fix.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A referenced natural key does not resolve in the expected scope
    #[error("{kind} '{key}' not found")]
    NotFound { kind: NodeKind, key: String },

    /// The requested state would break a uniqueness invariant
    #[error("{kind} '{key}' conflicts: {reason}")]
    Conflict {
        kind: NodeKind,
        key: String,
        reason: String,
    },

    /// The stored graph breaks an invariant the engine relies on
    #[error("inconsistent {kind} '{key}': {reason}")]
    InconsistentState {
        kind: NodeKind,
        key: String,
        reason: String,
    },

    #[error("storage error: {0}")]
    Store(#[from] anyhow::Error),
}

impl SyncError {
    pub fn not_found(kind: NodeKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn conflict(kind: NodeKind, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn inconsistent(kind: NodeKind, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InconsistentState {
            kind,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(err.into())
    }
}
