//! Generic stored wrapper types
//!
//! - `Stored<Id, T>` - content with its ID and created_at
//! - `Editable<T>` - adds updated_at to content that is patched in place
//!
//! Catalog nodes are `Stored<NodeId, Editable<Node>>`.

use std::ops::Deref;

/// A stored entity wrapper that adds ID and creation timestamp to any content type.
///
/// Implements `Deref` to allow transparent access to the inner content.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<Id, T> {
    pub id: Id,
    pub content: T,
    /// Unix timestamp (milliseconds) when created
    pub created_at: i64,
}

impl<Id, T> Stored<Id, T> {
    pub fn new(id: Id, content: T, created_at: i64) -> Self {
        Self {
            id,
            content,
            created_at,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn into_content(self) -> T {
        self.content
    }
}

impl<Id, T> Deref for Stored<Id, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.content
    }
}

/// Wrapper for content that can be modified after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Editable<T> {
    pub content: T,
    /// Unix timestamp (milliseconds) when last updated
    pub updated_at: i64,
}

impl<T> Editable<T> {
    pub fn new(content: T, updated_at: i64) -> Self {
        Self { content, updated_at }
    }

    pub fn into_content(self) -> T {
        self.content
    }
}

impl<T> Deref for Editable<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.content
    }
}

/// Build a `Stored<Id, Editable<T>>` from its parts
pub fn stored_editable<Id, T>(id: Id, content: T, created_at: i64, updated_at: i64) -> Stored<Id, Editable<T>> {
    Stored::new(id, Editable::new(content, updated_at), created_at)
}
