use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database-assigned identifier of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i32);

impl PostId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PostId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Post entity - represents a blog post.
///
/// A post starts out transient (no id). The id is assigned once, when the
/// first flush that inserts it commits, and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    id: Option<PostId>,
    pub title: String,
    pub body: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a new transient post.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Rebuild a durable post from its stored representation.
    pub fn hydrate(
        id: PostId,
        title: String,
        body: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            title,
            body,
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        }
    }

    pub fn id(&self) -> Option<PostId> {
        self.id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    /// Whether the user-editable fields differ from `other`.
    pub(crate) fn content_differs(&self, other: &Post) -> bool {
        self.title != other.title || self.body != other.body
    }

    pub(crate) fn assign_id(&mut self, id: PostId) {
        debug_assert!(self.id.is_none(), "post id assigned twice");
        if self.id.is_none() {
            self.id = Some(id);
        }
    }

    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    pub(crate) fn stamp_updated(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_post_is_transient() {
        let post = Post::new("Hello", "World");
        assert!(post.is_transient());
        assert_eq!(post.created_at(), None);
    }

    #[test]
    fn id_is_assigned_once() {
        let mut post = Post::default();
        post.assign_id(PostId::new(3));
        assert_eq!(post.id(), Some(PostId::new(3)));
    }

    #[test]
    fn serializes_id_as_bare_integer() {
        let now = Utc::now();
        let post = Post::hydrate(PostId::new(7), "t".into(), "b".into(), now, now);
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "t");
    }
}
