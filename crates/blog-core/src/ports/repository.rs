use async_trait::async_trait;

use crate::domain::{Post, PostId};
use crate::error::PersistenceError;

/// Every change staged by one flush.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// New posts, in staging order. Ids are assigned by the store.
    pub inserts: Vec<Post>,
    /// Durable posts whose fields changed.
    pub updates: Vec<Post>,
    pub deletes: Vec<PostId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }
}

/// Post storage - abstraction over the ORM-backed store.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All stored posts, in the store's natural order.
    async fn find_all(&self) -> Result<Vec<Post>, PersistenceError>;

    /// Number of stored posts.
    async fn count(&self) -> Result<u64, PersistenceError> {
        Ok(self.find_all().await?.len() as u64)
    }

    /// Find a post by its id.
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PersistenceError>;

    /// Apply a change set as a single unit of work.
    ///
    /// Returns the ids assigned to `changes.inserts`, in the same order.
    /// Either every change takes effect or none does.
    async fn commit(&self, changes: ChangeSet) -> Result<Vec<PostId>, PersistenceError>;
}
