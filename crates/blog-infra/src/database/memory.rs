//! In-memory post repository - used when no database is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use blog_core::domain::{Post, PostId};
use blog_core::error::PersistenceError;
use blog_core::ports::{ChangeSet, PostRepository};

struct Store {
    rows: BTreeMap<PostId, Post>,
    next_id: i32,
}

/// Post repository backed by a `BTreeMap` behind an async `RwLock`.
///
/// Note: Data is lost on process restart.
pub struct InMemoryPostRepository {
    store: RwLock<Store>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, PersistenceError> {
        let store = self.store.read().await;
        Ok(store.rows.values().cloned().collect())
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        Ok(self.store.read().await.rows.len() as u64)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PersistenceError> {
        let store = self.store.read().await;
        Ok(store.rows.get(&id).cloned())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<PostId>, PersistenceError> {
        let mut store = self.store.write().await;

        // Check the whole change set before touching any row.
        for post in &changes.updates {
            match post.id() {
                Some(id) if store.rows.contains_key(&id) => {}
                Some(id) => return Err(PersistenceError::NotFound(id)),
                None => {
                    return Err(PersistenceError::Query(
                        "cannot update a post without an id".to_string(),
                    ));
                }
            }
        }
        if let Some(id) = changes.deletes.iter().find(|id| !store.rows.contains_key(id)) {
            return Err(PersistenceError::NotFound(*id));
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(changes.inserts.len());
        for post in changes.inserts {
            let id = PostId::new(store.next_id);
            store.next_id += 1;

            let created_at = post.created_at().unwrap_or(now);
            let updated_at = post.updated_at().unwrap_or(now);
            let stored = Post::hydrate(id, post.title, post.body, created_at, updated_at);
            store.rows.insert(id, stored);
            ids.push(id);
        }

        for post in changes.updates {
            if let Some(id) = post.id() {
                store.rows.insert(id, post);
            }
        }

        for id in changes.deletes {
            store.rows.remove(&id);
        }

        tracing::debug!(inserted = ids.len(), rows = store.rows.len(), "Post changes committed");
        Ok(ids)
    }
}
