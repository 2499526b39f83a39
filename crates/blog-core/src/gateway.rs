//! Persistence gateway - a per-request unit of work over a [`PostRepository`].
//!
//! Posts loaded through the gateway are *managed*: callers receive a shared
//! [`ManagedPost`] handle, mutate it in place, and the gateway notices the
//! change on [`PostGateway::flush`]. New posts are staged with
//! [`PostGateway::persist`] and deletions with [`PostGateway::remove`];
//! nothing reaches the store until `flush` commits the whole change set.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};

use crate::domain::{Post, PostId};
use crate::error::{ControllerError, PersistenceError};
use crate::ports::{ChangeSet, PostRepository};

/// Shared handle to a post tracked by a [`PostGateway`].
///
/// Clones point at the same instance.
#[derive(Debug, Clone)]
pub struct ManagedPost(Arc<Mutex<Post>>);

impl ManagedPost {
    pub fn new(post: Post) -> Self {
        Self(Arc::new(Mutex::new(post)))
    }

    /// Lock the post for reading or in-place mutation.
    ///
    /// The guard must not be held across an await point.
    pub fn lock(&self) -> MutexGuard<'_, Post> {
        self.0.lock()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Post {
        self.0.lock().clone()
    }

    pub fn id(&self) -> Option<PostId> {
        self.0.lock().id()
    }

    /// Whether both handles refer to the same instance.
    pub fn same_instance(&self, other: &ManagedPost) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

struct Tracked {
    handle: ManagedPost,
    /// State as last loaded from or written to the store.
    original: Post,
}

/// Unit of work for one request.
pub struct PostGateway {
    repository: Arc<dyn PostRepository>,
    identity_map: BTreeMap<PostId, Tracked>,
    scheduled_inserts: Vec<ManagedPost>,
    scheduled_removals: BTreeSet<PostId>,
}

impl PostGateway {
    pub fn new(repository: Arc<dyn PostRepository>) -> Self {
        Self {
            repository,
            identity_map: BTreeMap::new(),
            scheduled_inserts: Vec::new(),
            scheduled_removals: BTreeSet::new(),
        }
    }

    /// All posts, in the order the repository returns them.
    ///
    /// Posts already managed by this gateway are reported in their current
    /// in-memory state.
    pub async fn find_all(&mut self) -> Result<Vec<Post>, PersistenceError> {
        let stored = self.repository.find_all().await?;

        Ok(stored
            .into_iter()
            .map(|post| match post.id() {
                Some(id) => self.track(id, post).snapshot(),
                None => post,
            })
            .collect())
    }

    /// Find a post by id. Repeated lookups return the same managed instance.
    pub async fn find(&mut self, id: PostId) -> Result<Option<ManagedPost>, PersistenceError> {
        if let Some(tracked) = self.identity_map.get(&id) {
            return Ok(Some(tracked.handle.clone()));
        }

        let found = self.repository.find_by_id(id).await?;
        Ok(found.map(|post| self.track(id, post)))
    }

    /// Resolve a route identifier into a managed post, or fail with NotFound.
    pub async fn require(&mut self, id: PostId) -> Result<ManagedPost, ControllerError> {
        self.find(id)
            .await?
            .ok_or_else(|| ControllerError::post_not_found(id))
    }

    /// Stage a new post for insertion.
    ///
    /// Persisting an already managed or already staged post changes nothing.
    pub fn persist(&mut self, post: &ManagedPost) {
        if let Some(id) = post.id() {
            if !self.identity_map.contains_key(&id) {
                tracing::warn!(post_id = %id, "Ignoring persist of a post not loaded by this gateway");
            }
            return;
        }

        if self.scheduled_inserts.iter().any(|p| p.same_instance(post)) {
            return;
        }

        self.scheduled_inserts.push(post.clone());
    }

    /// Stage a post for deletion.
    pub fn remove(&mut self, post: &ManagedPost) {
        match post.id() {
            Some(id) => {
                self.scheduled_removals.insert(id);
            }
            None => self.scheduled_inserts.retain(|p| !p.same_instance(post)),
        }
    }

    /// Number of staged or detected changes that the next flush would commit.
    pub fn pending_changes(&self) -> usize {
        self.change_set().len()
    }

    /// Commit every staged change as one unit of work.
    ///
    /// When the store rejects the commit nothing is committed and the staged
    /// changes are kept. Once the store has committed, the staged changes are
    /// cleared even if the returned ids do not match the inserts.
    pub async fn flush(&mut self) -> Result<(), PersistenceError> {
        let mut changes = self.change_set();
        if changes.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        for post in &mut changes.inserts {
            post.stamp_created(now);
        }
        for post in &mut changes.updates {
            post.stamp_updated(now);
        }

        tracing::debug!(
            inserts = changes.inserts.len(),
            updates = changes.updates.len(),
            deletes = changes.deletes.len(),
            "Flushing unit of work"
        );

        let inserted = changes.inserts.clone();
        let updated = changes.updates.clone();
        let removed = changes.deletes.clone();

        let ids = self.repository.commit(changes).await?;

        // The store has committed; nothing staged may be sent again.
        let handles = std::mem::take(&mut self.scheduled_inserts);
        for id in &removed {
            self.identity_map.remove(id);
        }
        self.scheduled_removals.clear();

        for post in updated {
            if let Some(id) = post.id() {
                if let Some(tracked) = self.identity_map.get_mut(&id) {
                    tracked.handle.lock().stamp_updated(now);
                    tracked.original = post;
                }
            }
        }

        if ids.len() != inserted.len() {
            tracing::error!(
                expected = inserted.len(),
                returned = ids.len(),
                "Store returned a mismatched id count; inserted posts are no longer tracked"
            );
            return Err(PersistenceError::Query(format!(
                "store returned {} ids for {} inserts",
                ids.len(),
                inserted.len()
            )));
        }

        for ((handle, mut post), id) in handles.into_iter().zip(inserted).zip(ids) {
            post.assign_id(id);
            {
                let mut current = handle.lock();
                current.assign_id(id);
                current.stamp_created(now);
            }
            self.identity_map.insert(
                id,
                Tracked {
                    handle,
                    original: post,
                },
            );
        }

        Ok(())
    }

    fn track(&mut self, id: PostId, post: Post) -> ManagedPost {
        self.identity_map
            .entry(id)
            .or_insert_with(|| Tracked {
                handle: ManagedPost::new(post.clone()),
                original: post,
            })
            .handle
            .clone()
    }

    fn change_set(&self) -> ChangeSet {
        let inserts = self
            .scheduled_inserts
            .iter()
            .map(ManagedPost::snapshot)
            .collect();

        let updates = self
            .identity_map
            .iter()
            .filter(|(id, _)| !self.scheduled_removals.contains(*id))
            .filter_map(|(_, tracked)| {
                let current = tracked.handle.snapshot();
                current.content_differs(&tracked.original).then_some(current)
            })
            .collect();

        ChangeSet {
            inserts,
            updates,
            deletes: self.scheduled_removals.iter().copied().collect(),
        }
    }
}
