//! Post request handler - list, create, edit and delete.
//!
//! Every operation works against a [`PostGateway`] opened for the current
//! request and answers with an [`Outcome`]: either a view to render or a
//! route to redirect to. Resolving `{id}` into a managed post happens before
//! `edit`/`delete` run (see [`PostGateway::require`]).

use std::sync::Arc;

use serde::Serialize;

use crate::domain::Post;
use crate::error::ControllerError;
use crate::form::{self, FormOutcome, FormView, PostForm, Submission};
use crate::gateway::{ManagedPost, PostGateway};
use crate::ports::{CsrfTokenManager, PostRepository, delete_intent};

/// Named route a handler can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    PostIndex,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::PostIndex => "/post",
        }
    }
}

/// View to render, with the values it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum View {
    Index { posts: Vec<Post> },
    New { form: FormView },
    Edit { form: FormView, post: Post },
    Delete { post: Post, csrf_token: String },
}

impl View {
    /// Template name of the view.
    pub fn name(&self) -> &'static str {
        match self {
            View::Index { .. } => "post/index.html.tera",
            View::New { .. } => "post/new.html.tera",
            View::Edit { .. } => "post/edit.html.tera",
            View::Delete { .. } => "post/delete.html.tera",
        }
    }
}

/// What the handler decided to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Render(View),
    Redirect(Route),
}

/// Handles the post routes.
#[derive(Clone)]
pub struct PostController {
    repository: Arc<dyn PostRepository>,
    csrf: Arc<dyn CsrfTokenManager>,
}

impl PostController {
    pub fn new(repository: Arc<dyn PostRepository>, csrf: Arc<dyn CsrfTokenManager>) -> Self {
        Self { repository, csrf }
    }

    /// Same store, different token manager (e.g. one bound to the client).
    pub fn with_csrf(&self, csrf: Arc<dyn CsrfTokenManager>) -> Self {
        Self {
            repository: self.repository.clone(),
            csrf,
        }
    }

    /// Open a unit of work for one request.
    pub fn gateway(&self) -> PostGateway {
        PostGateway::new(self.repository.clone())
    }

    /// GET /post
    pub async fn list(&self, gateway: &mut PostGateway) -> Result<Outcome, ControllerError> {
        let posts = gateway.find_all().await?;
        Ok(Outcome::Render(View::Index { posts }))
    }

    /// GET|POST /post/new
    pub async fn create(
        &self,
        gateway: &mut PostGateway,
        submission: Submission<PostForm>,
    ) -> Result<Outcome, ControllerError> {
        match form::bind(Post::default(), submission) {
            FormOutcome::Valid(post) => {
                let post = ManagedPost::new(post);
                gateway.persist(&post);
                gateway.flush().await?;

                if let Some(id) = post.id() {
                    tracing::info!(post_id = %id, "Post created");
                }
                Ok(Outcome::Redirect(Route::PostIndex))
            }
            outcome => Ok(Outcome::Render(View::New {
                form: outcome.into_view(),
            })),
        }
    }

    /// GET|POST /post/{id}/edit
    pub async fn edit(
        &self,
        gateway: &mut PostGateway,
        post: &ManagedPost,
        submission: Submission<PostForm>,
    ) -> Result<Outcome, ControllerError> {
        match form::bind(post.snapshot(), submission) {
            FormOutcome::Valid(bound) => {
                {
                    let mut current = post.lock();
                    current.title = bound.title;
                    current.body = bound.body;
                }
                gateway.flush().await?;

                if let Some(id) = post.id() {
                    tracing::info!(post_id = %id, "Post updated");
                }
                Ok(Outcome::Redirect(Route::PostIndex))
            }
            outcome => Ok(Outcome::Render(View::Edit {
                form: outcome.into_view(),
                post: post.snapshot(),
            })),
        }
    }

    /// GET|POST /post/delete/{id}
    ///
    /// A missing or forged token renders the confirmation page again; it is
    /// never reported as an error.
    pub async fn delete(
        &self,
        gateway: &mut PostGateway,
        post: &ManagedPost,
        submitted_token: Option<&str>,
    ) -> Result<Outcome, ControllerError> {
        let snapshot = post.snapshot();
        let intent = match snapshot.id() {
            Some(id) => delete_intent(id),
            None => {
                return Ok(Outcome::Render(View::Delete {
                    csrf_token: String::new(),
                    post: snapshot,
                }));
            }
        };

        let authorized = submitted_token
            .map(|token| self.csrf.is_token_valid(&intent, token))
            .unwrap_or(false);

        if authorized {
            gateway.remove(post);
            gateway.flush().await?;

            if let Some(id) = snapshot.id() {
                tracing::info!(post_id = %id, "Post deleted");
            }
            return Ok(Outcome::Redirect(Route::PostIndex));
        }

        if submitted_token.is_some() {
            tracing::debug!(intent = %intent, "Rejected delete token");
        }

        Ok(Outcome::Render(View::Delete {
            csrf_token: self.csrf.token(&intent),
            post: snapshot,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::domain::PostId;
    use crate::error::PersistenceError;
    use crate::ports::ChangeSet;

    #[derive(Default)]
    struct MemoryRepository {
        rows: RwLock<BTreeMap<PostId, Post>>,
        fail_commits: bool,
    }

    #[async_trait]
    impl PostRepository for MemoryRepository {
        async fn find_all(&self) -> Result<Vec<Post>, PersistenceError> {
            Ok(self.rows.read().await.values().cloned().collect())
        }

        async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PersistenceError> {
            Ok(self.rows.read().await.get(&id).cloned())
        }

        async fn commit(&self, changes: ChangeSet) -> Result<Vec<PostId>, PersistenceError> {
            if self.fail_commits {
                return Err(PersistenceError::Query("disk full".into()));
            }
            let mut rows = self.rows.write().await;
            let mut ids = Vec::new();
            for mut post in changes.inserts {
                let id = PostId::new(rows.keys().last().map_or(1, |id| id.value() + 1));
                post.assign_id(id);
                rows.insert(id, post);
                ids.push(id);
            }
            for post in changes.updates {
                if let Some(id) = post.id() {
                    rows.insert(id, post);
                }
            }
            for id in changes.deletes {
                rows.remove(&id);
            }
            Ok(ids)
        }
    }

    /// Accepts exactly `"token:" + intent`.
    struct PlainCsrf;

    impl CsrfTokenManager for PlainCsrf {
        fn token(&self, intent: &str) -> String {
            format!("token:{intent}")
        }

        fn is_token_valid(&self, intent: &str, token: &str) -> bool {
            token == self.token(intent)
        }
    }

    fn controller_with(repository: MemoryRepository) -> PostController {
        PostController::new(Arc::new(repository), Arc::new(PlainCsrf))
    }

    fn controller() -> PostController {
        controller_with(MemoryRepository::default())
    }

    fn submitted(title: &str, body: &str) -> Submission<PostForm> {
        Submission::Submitted(PostForm {
            title: title.into(),
            body: body.into(),
        })
    }

    async fn list(controller: &PostController) -> Vec<Post> {
        let mut gateway = controller.gateway();
        match controller.list(&mut gateway).await.unwrap() {
            Outcome::Render(View::Index { posts }) => posts,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    async fn create(controller: &PostController, title: &str, body: &str) -> PostId {
        let mut gateway = controller.gateway();
        let outcome = controller
            .create(&mut gateway, submitted(title, body))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::PostIndex));
        list(controller)
            .await
            .last()
            .and_then(Post::id)
            .expect("created post is listed")
    }

    #[tokio::test]
    async fn create_get_renders_empty_form() {
        let controller = controller();
        let mut gateway = controller.gateway();

        let outcome = controller
            .create(&mut gateway, Submission::NotSubmitted)
            .await
            .unwrap();

        let Outcome::Render(View::New { form }) = outcome else {
            panic!("expected the new form");
        };
        assert!(!form.submitted);
        assert!(form.errors.is_empty());
    }

    #[tokio::test]
    async fn valid_create_is_listed_with_an_id() {
        let controller = controller();
        let id = create(&controller, "Hello", "World").await;

        let posts = list(&controller).await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id(), Some(id));
        assert_eq!(posts[0].title, "Hello");
        assert_eq!(posts[0].body, "World");
    }

    #[tokio::test]
    async fn invalid_create_changes_nothing() {
        let controller = controller();
        create(&controller, "Existing", "").await;
        let before = list(&controller).await;

        let mut gateway = controller.gateway();
        let outcome = controller
            .create(&mut gateway, submitted("", "orphan body"))
            .await
            .unwrap();

        let Outcome::Render(View::New { form }) = outcome else {
            panic!("expected the form to be shown again");
        };
        assert!(form.submitted);
        assert_eq!(form.values.body, "orphan body");
        assert!(!form.errors.field("title").is_empty());
        assert_eq!(list(&controller).await, before);
    }

    #[tokio::test]
    async fn valid_edit_keeps_id() {
        let controller = controller();
        let id = create(&controller, "Hello", "World").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        let outcome = controller
            .edit(&mut gateway, &post, submitted("Hello2", "World"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::PostIndex));

        let mut gateway = controller.gateway();
        let stored = gateway.require(id).await.unwrap().snapshot();
        assert_eq!(stored.id(), Some(id));
        assert_eq!(stored.title, "Hello2");
        assert_eq!(stored.body, "World");
        assert!(stored.updated_at() >= stored.created_at());
    }

    #[tokio::test]
    async fn invalid_edit_renders_form_and_keeps_stored_post() {
        let controller = controller();
        let id = create(&controller, "Original", "Text").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        let outcome = controller
            .edit(&mut gateway, &post, submitted(" ", "Changed"))
            .await
            .unwrap();

        let Outcome::Render(View::Edit { form, post }) = outcome else {
            panic!("expected the edit form");
        };
        assert_eq!(post.title, "Original");
        assert_eq!(form.values.body, "Changed");
        assert_eq!(gateway.pending_changes(), 0);

        let stored = controller.gateway().require(id).await.unwrap().snapshot();
        assert_eq!(stored.body, "Text");
    }

    #[tokio::test]
    async fn edit_get_prefills_form() {
        let controller = controller();
        let id = create(&controller, "Prefilled", "Body").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        let outcome = controller
            .edit(&mut gateway, &post, Submission::NotSubmitted)
            .await
            .unwrap();

        let Outcome::Render(View::Edit { form, .. }) = outcome else {
            panic!("expected the edit form");
        };
        assert_eq!(form.values.title, "Prefilled");
        assert!(!form.submitted);
    }

    #[tokio::test]
    async fn delete_without_token_shows_confirmation() {
        let controller = controller();
        let id = create(&controller, "Keep", "me").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        let outcome = controller.delete(&mut gateway, &post, None).await.unwrap();

        let Outcome::Render(View::Delete { csrf_token, .. }) = outcome else {
            panic!("expected the confirmation page");
        };
        assert_eq!(csrf_token, format!("token:delete{id}"));
        assert_eq!(list(&controller).await.len(), 1);
    }

    #[tokio::test]
    async fn delete_with_wrong_token_is_a_no_op() {
        let controller = controller();
        let id = create(&controller, "Keep", "me").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        let forged = controller
            .delete(&mut gateway, &post, Some("wrong"))
            .await
            .unwrap();
        let first_visit = controller.delete(&mut gateway, &post, None).await.unwrap();

        assert_eq!(forged, first_visit);
        let posts = list(&controller).await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id(), Some(id));
    }

    #[tokio::test]
    async fn delete_token_is_scoped_to_one_post() {
        let controller = controller();
        let first = create(&controller, "First", "").await;
        let second = create(&controller, "Second", "").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(second).await.unwrap();
        let token = format!("token:delete{first}");
        let outcome = controller
            .delete(&mut gateway, &post, Some(&token))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Render(View::Delete { .. })));
        assert_eq!(list(&controller).await.len(), 2);
    }

    /// Accepts exactly `"other:" + intent`.
    struct OtherCsrf;

    impl CsrfTokenManager for OtherCsrf {
        fn token(&self, intent: &str) -> String {
            format!("other:{intent}")
        }

        fn is_token_valid(&self, intent: &str, token: &str) -> bool {
            token == self.token(intent)
        }
    }

    #[tokio::test]
    async fn with_csrf_shares_the_store_but_not_the_tokens() {
        let controller = controller();
        let id = create(&controller, "Shared", "").await;
        let other = controller.with_csrf(Arc::new(OtherCsrf));

        let mut gateway = other.gateway();
        let post = gateway.require(id).await.unwrap();
        let plain = format!("token:delete{id}");
        let outcome = other.delete(&mut gateway, &post, Some(&plain)).await.unwrap();
        let Outcome::Render(View::Delete { csrf_token, .. }) = outcome else {
            panic!("expected the confirmation page");
        };
        assert_eq!(csrf_token, format!("other:delete{id}"));

        let outcome = other
            .delete(&mut gateway, &post, Some(&csrf_token))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::PostIndex));
        assert!(list(&controller).await.is_empty());
    }

    #[tokio::test]
    async fn create_edit_delete_scenario() {
        let controller = controller();
        let id = create(&controller, "Hello", "World").await;

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        controller
            .edit(&mut gateway, &post, submitted("Hello2", "World"))
            .await
            .unwrap();
        assert_eq!(
            controller.gateway().require(id).await.unwrap().snapshot().title,
            "Hello2"
        );

        let mut gateway = controller.gateway();
        let post = gateway.require(id).await.unwrap();
        let token = format!("token:delete{id}");
        let outcome = controller
            .delete(&mut gateway, &post, Some(&token))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::PostIndex));

        let err = controller.gateway().require(id).await.unwrap_err();
        assert!(matches!(err, ControllerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn failed_commit_propagates() {
        let controller = controller_with(MemoryRepository {
            fail_commits: true,
            ..MemoryRepository::default()
        });
        let mut gateway = controller.gateway();

        let err = controller
            .create(&mut gateway, submitted("Hello", "World"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ControllerError::Persistence(PersistenceError::Query(_))
        ));
        assert!(list(&controller).await.is_empty());
    }
}
