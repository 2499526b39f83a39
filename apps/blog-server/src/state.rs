//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::PostController;
use blog_core::ports::{CsrfTokenManager, PostRepository};
use blog_infra::{DatabaseConfig, HmacCsrfTokenManager, InMemoryPostRepository};

#[cfg(feature = "postgres")]
use blog_infra::PostgresPostRepository;

use crate::view::Views;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// List, create and edit. Deletes go through [`AppState::posts_for_client`].
    pub posts: PostController,
    pub repository: Arc<dyn PostRepository>,
    pub views: Arc<Views>,
    csrf: HmacCsrfTokenManager,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(db_config: Option<&DatabaseConfig>, views: Views) -> Self {
        let repository = Self::repository(db_config).await;

        tracing::info!("Application state initialized");

        Self::with_parts(repository, HmacCsrfTokenManager::from_env(), views)
    }

    /// Assemble state from ready-made collaborators.
    pub fn with_parts(
        repository: Arc<dyn PostRepository>,
        csrf: HmacCsrfTokenManager,
        views: Views,
    ) -> Self {
        let unbound: Arc<dyn CsrfTokenManager> = Arc::new(csrf.clone());
        Self {
            posts: PostController::new(repository.clone(), unbound),
            repository,
            views: Arc::new(views),
            csrf,
        }
    }

    /// Controller whose delete tokens are bound to one client's nonce.
    pub fn posts_for_client(&self, nonce: &str) -> PostController {
        self.posts.with_csrf(Arc::new(self.csrf.for_client(nonce)))
    }

    #[cfg(feature = "postgres")]
    async fn repository(db_config: Option<&DatabaseConfig>) -> Arc<dyn PostRepository> {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryPostRepository::new());
        };

        match blog_infra::database::connect(config).await {
            Ok(conn) => Arc::new(PostgresPostRepository::new(conn)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryPostRepository::new())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repository(_db_config: Option<&DatabaseConfig>) -> Arc<dyn PostRepository> {
        tracing::info!("Running without postgres feature - using in-memory repository");
        Arc::new(InMemoryPostRepository::new())
    }
}
