//! SeaORM-backed post repository.
//!
//! Named after the production backend, but only relies on the generic
//! connection so it runs against any database SeaORM supports.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryOrder, TransactionTrait,
};

use blog_core::domain::{Post, PostId};
use blog_core::error::PersistenceError;
use blog_core::ports::{ChangeSet, PostRepository};

use super::entity::post::{self, Entity as PostEntity};

/// Post repository over a SeaORM connection pool.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

fn map_db_err(err: DbErr) -> PersistenceError {
    match err {
        DbErr::Conn(e) => PersistenceError::Connection(e.to_string()),
        DbErr::ConnectionAcquire(e) => PersistenceError::Connection(e.to_string()),
        other => {
            let err_str = other.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                PersistenceError::Constraint(err_str)
            } else {
                PersistenceError::Query(err_str)
            }
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, PersistenceError> {
        let result = PostEntity::find()
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        PostEntity::find().count(&self.db).await.map_err(map_db_err)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PersistenceError> {
        let result = PostEntity::find_by_id(id.value())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<PostId>, PersistenceError> {
        // Dropping the transaction without committing rolls it back.
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let mut ids = Vec::with_capacity(changes.inserts.len());
        for new_post in changes.inserts {
            let model = post::ActiveModel::from(new_post)
                .insert(&txn)
                .await
                .map_err(map_db_err)?;
            ids.push(PostId::new(model.id));
        }

        for changed in changes.updates {
            let Some(id) = changed.id() else {
                return Err(PersistenceError::Query(
                    "cannot update a post without an id".to_string(),
                ));
            };
            post::ActiveModel::from(changed)
                .update(&txn)
                .await
                .map_err(|e| match e {
                    DbErr::RecordNotUpdated => PersistenceError::NotFound(id),
                    other => map_db_err(other),
                })?;
        }

        for id in changes.deletes {
            let result = PostEntity::delete_by_id(id.value())
                .exec(&txn)
                .await
                .map_err(map_db_err)?;

            if result.rows_affected == 0 {
                return Err(PersistenceError::NotFound(id));
            }
        }

        txn.commit().await.map_err(map_db_err)?;

        tracing::debug!(inserted = ids.len(), "Post changes committed");
        Ok(ids)
    }
}
