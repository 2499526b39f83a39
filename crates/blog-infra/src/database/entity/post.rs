//! Post entity for SeaORM.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

use blog_core::domain::{Post, PostId};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for Post {
    fn from(model: Model) -> Self {
        Post::hydrate(
            PostId::new(model.id),
            model.title,
            model.body,
            model.created_at.into(),
            model.updated_at.into(),
        )
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
///
/// A transient post leaves `id` unset so the database assigns it. Missing
/// timestamps default to the current time.
impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        let now = Utc::now();
        Self {
            id: post.id().map_or(NotSet, |id| Set(id.value())),
            created_at: Set(post.created_at().unwrap_or(now).into()),
            updated_at: Set(post.updated_at().unwrap_or(now).into()),
            title: Set(post.title),
            body: Set(post.body),
        }
    }
}
