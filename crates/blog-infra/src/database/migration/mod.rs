//! Schema migrations.

use sea_orm_migration::prelude::*;

mod m20241019_000001_create_posts_table;

/// Runs every blog migration in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20241019_000001_create_posts_table::Migration)]
    }
}
