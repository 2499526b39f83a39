//! Migration CLI tool.
//!
//! Reads `DATABASE_URL` and applies or reverts the blog schema, e.g.
//! `migration up`, `migration down`, `migration status`. The CLI installs its
//! own log subscriber.

use blog_infra::database::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
