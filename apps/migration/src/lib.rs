//! Schema migrations, applied by the server at start-up or by the
//! `migration` CLI.

pub use sea_orm_migration::prelude::*;

mod m20240501_000001_create_blog_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240501_000001_create_blog_tables::Migration)]
    }
}
