pub use sea_orm_migration::prelude::*;

mod m20240501_000000_create_schema;
mod m20240501_000001_create_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240501_000000_create_schema::Migration),
            Box::new(m20240501_000001_create_users::Migration),
        ]
    }
}
