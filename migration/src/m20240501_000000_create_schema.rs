use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS google_signin;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO google_signin, public;")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CASCADE removes every table created in the schema by later migrations
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS google_signin CASCADE;")
            .await?;

        Ok(())
    }
}
