use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // google_id is Google's subject identifier. The UNIQUE constraint is what
        // the sign-in upsert's ON CONFLICT clause targets.
        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS google_signin.users (
                id UUID PRIMARY KEY,
                google_id VARCHAR(255) NOT NULL,
                name VARCHAR(255),
                email VARCHAR(255) NOT NULL,
                picture TEXT,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                CONSTRAINT users_google_id_key UNIQUE (google_id)
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_table_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_users_email ON google_signin.users(email)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS google_signin.users")
            .await?;

        Ok(())
    }
}
