use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Every collection shares one table; `key` uses byte ordering so scans
    // page in the same order as the in-memory store.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection VARCHAR(255) NOT NULL,
            key TEXT COLLATE "C" NOT NULL,
            body JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (collection, key)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_body ON documents USING GIN (body);")
        .execute(pool)
        .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
