use async_trait::async_trait;
use eyre::Result;
use sqlx::types::Json;

use crate::{
    DbPool,
    memory::DEFAULT_PAGE_SIZE,
    models::DbDocument,
    store::{Document, DocumentStore, KeyedDocument, ScanFilter, ScanPage},
};

const UPSERT: &str = r#"
    INSERT INTO documents (collection, key, body)
    VALUES ($1, $2, $3)
    ON CONFLICT (collection, key)
    DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
"#;

/// [`DocumentStore`] backed by the `documents` table.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
    page_size: i64,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE as i64,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1) as i64;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_item(&self, table: &str, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query_as::<_, DbDocument>(
            r#"
            SELECT key, body
            FROM documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(table)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.body.0))
    }

    async fn put_item(&self, table: &str, item: KeyedDocument) -> Result<()> {
        sqlx::query(UPSERT)
            .bind(table)
            .bind(&item.key)
            .bind(Json(&item.document))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn batch_put(&self, table: &str, items: Vec<KeyedDocument>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for item in &items {
            sqlx::query(UPSERT)
                .bind(table)
                .bind(&item.key)
                .bind(Json(&item.document))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_item(&self, table: &str, key: &str, changes: Document) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = body || $3, updated_at = NOW()
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(table)
        .bind(key)
        .bind(Json(&changes))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_item_if(
        &self,
        table: &str,
        key: &str,
        expected: &ScanFilter,
        changes: Document,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Row lock holds until commit, so the check and the write see the same body.
        let current = sqlx::query_as::<_, DbDocument>(
            r#"
            SELECT key, body
            FROM documents
            WHERE collection = $1 AND key = $2
            FOR UPDATE
            "#,
        )
        .bind(table)
        .bind(key)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(false);
        };
        if !expected.matches(&current.body.0) {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE documents
            SET body = body || $3, updated_at = NOW()
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(table)
        .bind(key)
        .bind(Json(&changes))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn put_item_if_absent(&self, table: &str, item: KeyedDocument) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, key, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO NOTHING
            "#,
        )
        .bind(table)
        .bind(&item.key)
        .bind(Json(&item.document))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn scan(
        &self,
        table: &str,
        filter: &ScanFilter,
        exclusive_start_key: Option<String>,
    ) -> Result<ScanPage> {
        let rows = sqlx::query_as::<_, DbDocument>(
            r#"
            SELECT key, body
            FROM documents
            WHERE collection = $1 AND ($2::text IS NULL OR key > $2)
            ORDER BY key ASC
            LIMIT $3
            "#,
        )
        .bind(table)
        .bind(exclusive_start_key)
        .bind(self.page_size)
        .fetch_all(&self.pool)
        .await?;

        let last_evaluated_key = if rows.len() as i64 == self.page_size {
            rows.last().map(|r| r.key.clone())
        } else {
            None
        };

        let items = rows
            .into_iter()
            .map(KeyedDocument::from)
            .filter(|item| filter.matches(&item.document))
            .collect();

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }
}
