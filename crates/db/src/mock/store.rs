use async_trait::async_trait;
use mockall::mock;

use crate::store::{Document, KeyedDocument, ScanFilter, ScanPage};

// Mock store for failure-injection tests
mock! {
    pub DocumentStore {}

    #[async_trait]
    impl crate::store::DocumentStore for DocumentStore {
        async fn get_item(&self, table: &str, key: &str) -> eyre::Result<Option<Document>>;

        async fn put_item(&self, table: &str, item: KeyedDocument) -> eyre::Result<()>;

        async fn batch_put(&self, table: &str, items: Vec<KeyedDocument>) -> eyre::Result<()>;

        async fn update_item(
            &self,
            table: &str,
            key: &str,
            changes: Document,
        ) -> eyre::Result<bool>;

        async fn update_item_if(
            &self,
            table: &str,
            key: &str,
            expected: &ScanFilter,
            changes: Document,
        ) -> eyre::Result<bool>;

        async fn put_item_if_absent(&self, table: &str, item: KeyedDocument) -> eyre::Result<bool>;

        async fn scan(
            &self,
            table: &str,
            filter: &ScanFilter,
            exclusive_start_key: Option<String>,
        ) -> eyre::Result<ScanPage>;
    }
}
