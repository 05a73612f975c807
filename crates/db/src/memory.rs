//! In-process [`DocumentStore`] used by tests and `STORAGE_BACKEND=memory`.
//!
//! Pagination mirrors the Postgres adapter: each scan reads at most
//! `page_size` documents in key order, then filters them.

use std::{
    collections::{BTreeMap, HashMap, btree_map::Entry},
    ops::Bound,
};

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::RwLock;

use crate::store::{Document, DocumentStore, KeyedDocument, ScanFilter, ScanPage};

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug)]
pub struct MemoryDocumentStore {
    tables: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    page_size: usize,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl MemoryDocumentStore {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Number of documents currently stored in `table`.
    pub async fn count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, BTreeMap::len)
    }

    /// Snapshot of `table` in key order.
    pub async fn documents(&self, table: &str) -> Vec<KeyedDocument> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|rows| {
                rows.iter()
                    .map(|(key, document)| KeyedDocument::new(key.clone(), document.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_item(&self, table: &str, key: &str) -> Result<Option<Document>> {
        Ok(self
            .tables
            .read()
            .await
            .get(table)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    async fn put_item(&self, table: &str, item: KeyedDocument) -> Result<()> {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .insert(item.key, item.document);
        Ok(())
    }

    async fn batch_put(&self, table: &str, items: Vec<KeyedDocument>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        for item in items {
            rows.insert(item.key, item.document);
        }
        Ok(())
    }

    async fn update_item(&self, table: &str, key: &str, changes: Document) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(document) = tables.get_mut(table).and_then(|rows| rows.get_mut(key)) else {
            return Ok(false);
        };
        document.extend(changes);
        Ok(true)
    }

    async fn update_item_if(
        &self,
        table: &str,
        key: &str,
        expected: &ScanFilter,
        changes: Document,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(document) = tables.get_mut(table).and_then(|rows| rows.get_mut(key)) else {
            return Ok(false);
        };
        if !expected.matches(document) {
            return Ok(false);
        }
        document.extend(changes);
        Ok(true)
    }

    async fn put_item_if_absent(&self, table: &str, item: KeyedDocument) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.entry(table.to_string()).or_default().entry(item.key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(item.document);
                Ok(true)
            }
        }
    }

    async fn scan(
        &self,
        table: &str,
        filter: &ScanFilter,
        exclusive_start_key: Option<String>,
    ) -> Result<ScanPage> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(ScanPage::default());
        };

        let lower = match exclusive_start_key {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let page: Vec<_> = rows
            .range((lower, Bound::Unbounded))
            .take(self.page_size)
            .collect();

        let last_evaluated_key = if page.len() == self.page_size {
            page.last().map(|(key, _)| (*key).clone())
        } else {
            None
        };

        let items = page
            .into_iter()
            .filter(|(_, document)| filter.matches(document))
            .map(|(key, document)| KeyedDocument::new(key.clone(), document.clone()))
            .collect();

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }
}
