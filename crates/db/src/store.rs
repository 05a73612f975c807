//! # Document store port
//!
//! Every table in SkillSession is a key-value collection of schema-less
//! documents. Handlers only ever need five operations, captured by
//! [`DocumentStore`]:
//!
//! - `get_item` / `put_item` / `batch_put` by primary key,
//! - `update_item`, which merges attributes into an existing document,
//! - `scan`, a filtered read of one page in key order.
//!
//! Two conditional writes cover state that can race between a read and a
//! write: [`DocumentStore::update_item_if`] and
//! [`DocumentStore::put_item_if_absent`]. Each is atomic per document.
//!
//! ## Scan semantics
//!
//! A scan page is read first and filtered second, so a page may come back
//! empty while `last_evaluated_key` is still set. Callers that need every
//! match must keep scanning until the cursor is `None`; [`scan_all`] does
//! exactly that.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};

/// A single attribute value. Encoded as the matching JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Number(i64),
    StringSet(BTreeSet<String>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            AttributeValue::StringSet(set) => Some(set),
            _ => None,
        }
    }

    fn contains(&self, needle: &str) -> bool {
        match self {
            AttributeValue::String(s) => s.contains(needle),
            AttributeValue::StringSet(set) => set.contains(needle),
            AttributeValue::Number(_) => false,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<BTreeSet<String>> for AttributeValue {
    fn from(value: BTreeSet<String>) -> Self {
        AttributeValue::StringSet(value)
    }
}

/// Field name to value.
pub type Document = BTreeMap<String, AttributeValue>;

/// A document together with its primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedDocument {
    pub key: String,
    pub document: Document,
}

impl KeyedDocument {
    pub fn new(key: impl Into<String>, document: Document) -> Self {
        Self {
            key: key.into(),
            document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals(String, AttributeValue),
    /// Also true when the attribute is absent.
    NotEquals(String, AttributeValue),
    /// Substring match on strings, membership on string sets.
    Contains(String, String),
}

impl Condition {
    fn matches(&self, document: &Document) -> bool {
        match self {
            Condition::Equals(field, value) => document.get(field) == Some(value),
            Condition::NotEquals(field, value) => document.get(field) != Some(value),
            Condition::Contains(field, needle) => document
                .get(field)
                .is_some_and(|v| v.contains(needle)),
        }
    }
}

/// A conjunction of conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    conditions: Vec<Condition>,
}

impl ScanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: impl Into<AttributeValue>) -> Self {
        self.conditions.push(Condition::Equals(field.to_string(), value.into()));
        self
    }

    pub fn not_equals(mut self, field: &str, value: impl Into<AttributeValue>) -> Self {
        self.conditions.push(Condition::NotEquals(field.to_string(), value.into()));
        self
    }

    pub fn contains(mut self, field: &str, needle: &str) -> Self {
        self.conditions.push(Condition::Contains(field.to_string(), needle.to_string()));
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub items: Vec<KeyedDocument>,
    /// Resume point for the next page; `None` once the table is exhausted.
    pub last_evaluated_key: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_item(&self, table: &str, key: &str) -> Result<Option<Document>>;

    /// Inserts or replaces a document.
    async fn put_item(&self, table: &str, item: KeyedDocument) -> Result<()>;

    async fn batch_put(&self, table: &str, items: Vec<KeyedDocument>) -> Result<()>;

    /// Merges `changes` into an existing document.
    ///
    /// Returns `false` when no document exists under `key`; nothing is
    /// created in that case.
    async fn update_item(&self, table: &str, key: &str, changes: Document) -> Result<bool>;

    /// Merges `changes` only if the stored document still matches `expected`.
    ///
    /// Returns `false` when the document is missing or no longer matches.
    async fn update_item_if(
        &self,
        table: &str,
        key: &str,
        expected: &ScanFilter,
        changes: Document,
    ) -> Result<bool>;

    /// Inserts `item` unless a document already exists under its key.
    ///
    /// Returns `false`, leaving the existing document untouched, on a clash.
    async fn put_item_if_absent(&self, table: &str, item: KeyedDocument) -> Result<bool>;

    async fn scan(
        &self,
        table: &str,
        filter: &ScanFilter,
        exclusive_start_key: Option<String>,
    ) -> Result<ScanPage>;
}

/// Scans `table` to the end, following the pagination cursor.
pub async fn scan_all(
    store: &dyn DocumentStore,
    table: &str,
    filter: &ScanFilter,
) -> Result<Vec<KeyedDocument>> {
    let mut items = Vec::new();
    let mut start_key = None;
    let mut pages = 0usize;

    loop {
        let page = store
            .scan(table, filter, start_key.take())
            .await
            .wrap_err_with(|| format!("scan of '{}' failed after {} page(s)", table, pages))?;
        pages += 1;
        items.extend(page.items);

        match page.last_evaluated_key {
            Some(key) => start_key = Some(key),
            None => break,
        }
    }

    tracing::debug!("Scanned {} item(s) from '{}' in {} page(s)", items.len(), table, pages);
    Ok(items)
}

/// Typed accessors for decoding documents into domain models.
pub trait DocumentExt {
    fn string(&self, field: &str) -> Result<&str>;
    fn optional_string(&self, field: &str) -> Option<String>;
    fn optional_number(&self, field: &str) -> Option<i64>;
    fn string_set(&self, field: &str) -> BTreeSet<String>;
}

impl DocumentExt for Document {
    fn string(&self, field: &str) -> Result<&str> {
        self.get(field)
            .and_then(AttributeValue::as_str)
            .ok_or_else(|| eyre!("missing string attribute '{}'", field))
    }

    fn optional_string(&self, field: &str) -> Option<String> {
        self.get(field).and_then(AttributeValue::as_str).map(str::to_string)
    }

    fn optional_number(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(AttributeValue::as_number)
    }

    fn string_set(&self, field: &str) -> BTreeSet<String> {
        self.get(field).and_then(AttributeValue::as_set).cloned().unwrap_or_default()
    }
}
