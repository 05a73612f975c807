pub mod memory;
pub mod models;
pub mod postgres;
pub mod repositories;
pub mod schema;
pub mod store;

pub mod mock;

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use store::{AttributeValue, Document, DocumentStore, KeyedDocument, ScanFilter, ScanPage};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Collection names for each kind of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub availability: String,
    pub slots: String,
    pub bookings: String,
    pub learners: String,
    pub teachers: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            availability: "availability".to_string(),
            slots: "slots".to_string(),
            bookings: "bookings".to_string(),
            learners: "learners".to_string(),
            teachers: "teachers".to_string(),
        }
    }
}
