use sqlx::{FromRow, types::Json};

use crate::store::{Document, KeyedDocument};

#[derive(Debug, Clone, FromRow)]
pub struct DbDocument {
    pub key: String,
    pub body: Json<Document>,
}

impl From<DbDocument> for KeyedDocument {
    fn from(row: DbDocument) -> Self {
        KeyedDocument::new(row.key, row.body.0)
    }
}
