use mongodb::bson;
use thiserror::Error;

use crate::Collection;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate {fields} in {collection}")]
    Duplicate {
        collection: Collection,
        fields: String,
    },

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Document could not be converted: {0}")]
    InvalidDocument(#[from] bson::ser::Error),

    #[error("Document store failure: {0}")]
    Backend(#[from] mongodb::error::Error),
}

impl StoreError {
    pub fn duplicate(collection: Collection, fields: &[&str]) -> Self {
        StoreError::Duplicate {
            collection,
            fields: fields.join(", "),
        }
    }
}
