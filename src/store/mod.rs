// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Record store adapter.
//!
//! Documents are JSON objects keyed by `_id`. The adapter only knows about
//! collections and filters; record shapes live in [`crate::models`].

use serde_json::{Map, Value};

use crate::error::StoreResult;

pub mod filter;
pub mod memory;

pub use filter::{Condition, Filter};
pub use memory::MemoryStore;

pub type Document = Map<String, Value>;

/// Primary key field of every stored document.
pub const ID_FIELD: &str = "_id";

pub trait RecordStore: Send + Sync {
    /// Documents of `collection` matching `filter`. Proximity clauses order the
    /// result by distance; `sort` then reorders it stably by that field.
    fn find(&self, collection: &str, filter: &Filter, sort: Option<&str>) -> StoreResult<Vec<Document>>;

    fn get(&self, collection: &str, id: &Value) -> StoreResult<Option<Document>> {
        let filter = Filter::new().eq(ID_FIELD, id.clone());
        Ok(self.find(collection, &filter, None)?.into_iter().next())
    }

    /// Insert or overwrite the whole document with the same `_id`.
    fn replace(&self, collection: &str, doc: Document) -> StoreResult<()>;

    /// Insert, or set the given fields on the existing document with the same `_id`.
    fn merge(&self, collection: &str, doc: Document) -> StoreResult<()>;

    /// Set `fields` on every matching document. Returns how many were touched.
    fn update_many(&self, collection: &str, filter: &Filter, fields: &Document) -> StoreResult<usize>;
}
